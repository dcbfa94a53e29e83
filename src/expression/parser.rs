use std::mem;

use regex::{Regex, RegexBuilder};

use super::lexer::{Lexer, Token};
use crate::adapters::AdapterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    In,
    And,
    Or,
}

/// Expression tree.
#[derive(Debug, Clone)]
pub enum Node {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Regex(Regex),
    /// Field lookup, only meaningful as a path step
    Name(String),
    /// `*`
    Wildcard,
    /// `$`
    Context,
    /// `$$`
    Root,
    Path(Vec<Step>),
    Array(Vec<Node>),
    Object(Vec<(Node, Node)>),
    Negate {
        operand: Box<Node>,
        position: usize,
    },
    Binary {
        op: BinOp,
        left: Box<Node>,
        right: Box<Node>,
        position: usize,
    },
    Condition {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
    Call {
        name: String,
        args: Vec<Node>,
        position: usize,
    },
}

/// One step of a path with its predicates.
#[derive(Debug, Clone)]
pub struct Step {
    pub node: Node,
    pub predicates: Vec<Node>,
    /// `[]` was written after the step
    pub keep_array: bool,
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_position: usize,
}

/// Parse an expression.
pub fn parse(text: &str) -> Result<Node, AdapterError> {
    let mut parser = Parser::new(Lexer::new(text))?;
    let node = parser.parse_expression()?;
    parser.expect(Token::Eof, "end of expression")?;
    Ok(node)
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, AdapterError> {
        let current_token = lexer.next_token()?;
        let current_position = lexer.token_start();
        Ok(Parser {
            lexer,
            current_token,
            current_position,
        })
    }

    fn advance(&mut self) -> Result<(), AdapterError> {
        self.current_token = self.lexer.next_token()?;
        self.current_position = self.lexer.token_start();
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn check_name(&self, keyword: &str) -> bool {
        matches!(&self.current_token, Token::Name(name) if name == keyword)
    }

    fn error<T>(&self, message: String) -> Result<T, AdapterError> {
        Err(AdapterError::expression(message, self.current_position))
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), AdapterError> {
        if !self.check(&expected) {
            return self.error(format!("expected {}, found {:?}", what, self.current_token));
        }
        self.advance()
    }

    pub fn parse_expression(&mut self) -> Result<Node, AdapterError> {
        self.parse_condition()
    }

    /// `condition ? then : otherwise`
    fn parse_condition(&mut self) -> Result<Node, AdapterError> {
        let condition = self.parse_or()?;
        if !self.check(&Token::Question) {
            return Ok(condition);
        }
        self.advance()?;
        let then = self.parse_expression()?;
        let otherwise = if self.check(&Token::Colon) {
            self.advance()?;
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Node::Condition {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise,
        })
    }

    fn parse_or(&mut self) -> Result<Node, AdapterError> {
        let mut left = self.parse_and()?;
        while self.check_name("or") {
            let position = self.current_position;
            self.advance()?;
            let right = self.parse_and()?;
            left = binary(BinOp::Or, left, right, position);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Node, AdapterError> {
        let mut left = self.parse_comparison()?;
        while self.check_name("and") {
            let position = self.current_position;
            self.advance()?;
            let right = self.parse_comparison()?;
            left = binary(BinOp::And, left, right, position);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Node, AdapterError> {
        let left = self.parse_additive()?;

        let op = match &self.current_token {
            Token::Eq => BinOp::Equal,
            Token::NotEq => BinOp::NotEqual,
            Token::Lt => BinOp::LessThan,
            Token::LtEq => BinOp::LessEqual,
            Token::Gt => BinOp::GreaterThan,
            Token::GtEq => BinOp::GreaterEqual,
            Token::Name(name) if name == "in" => BinOp::In,
            _ => return Ok(left),
        };
        let position = self.current_position;
        self.advance()?;
        let right = self.parse_additive()?;
        Ok(binary(op, left, right, position))
    }

    fn parse_additive(&mut self) -> Result<Node, AdapterError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.current_token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                Token::Ampersand => BinOp::Concat,
                _ => break,
            };
            let position = self.current_position;
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right, position);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, AdapterError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.current_token {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                Token::Percent => BinOp::Modulo,
                _ => break,
            };
            let position = self.current_position;
            self.advance()?;
            let right = self.parse_unary()?;
            left = binary(op, left, right, position);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, AdapterError> {
        if self.check(&Token::Minus) {
            let position = self.current_position;
            self.advance()?;
            let operand = self.parse_unary()?;
            return Ok(match operand {
                Node::Number(n) => Node::Number(-n),
                other => Node::Negate {
                    operand: Box::new(other),
                    position,
                },
            });
        }
        self.parse_path()
    }

    /// `step ('.' step)*`. A lone step that is not a field lookup is returned
    /// as the plain node.
    fn parse_path(&mut self) -> Result<Node, AdapterError> {
        let mut steps = vec![self.parse_step()?];
        while self.check(&Token::Dot) {
            self.advance()?;
            steps.push(self.parse_step()?);
        }

        let lone = match steps.as_slice() {
            [step] => {
                step.predicates.is_empty()
                    && !step.keep_array
                    && !matches!(step.node, Node::Name(_) | Node::Wildcard)
            }
            _ => false,
        };
        if lone && let Some(step) = steps.pop() {
            return Ok(step.node);
        }
        Ok(Node::Path(steps))
    }

    fn parse_step(&mut self) -> Result<Step, AdapterError> {
        let node = self.parse_primary()?;
        let mut predicates = Vec::new();
        let mut keep_array = false;

        while self.check(&Token::LBracket) {
            self.advance()?;
            if self.check(&Token::RBracket) {
                keep_array = true;
            } else {
                predicates.push(self.parse_expression()?);
            }
            self.expect(Token::RBracket, "']'")?;
        }

        Ok(Step {
            node,
            predicates,
            keep_array,
        })
    }

    fn parse_primary(&mut self) -> Result<Node, AdapterError> {
        let position = self.current_position;
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Number(n) => {
                self.advance()?;
                Ok(Node::Number(n))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Node::String(s))
            }
            Token::Name(name) => {
                self.advance()?;
                Ok(match name.as_str() {
                    "true" => Node::Boolean(true),
                    "false" => Node::Boolean(false),
                    "null" => Node::Null,
                    _ => Node::Name(name),
                })
            }
            Token::Variable(name) => {
                self.advance()?;
                match name.as_str() {
                    "" => Ok(Node::Context),
                    "$" => Ok(Node::Root),
                    _ if self.check(&Token::LParen) => self.parse_call(name, position),
                    // Nothing binds names, so only `$` and `$$` resolve.
                    _ => Err(AdapterError::expression(
                        format!("unbound variable ${}", name),
                        position,
                    )),
                }
            }
            Token::Star => {
                self.advance()?;
                Ok(Node::Wildcard)
            }
            Token::Slash => {
                let (pattern, flags) = self.lexer.read_regex()?;
                self.advance()?;
                compile_regex(&pattern, &flags, position).map(Node::Regex)
            }
            Token::LParen => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::LBracket => {
                self.advance()?;
                let mut items = Vec::new();
                while !self.check(&Token::RBracket) {
                    items.push(self.parse_expression()?);
                    if !self.check(&Token::RBracket) {
                        self.expect(Token::Comma, "',' or ']'")?;
                    }
                }
                self.expect(Token::RBracket, "']'")?;
                Ok(Node::Array(items))
            }
            Token::LBrace => {
                self.advance()?;
                let mut pairs = Vec::new();
                while !self.check(&Token::RBrace) {
                    let key = self.parse_expression()?;
                    self.expect(Token::Colon, "':'")?;
                    let value = self.parse_expression()?;
                    pairs.push((key, value));
                    if !self.check(&Token::RBrace) {
                        self.expect(Token::Comma, "',' or '}'")?;
                    }
                }
                self.expect(Token::RBrace, "'}'")?;
                Ok(Node::Object(pairs))
            }
            token => {
                self.current_token = token;
                self.error(format!("unexpected {:?}", self.current_token))
            }
        }
    }

    fn parse_call(&mut self, name: String, position: usize) -> Result<Node, AdapterError> {
        self.expect(Token::LParen, "'('")?;
        let mut args = Vec::new();
        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);
            if !self.check(&Token::RParen) {
                self.expect(Token::Comma, "',' or ')'")?;
            }
        }
        self.expect(Token::RParen, "')'")?;
        Ok(Node::Call {
            name,
            args,
            position,
        })
    }
}

fn binary(op: BinOp, left: Node, right: Node, position: usize) -> Node {
    Node::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        position,
    }
}

fn compile_regex(pattern: &str, flags: &str, position: usize) -> Result<Regex, AdapterError> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            other => {
                return Err(AdapterError::expression(
                    format!("unknown regex flag '{}'", other),
                    position,
                ));
            }
        };
    }
    builder
        .build()
        .map_err(|e| AdapterError::expression(format!("invalid regex: {}", e), position))
}
