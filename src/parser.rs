use std::mem;
use std::str::FromStr;

use thiserror::Error;

use crate::{
    ast::{
        CsvOptions, Direction, FunctionArg, Metric, OrderField, ProjectItem, Stage, Token,
        XmlOptions,
    },
    functions::{Arity, Operator, UnknownOperator},
    lexer::{LexError, Lexer, Position},
    value::Value,
};

/// Errors raised while turning query text into stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, found {found} at {position}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: Position,
    },

    #[error("unknown command '{name}' at {position}")]
    UnknownCommand { name: String, position: Position },

    #[error("{source} at {position}")]
    UnknownFunction {
        source: UnknownOperator,
        position: Position,
    },

    #[error("{operator}() takes {expected} argument(s), found {found} at {position}")]
    Arity {
        operator: Operator,
        expected: &'static str,
        found: usize,
        position: Position,
    },

    #[error("unknown option '--{name}' for {stage} at {position}")]
    UnknownOption {
        stage: &'static str,
        name: String,
        position: Position,
    },

    #[error("invalid value for option '--{name}' at {position}: {reason}")]
    InvalidOption {
        name: String,
        reason: String,
        position: Position,
    },

    #[error("failed to parse query: no stages found")]
    Empty,
}

/// Parse query text into its pipeline stages.
///
/// ```
/// use uql_lang::ast::Stage;
/// use uql_lang::parser::parse_query;
///
/// let stages = parse_query("parse-json | count").unwrap();
/// assert_eq!(stages, vec![Stage::ParseJson, Stage::Count]);
/// ```
pub fn parse_query(text: &str) -> Result<Vec<Stage>, ParseError> {
    Parser::new(Lexer::new(text))?.parse_query()
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_position: Position,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        let current_position = lexer.token_start();
        Ok(Parser {
            lexer,
            current_token,
            current_position,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.current_position = self.lexer.token_start();
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(&self.current_token, Token::Identifier(name) if name == keyword)
    }

    fn unexpected<T>(&self, expected: &str) -> Result<T, ParseError> {
        Err(ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: describe(&self.current_token),
            position: self.current_position,
        })
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return self.unexpected(what);
        }
        self.advance()
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if !self.check_keyword(keyword) {
            return self.unexpected(&format!("'{}'", keyword));
        }
        self.advance()
    }

    /// A quoted name: `"field"` or `'field'`.
    fn expect_text(&mut self, what: &str) -> Result<String, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Field(s) | Token::String(s) => {
                self.advance()?;
                Ok(s)
            }
            token => {
                self.current_token = token;
                self.unexpected(what)
            }
        }
    }

    fn parse_literal(&mut self) -> Result<Value, ParseError> {
        let value = match &self.current_token {
            Token::Field(s) | Token::String(s) => Value::String(s.clone()),
            Token::Number(n) => Value::Number(*n),
            Token::Boolean(b) => Value::Boolean(*b),
            Token::Null => Value::Null,
            _ => return self.unexpected("a literal"),
        };
        self.advance()?;
        Ok(value)
    }

    fn at_literal(&self) -> bool {
        matches!(
            self.current_token,
            Token::Field(_) | Token::String(_) | Token::Number(_) | Token::Boolean(_) | Token::Null
        )
    }

    /// Parse a complete pipeline: `stage ( '|' stage )*`.
    ///
    /// A comment ends at the end of its line, so the stage after it does not
    /// need a leading pipe.
    pub fn parse_query(&mut self) -> Result<Vec<Stage>, ParseError> {
        let mut stages = Vec::new();

        while !self.check(&Token::Eof) {
            let stage = self.parse_stage()?;
            let is_comment = matches!(stage, Stage::Comment(_));
            stages.push(stage);

            match self.current_token {
                Token::Pipe => {
                    self.advance()?;
                    if self.check(&Token::Eof) {
                        return self.unexpected("a command after '|'");
                    }
                }
                Token::Eof => break,
                _ if is_comment => {}
                _ => return self.unexpected("'|' or end of query"),
            }
        }

        if stages.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(stages)
    }

    fn parse_stage(&mut self) -> Result<Stage, ParseError> {
        let position = self.current_position;
        let name = match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Comment(text) => {
                self.advance()?;
                return Ok(Stage::Comment(text));
            }
            Token::Identifier(name) => name,
            token => {
                self.current_token = token;
                return self.unexpected("a command");
            }
        };
        self.advance()?;

        let stage = match name.as_str() {
            "hello" => Stage::Hello,
            "ping" => {
                if self.at_literal() {
                    Stage::Ping(self.parse_literal()?)
                } else {
                    Stage::Ping(Value::from("pong"))
                }
            }
            "echo" => Stage::Echo(self.parse_literal()?),
            "scope" => Stage::Scope(self.expect_text("a field path")?),
            "jsonata" => Stage::Expression(self.expect_text("an expression")?),
            "distinct" => {
                if matches!(self.current_token, Token::Field(_) | Token::String(_)) {
                    Stage::Distinct(Some(self.expect_text("a field")?))
                } else {
                    Stage::Distinct(None)
                }
            }
            "count" => Stage::Count,
            "limit" => Stage::Limit(self.parse_limit()?),
            "mv-expand" => self.parse_mv_expand()?,
            "order" => {
                self.expect_keyword("by")?;
                Stage::OrderBy(self.parse_order_fields()?)
            }
            "extend" => Stage::Extend(self.parse_items()?),
            "project" => Stage::Project(self.parse_items()?),
            "project-away" => Stage::ProjectAway(self.parse_text_list("a field")?),
            "summarize" => self.parse_summarize()?,
            "parse-json" => Stage::ParseJson,
            "parse-yaml" => Stage::ParseYaml,
            "parse-csv" => Stage::ParseCsv(self.parse_csv_options()?),
            "parse-xml" => Stage::ParseXml(self.parse_xml_options()?),
            other => match Operator::from_str(other) {
                Ok(op) => Stage::Command(op),
                Err(_) => {
                    return Err(ParseError::UnknownCommand {
                        name: other.to_string(),
                        position,
                    });
                }
            },
        };
        Ok(stage)
    }

    fn parse_limit(&mut self) -> Result<usize, ParseError> {
        match self.current_token {
            Token::Number(n) if n >= 0.0 && n.fract() == 0.0 => {
                self.advance()?;
                Ok(n as usize)
            }
            _ => self.unexpected("a non-negative integer"),
        }
    }

    /// `mv-expand "field"` or `mv-expand "alias"="field"`
    fn parse_mv_expand(&mut self) -> Result<Stage, ParseError> {
        let first = self.expect_text("a field")?;
        if self.check(&Token::Equals) {
            self.advance()?;
            let field = self.expect_text("a field")?;
            return Ok(Stage::MvExpand {
                field,
                alias: Some(first),
            });
        }
        Ok(Stage::MvExpand {
            field: first,
            alias: None,
        })
    }

    fn parse_order_fields(&mut self) -> Result<Vec<OrderField>, ParseError> {
        let mut fields = Vec::new();
        loop {
            let field = self.expect_text("a field")?;
            let direction = if self.check_keyword("asc") {
                self.advance()?;
                Direction::Asc
            } else if self.check_keyword("desc") {
                self.advance()?;
                Direction::Desc
            } else {
                Direction::default()
            };
            fields.push(OrderField { field, direction });

            if !self.check(&Token::Comma) {
                return Ok(fields);
            }
            self.advance()?;
        }
    }

    fn parse_text_list(&mut self, what: &str) -> Result<Vec<String>, ParseError> {
        let mut items = vec![self.expect_text(what)?];
        while self.check(&Token::Comma) {
            self.advance()?;
            items.push(self.expect_text(what)?);
        }
        Ok(items)
    }

    fn parse_items(&mut self) -> Result<Vec<ProjectItem>, ParseError> {
        let mut items = vec![self.parse_item()?];
        while self.check(&Token::Comma) {
            self.advance()?;
            items.push(self.parse_item()?);
        }
        Ok(items)
    }

    /// One `project`/`extend` item:
    ///
    /// ```text
    /// "field"
    /// "alias"="field"
    /// "alias"=operator(args)
    /// operator(args)
    /// ... as "alias"
    /// ```
    fn parse_item(&mut self) -> Result<ProjectItem, ParseError> {
        let mut item = match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Field(first) => {
                self.advance()?;
                if self.check(&Token::Equals) {
                    self.advance()?;
                    if matches!(self.current_token, Token::Identifier(_)) {
                        let (operator, args) = self.parse_call()?;
                        ProjectItem::Function {
                            operator,
                            args,
                            alias: Some(first),
                        }
                    } else {
                        ProjectItem::Ref {
                            field: self.expect_text("a field or function call")?,
                            alias: Some(first),
                        }
                    }
                } else {
                    ProjectItem::Ref {
                        field: first,
                        alias: None,
                    }
                }
            }
            token @ Token::Identifier(_) => {
                self.current_token = token;
                let (operator, args) = self.parse_call()?;
                ProjectItem::Function {
                    operator,
                    args,
                    alias: None,
                }
            }
            token => {
                self.current_token = token;
                return self.unexpected("a field or function call");
            }
        };

        if self.check_keyword("as") {
            self.advance()?;
            let name = self.expect_text("an alias")?;
            match &mut item {
                ProjectItem::Ref { alias, .. } | ProjectItem::Function { alias, .. } => {
                    *alias = Some(name)
                }
            }
        }
        Ok(item)
    }

    /// `operator(arg, ...)` where `"x"` reads a field, `'x'` is a string and
    /// numbers are numbers.
    fn parse_call(&mut self) -> Result<(Operator, Vec<FunctionArg>), ParseError> {
        let position = self.current_position;
        let name = match &self.current_token {
            Token::Identifier(name) => name.clone(),
            _ => return self.unexpected("a function name"),
        };
        let operator = Operator::from_str(&name)
            .map_err(|source| ParseError::UnknownFunction { source, position })?;
        self.advance()?;
        self.expect(Token::LParen, "'('")?;

        let mut args = Vec::new();
        while !self.check(&Token::RParen) {
            let arg = match &self.current_token {
                Token::Field(s) => FunctionArg::Ref(s.clone()),
                Token::String(s) => FunctionArg::String(s.clone()),
                Token::Number(n) => FunctionArg::Number(*n),
                _ => return self.unexpected("a function argument"),
            };
            self.advance()?;
            args.push(arg);

            if !self.check(&Token::RParen) {
                self.expect(Token::Comma, "',' or ')'")?;
            }
        }
        self.expect(Token::RParen, "')'")?;

        let (ok, expected) = match operator.arity() {
            Arity::Zero => (args.is_empty(), "no"),
            Arity::Unary => (args.len() == 1, "exactly one"),
            Arity::Binary => (matches!(args.len(), 1 | 2), "one or two"),
            Arity::Variadic => (true, "any number of"),
        };
        if !ok {
            return Err(ParseError::Arity {
                operator,
                expected,
                found: args.len(),
                position,
            });
        }
        Ok((operator, args))
    }

    /// `summarize metric, ... [by "field", ...]`
    fn parse_summarize(&mut self) -> Result<Stage, ParseError> {
        let mut metrics = vec![self.parse_metric()?];
        while self.check(&Token::Comma) {
            self.advance()?;
            metrics.push(self.parse_metric()?);
        }

        let by = if self.check_keyword("by") {
            self.advance()?;
            self.parse_text_list("a group-by field")?
        } else {
            Vec::new()
        };
        Ok(Stage::Summarize { by, metrics })
    }

    fn parse_metric(&mut self) -> Result<Metric, ParseError> {
        let alias = match &self.current_token {
            Token::Field(alias) => {
                let alias = alias.clone();
                self.advance()?;
                self.expect(Token::Equals, "'='")?;
                Some(alias)
            }
            _ => None,
        };
        let (operator, args) = self.parse_call()?;
        Ok(Metric {
            operator,
            args,
            alias,
        })
    }

    fn parse_options(&mut self) -> Result<Vec<(String, Value, Position)>, ParseError> {
        let mut options = Vec::new();
        while let Token::Flag(name) = &self.current_token {
            let name = name.clone();
            let position = self.current_position;
            self.advance()?;
            let value = if self.check(&Token::Equals) {
                self.advance()?;
                self.parse_literal()?
            } else {
                Value::Boolean(true)
            };
            options.push((name, value, position));
        }
        Ok(options)
    }

    fn parse_csv_options(&mut self) -> Result<CsvOptions, ParseError> {
        let mut options = CsvOptions::default();
        for (name, value, position) in self.parse_options()? {
            match name.as_str() {
                "delimiter" => options.delimiter = single_byte(&name, &value, position)?,
                "comment" => options.comment = Some(single_byte(&name, &value, position)?),
                "columns" => options.columns = flag(&name, &value, position)?,
                "skip_empty_lines" => options.skip_empty_lines = flag(&name, &value, position)?,
                "relax_column_count" => options.relax_column_count = flag(&name, &value, position)?,
                _ => {
                    return Err(ParseError::UnknownOption {
                        stage: "parse-csv",
                        name,
                        position,
                    });
                }
            }
        }
        Ok(options)
    }

    fn parse_xml_options(&mut self) -> Result<XmlOptions, ParseError> {
        let mut options = XmlOptions::default();
        for (name, value, position) in self.parse_options()? {
            match name.as_str() {
                "attributes" => options.attributes = flag(&name, &value, position)?,
                "parse_values" => options.parse_values = flag(&name, &value, position)?,
                "attribute_prefix" => options.attribute_prefix = text(&name, value, position)?,
                "text_node_name" => options.text_node_name = text(&name, value, position)?,
                _ => {
                    return Err(ParseError::UnknownOption {
                        stage: "parse-xml",
                        name,
                        position,
                    });
                }
            }
        }
        Ok(options)
    }
}

fn invalid_option(name: &str, reason: &str, position: Position) -> ParseError {
    ParseError::InvalidOption {
        name: name.to_string(),
        reason: reason.to_string(),
        position,
    }
}

fn flag(name: &str, value: &Value, position: Position) -> Result<bool, ParseError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        _ => Err(invalid_option(name, "expected true or false", position)),
    }
}

fn text(name: &str, value: Value, position: Position) -> Result<String, ParseError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(invalid_option(name, "expected a string", position)),
    }
}

fn single_byte(name: &str, value: &Value, position: Position) -> Result<u8, ParseError> {
    match value.as_str().map(str::as_bytes) {
        Some([byte]) => Ok(*byte),
        _ => Err(invalid_option(name, "expected a single ASCII character", position)),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {}", n),
        Token::Field(s) => format!("field \"{}\"", s),
        Token::String(s) => format!("string '{}'", s),
        Token::Boolean(b) => format!("'{}'", b),
        Token::Null => "'null'".to_string(),
        Token::Identifier(name) => format!("'{}'", name),
        Token::Flag(name) => format!("option '--{}'", name),
        Token::Comment(_) => "a comment".to_string(),
        Token::Pipe => "'|'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Equals => "'='".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::Eof => "end of query".to_string(),
    }
}
