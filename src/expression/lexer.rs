use crate::adapters::AdapterError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    String(String),
    /// Field name, plain or in backticks
    Name(String),
    /// `$name`; `$` alone is an empty name and `$$` is `"$"`
    Variable(String),
    Dot,
    Comma,
    Colon,
    Question,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Ampersand,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eof,
}

/// Tokenizer for expressions.
///
/// Tokens are produced on demand so that the parser can ask for a regex
/// literal when `/` shows up where an operand is expected.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    /// Character offset where the last token started.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => self.position += 1,
                Some('/') if self.peek_char() == Some('*') => {
                    self.position += 2;
                    while self.position < self.input.len()
                        && !(self.current_char() == Some('*') && self.peek_char() == Some('/'))
                    {
                        self.position += 1;
                    }
                    self.position = (self.position + 2).min(self.input.len());
                }
                _ => break,
            }
        }
    }

    fn read_name(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.position += 1;
            } else {
                break;
            }
        }
        result
    }

    fn read_quoted(&mut self, quote: char) -> Result<String, AdapterError> {
        let start = self.position;
        let mut result = String::new();
        self.position += 1;

        while let Some(ch) = self.current_char() {
            self.position += 1;
            match ch {
                c if c == quote => return Ok(result),
                '\\' if quote != '`' => {
                    let escaped = self
                        .current_char()
                        .ok_or_else(|| AdapterError::expression("unterminated string", start))?;
                    self.position += 1;
                    match escaped {
                        'n' => result.push('\n'),
                        't' => result.push('\t'),
                        'r' => result.push('\r'),
                        '\\' | '"' | '\'' | '/' => result.push(escaped),
                        other => {
                            return Err(AdapterError::expression(
                                format!("unsupported escape sequence '\\{}'", other),
                                self.position - 2,
                            ));
                        }
                    }
                }
                c => result.push(c),
            }
        }
        Err(AdapterError::expression("unterminated string", start))
    }

    fn read_number(&mut self) -> Result<Token, AdapterError> {
        let start = self.position;
        let mut number = String::new();
        while let Some(ch) = self.current_char() {
            let exponent_sign = matches!(ch, '-' | '+') && number.ends_with(['e', 'E']);
            if ch.is_ascii_digit() || exponent_sign || matches!(ch, 'e' | 'E') {
                number.push(ch);
                self.position += 1;
            } else if ch == '.' && !number.contains('.') && self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                number.push(ch);
                self.position += 1;
            } else {
                break;
            }
        }
        number
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| AdapterError::expression(format!("invalid number '{}'", number), start))
    }

    /// Read the body and flags of a regex literal. The opening `/` has already
    /// been returned as [`Token::Slash`].
    pub fn read_regex(&mut self) -> Result<(String, String), AdapterError> {
        let start = self.token_start;
        let mut pattern = String::new();

        loop {
            match self.current_char() {
                None => return Err(AdapterError::expression("unterminated regex", start)),
                Some('/') => {
                    self.position += 1;
                    break;
                }
                Some('\\') if self.peek_char() == Some('/') => {
                    pattern.push('/');
                    self.position += 2;
                }
                Some('\\') => {
                    pattern.push('\\');
                    self.position += 1;
                    if let Some(next) = self.current_char() {
                        pattern.push(next);
                        self.position += 1;
                    }
                }
                Some(ch) => {
                    pattern.push(ch);
                    self.position += 1;
                }
            }
        }

        if pattern.is_empty() {
            return Err(AdapterError::expression("empty regex", start));
        }
        let flags = self.read_name();
        Ok((pattern, flags))
    }

    pub fn next_token(&mut self) -> Result<Token, AdapterError> {
        self.skip_whitespace_and_comments();
        self.token_start = self.position;

        let Some(ch) = self.current_char() else {
            return Ok(Token::Eof);
        };

        let two_char = match (ch, self.peek_char()) {
            ('!', Some('=')) => Some(Token::NotEq),
            ('<', Some('=')) => Some(Token::LtEq),
            ('>', Some('=')) => Some(Token::GtEq),
            ('$', Some('$')) => Some(Token::Variable("$".to_string())),
            _ => None,
        };
        if let Some(token) = two_char {
            self.position += 2;
            return Ok(token);
        }

        let single = match ch {
            '.' => Some(Token::Dot),
            ',' => Some(Token::Comma),
            ':' => Some(Token::Colon),
            '?' => Some(Token::Question),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            '=' => Some(Token::Eq),
            '<' => Some(Token::Lt),
            '>' => Some(Token::Gt),
            _ => None,
        };
        if let Some(token) = single {
            self.position += 1;
            return Ok(token);
        }

        match ch {
            '"' | '\'' => Ok(Token::String(self.read_quoted(ch)?)),
            '`' => Ok(Token::Name(self.read_quoted('`')?)),
            '$' => {
                self.position += 1;
                Ok(Token::Variable(self.read_name()))
            }
            c if c.is_ascii_digit() => self.read_number(),
            c if c.is_alphabetic() || c == '_' => Ok(Token::Name(self.read_name())),
            other => Err(AdapterError::expression(
                format!("unexpected character '{}'", other),
                self.position,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            tokens("$ $$ $sum"),
            vec![
                Token::Variable(String::new()),
                Token::Variable("$".to_string()),
                Token::Variable("sum".to_string()),
            ]
        );
    }

    #[test]
    fn test_backtick_names() {
        assert_eq!(
            tokens("`first name`.x"),
            vec![Token::Name("first name".to_string()), Token::Dot, Token::Name("x".to_string())]
        );
    }

    #[test]
    fn test_regex_after_slash() {
        let mut lexer = Lexer::new("/ab\\/c/i)");
        assert_eq!(lexer.next_token(), Ok(Token::Slash));
        assert_eq!(lexer.read_regex(), Ok(("ab/c".to_string(), "i".to_string())));
        assert_eq!(lexer.next_token(), Ok(Token::RParen));
    }
}
