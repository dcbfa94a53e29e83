#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Number literal
    ///
    /// # Examples
    /// ```text
    /// 10
    /// 2.5
    /// -3
    /// ```
    Number(f64),

    /// Field reference enclosed in double quotes
    ///
    /// # Examples
    /// ```text
    /// "name"
    /// "user.address.city"
    /// "items[0]"
    /// ```
    Field(String),

    /// String literal enclosed in single quotes
    ///
    /// # Examples
    /// ```text
    /// ' '
    /// 'n/a'
    /// ```
    String(String),

    /// Boolean values
    Boolean(bool),

    /// Null value
    Null,

    // Identifiers
    /// Command, keyword or operator name
    ///
    /// May contain dashes after the first character.
    ///
    /// # Examples
    /// ```text
    /// project
    /// parse-json
    /// trim_start
    /// ```
    Identifier(String),

    /// Stage option
    ///
    /// # Examples
    /// ```text
    /// --delimiter=';'
    /// --columns
    /// ```
    Flag(String),

    /// Comment running to the end of the line
    ///
    /// # Examples
    /// ```text
    /// # keep only the latest rows
    /// ```
    Comment(String),

    // Delimiters
    /// Pipeline operator
    Pipe,

    /// Separates items, metrics and arguments
    Comma,

    /// Binds an alias or an option value
    Equals,

    /// Left parenthesis for function calls
    LParen,

    /// Right parenthesis
    RParen,

    /// End of input
    Eof,
}
