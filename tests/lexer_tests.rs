// tests/lexer_tests.rs

use uql_lang::ast::Token;
use uql_lang::lexer::{LexError, Lexer, Position};

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

// ============================================================================
// Delimiters
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("|", Token::Pipe),
        (",", Token::Comma),
        ("=", Token::Equals),
        ("(", Token::LParen),
        (")", Token::RParen),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_quotes_distinguish_fields_from_strings() {
    assert_eq!(
        tokens(r#""name" 'name'"#),
        vec![Token::Field("name".to_string()), Token::String("name".to_string())]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        tokens(r#"'it\'s' "a\"b" 'tab\there'"#),
        vec![
            Token::String("it's".to_string()),
            Token::Field("a\"b".to_string()),
            Token::String("tab\there".to_string()),
        ]
    );
}

#[test]
fn test_numbers() {
    assert_eq!(
        tokens("10 2.5 -3"),
        vec![Token::Number(10.0), Token::Number(2.5), Token::Number(-3.0)]
    );
}

#[test]
fn test_keywords_literals() {
    assert_eq!(
        tokens("true false null"),
        vec![Token::Boolean(true), Token::Boolean(false), Token::Null]
    );
}

// ============================================================================
// Identifiers, flags and comments
// ============================================================================

#[test]
fn test_identifiers_with_dashes_and_underscores() {
    assert_eq!(
        tokens("project-away trim_start mv-expand"),
        vec![
            Token::Identifier("project-away".to_string()),
            Token::Identifier("trim_start".to_string()),
            Token::Identifier("mv-expand".to_string()),
        ]
    );
}

#[test]
fn test_flag_with_value() {
    assert_eq!(
        tokens("--delimiter=';' --columns"),
        vec![
            Token::Flag("delimiter".to_string()),
            Token::Equals,
            Token::String(";".to_string()),
            Token::Flag("columns".to_string()),
        ]
    );
}

#[test]
fn test_comment_runs_to_end_of_line() {
    assert_eq!(
        tokens("# keep | this\ncount"),
        vec![
            Token::Comment("keep | this".to_string()),
            Token::Identifier("count".to_string()),
        ]
    );
}

#[test]
fn test_full_stage() {
    assert_eq!(
        tokens(r#"summarize "n"=count() by "team""#),
        vec![
            Token::Identifier("summarize".to_string()),
            Token::Field("n".to_string()),
            Token::Equals,
            Token::Identifier("count".to_string()),
            Token::LParen,
            Token::RParen,
            Token::Identifier("by".to_string()),
            Token::Field("team".to_string()),
        ]
    );
}

// ============================================================================
// Errors and positions
// ============================================================================

#[test]
fn test_unterminated_string() {
    let mut lexer = Lexer::new("project 'abc");
    lexer.next_token().unwrap();
    assert_eq!(
        lexer.next_token(),
        Err(LexError::UnterminatedString {
            position: Position { line: 1, column: 9 }
        })
    );
}

#[test]
fn test_unexpected_character_position() {
    let mut lexer = Lexer::new("count\n  ; limit");
    lexer.next_token().unwrap();
    assert_eq!(
        lexer.next_token(),
        Err(LexError::UnexpectedChar {
            ch: ';',
            position: Position { line: 2, column: 3 }
        })
    );
}

#[test]
fn test_invalid_escape() {
    let mut lexer = Lexer::new(r"'\q'");
    assert!(matches!(lexer.next_token(), Err(LexError::InvalidEscape { ch: 'q', .. })));
}

#[test]
fn test_token_start_tracks_lines() {
    let mut lexer = Lexer::new("hello\n| count");
    lexer.next_token().unwrap();
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start(), Position { line: 2, column: 1 });
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start(), Position { line: 2, column: 3 });
}
