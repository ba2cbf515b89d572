//! FILENAME: parser/src/token.rs
//! PURPOSE: Token definitions for the construction-string lexer.
//! CONTEXT: Tokens are the atomic units produced by the lexer and consumed by the parser.

/// Tokens recognized by the construction-string lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    // Literals
    /// Digits only, e.g. a field index.
    Integer(u64),
    /// Digits with a decimal point, e.g. a confidence level.
    Number(f64),
    Identifier(String),
    /// Quoted identifier for column names with spaces: 'unit price'
    QuotedIdentifier(String),

    // Delimiters
    Comma,

    // Special
    EOF,
    Illegal(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{}", n),
            Token::Number(n) => write!(f, "{}", n),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::QuotedIdentifier(s) => write!(f, "'{}'", s),
            Token::Comma => write!(f, ","),
            Token::EOF => write!(f, "end of input"),
            Token::Illegal(c) => write!(f, "ILLEGAL({})", c),
        }
    }
}
