//! FILENAME: parser/src/lexer.rs
//! PURPOSE: Scans a raw construction string and produces a stream of Tokens.
//! CONTEXT: This is the first stage of the parsing pipeline. It handles
//! whitespace skipping, number parsing, bare and quoted identifiers.
//!
//! Identifiers are case-sensitive: aggregator keywords must be lowercase and
//! column names are matched exactly against the header row.

use crate::token::Token;
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
        }
    }

    /// Advances the lexer and returns the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.input.next() {
            Some(',') => Token::Comma,

            // Handle single quotes for column names with spaces
            Some('\'') => self.read_quoted_identifier(),

            // Handle Numbers (starts with digit or dot)
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.read_number(ch),

            // Handle Identifiers (starts with letter)
            Some(ch) if is_letter(ch) => self.read_identifier(ch),

            // End of input
            None => Token::EOF,

            // Unknown character
            Some(ch) => Token::Illegal(ch),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.input.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.input.next();
        }
    }

    /// Reads a quoted identifier: 'unit price'. A doubled quote ('') escapes one quote.
    fn read_quoted_identifier(&mut self) -> Token {
        let mut result = String::new();
        while let Some(&ch) = self.input.peek() {
            if ch == '\'' {
                self.input.next();
                if self.input.peek() == Some(&'\'') {
                    result.push('\'');
                    self.input.next();
                } else {
                    return Token::QuotedIdentifier(result);
                }
            } else {
                result.push(ch);
                self.input.next();
            }
        }
        // Unterminated quote
        Token::Illegal('\'')
    }

    fn read_number(&mut self, first_char: char) -> Token {
        let mut number_str = String::from(first_char);
        let mut has_dot = first_char == '.';

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                number_str.push(ch);
                self.input.next();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                number_str.push(ch);
                self.input.next();
            } else {
                break;
            }
        }

        // A caption such as `2nd` or `2019q` starts with digits but is one name.
        if self.input.peek().is_some_and(|&ch| is_identifier_tail(ch)) {
            return self.read_identifier_from(number_str);
        }

        if !has_dot {
            if let Ok(n) = number_str.parse::<u64>() {
                return Token::Integer(n);
            }
        }

        if let Ok(n) = number_str.parse::<f64>() {
            Token::Number(n)
        } else {
            // Fallback if parsing fails (e.g. just ".")
            Token::Illegal(first_char)
        }
    }

    fn read_identifier(&mut self, first_char: char) -> Token {
        self.read_identifier_from(String::from(first_char))
    }

    fn read_identifier_from(&mut self, mut ident: String) -> Token {
        while let Some(&ch) = self.input.peek() {
            if is_identifier_tail(ch) {
                ident.push(ch);
                self.input.next();
            } else {
                break;
            }
        }

        Token::Identifier(ident)
    }
}

/// Returns true if `ch` can start an identifier.
fn is_letter(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

/// Column captions often carry punctuation (`unit-price`, `q1.sales`), so
/// everything up to whitespace, a comma or a quote continues an identifier.
fn is_identifier_tail(ch: char) -> bool {
    !ch.is_whitespace() && ch != ',' && ch != '\''
}
