//! FILENAME: parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into an AST.
//! CONTEXT: This is the second stage of the parsing pipeline. It takes tokens
//! from the Lexer and builds the construction-string nodes the engine consumes.
//!
//! GRAMMAR:
//!   aggregator --> IDENTIFIER number*
//!   metric     --> field aggregator
//!   dimension  --> field ( ","? field )*
//!   field      --> INTEGER | IDENTIFIER | QUOTED_IDENTIFIER
//!   number     --> INTEGER | NUMBER

use crate::ast::{AggregatorCall, DimensionArg, FieldRef, MetricArg};
use crate::lexer::Lexer;
use crate::token::Token;

/// Parser errors with descriptive messages.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// The Parser struct holds the lexer and current token state.
pub struct Parser<'a> {
    input: &'a str,
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from an input string.
    /// Automatically advances to the first token.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            input,
            lexer,
            current_token,
        }
    }

    /// Parses the whole input as an aggregator call.
    pub fn parse_aggregator(&mut self) -> ParseResult<AggregatorCall> {
        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty aggregator definition"));
        }
        let call = self.aggregator_call()?;
        self.expect_end()?;
        Ok(call)
    }

    /// Parses the whole input as a metric argument.
    pub fn parse_metric(&mut self) -> ParseResult<MetricArg> {
        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty metric definition"));
        }
        let field = self.field_ref()?;
        if self.current_token == Token::EOF {
            return Err(ParseError::new(format!(
                "Missing aggregator after field {} in \"{}\"",
                field, self.input
            )));
        }
        let aggregator = self.aggregator_call()?;
        self.expect_end()?;
        Ok(MetricArg { field, aggregator })
    }

    /// Parses the whole input as a dimension argument.
    pub fn parse_dimension(&mut self) -> ParseResult<DimensionArg> {
        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty dimension definition"));
        }

        let mut fields = vec![self.field_ref()?];
        while self.current_token != Token::EOF {
            if self.current_token == Token::Comma {
                self.advance();
            }
            fields.push(self.field_ref()?);
        }

        Ok(DimensionArg { fields })
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// Ensures we consumed all tokens.
    fn expect_end(&self) -> ParseResult<()> {
        if self.current_token == Token::EOF {
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "Unexpected token {} in \"{}\"",
                self.current_token, self.input
            )))
        }
    }

    fn aggregator_call(&mut self) -> ParseResult<AggregatorCall> {
        let keyword = match self.current_token.clone() {
            Token::Identifier(name) => name,
            other => {
                return Err(ParseError::new(format!(
                    "Expected aggregator name, found {} in \"{}\"",
                    other, self.input
                )))
            }
        };
        self.advance();

        let mut args = Vec::new();
        loop {
            match self.current_token {
                Token::Integer(n) => args.push(n as f64),
                Token::Number(n) => args.push(n),
                _ => break,
            }
            self.advance();
        }

        Ok(AggregatorCall { keyword, args })
    }

    fn field_ref(&mut self) -> ParseResult<FieldRef> {
        let field = match self.current_token.clone() {
            Token::Integer(n) => {
                let index = usize::try_from(n).map_err(|_| {
                    ParseError::new(format!("Field index {} is out of range", n))
                })?;
                FieldRef::Index(index)
            }
            Token::Identifier(name) | Token::QuotedIdentifier(name) => FieldRef::Name(name),
            Token::Number(n) => {
                return Err(ParseError::new(format!(
                    "Field index must be a whole number, found {} in \"{}\"",
                    n, self.input
                )))
            }
            other => {
                return Err(ParseError::new(format!(
                    "Expected field index or name, found {} in \"{}\"",
                    other, self.input
                )))
            }
        };
        self.advance();
        Ok(field)
    }
}

/// Convenience function to parse an aggregator construction string.
pub fn parse_aggregator(input: &str) -> ParseResult<AggregatorCall> {
    Parser::new(input).parse_aggregator()
}

/// Convenience function to parse a metric argument (`<field> <aggregator>`).
pub fn parse_metric(input: &str) -> ParseResult<MetricArg> {
    Parser::new(input).parse_metric()
}

/// Convenience function to parse a dimension argument (`<field> [<field>...]`).
pub fn parse_dimension(input: &str) -> ParseResult<DimensionArg> {
    Parser::new(input).parse_dimension()
}
