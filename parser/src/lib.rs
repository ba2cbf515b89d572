//! FILENAME: parser/src/lib.rs
//! PURPOSE: Library root for the construction-string parser.
//! CONTEXT: The command-line tools describe their aggregation work with short
//! strings. This crate turns those strings into a small AST that the engine
//! validates and builds aggregators from.
//!
//! PIPELINE: Construction String --> Lexer --> Tokens --> Parser --> AST --> Engine
//!
//! SUPPORTED FORMS:
//! - Aggregators: `count`, `sum`, `mean`, `min`, `max`, `stdev`, `ci_gauss 0.95`
//! - Metrics: `3 sum`, `price mean`, `'unit price' ci_gauss 0.9`
//! - Dimensions: `1 2`, `region, product`, `'sales region' 4`

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

// Register the separate tests module
#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use ast::{AggregatorCall, DimensionArg, FieldRef, MetricArg};
pub use lexer::Lexer;
pub use parser::{
    parse_aggregator, parse_dimension, parse_metric, ParseError, ParseResult, Parser,
};
pub use token::Token;
