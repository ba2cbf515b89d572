//! FILENAME: parser/src/tests.rs
//! PURPOSE: Consolidated unit tests for the parser crate.

use crate::ast::{AggregatorCall, FieldRef};
use crate::lexer::Lexer;
use crate::parser::{parse_aggregator, parse_dimension, parse_metric};
use crate::token::Token;

// ========================================
// LEXER TESTS
// ========================================

#[test]
fn lexer_tokenizes_aggregator_with_level() {
    let mut lexer = Lexer::new("ci_gauss 0.95");
    assert_eq!(lexer.next_token(), Token::Identifier("ci_gauss".to_string()));
    assert_eq!(lexer.next_token(), Token::Number(0.95));
    assert_eq!(lexer.next_token(), Token::EOF);
}

#[test]
fn lexer_distinguishes_integers_from_decimals() {
    let mut lexer = Lexer::new("3 3.0 .5");
    assert_eq!(lexer.next_token(), Token::Integer(3));
    assert_eq!(lexer.next_token(), Token::Number(3.0));
    assert_eq!(lexer.next_token(), Token::Number(0.5));
}

#[test]
fn lexer_keeps_identifier_case_and_punctuation() {
    let mut lexer = Lexer::new("Unit-Price q1.sales 3rd 1.5x");
    assert_eq!(lexer.next_token(), Token::Identifier("Unit-Price".to_string()));
    assert_eq!(lexer.next_token(), Token::Identifier("q1.sales".to_string()));
    assert_eq!(lexer.next_token(), Token::Identifier("3rd".to_string()));
    assert_eq!(lexer.next_token(), Token::Identifier("1.5x".to_string()));
    assert_eq!(lexer.next_token(), Token::EOF);
}

#[test]
fn lexer_reads_quoted_identifier() {
    let mut lexer = Lexer::new("'unit price', 'owner''s'");
    assert_eq!(lexer.next_token(), Token::QuotedIdentifier("unit price".to_string()));
    assert_eq!(lexer.next_token(), Token::Comma);
    assert_eq!(lexer.next_token(), Token::QuotedIdentifier("owner's".to_string()));
    assert_eq!(lexer.next_token(), Token::EOF);
}

#[test]
fn lexer_flags_unterminated_quote() {
    let mut lexer = Lexer::new("'open");
    assert_eq!(lexer.next_token(), Token::Illegal('\''));
}

#[test]
fn lexer_flags_lone_dot_and_symbols() {
    let mut lexer = Lexer::new(". -");
    assert_eq!(lexer.next_token(), Token::Illegal('.'));
    assert_eq!(lexer.next_token(), Token::Illegal('-'));
}

// ========================================
// AGGREGATOR TESTS
// ========================================

#[test]
fn parses_bare_keyword() {
    let call = parse_aggregator("stdev").unwrap();
    assert_eq!(
        call,
        AggregatorCall {
            keyword: "stdev".to_string(),
            args: vec![]
        }
    );
}

#[test]
fn parses_parameterized_keyword() {
    let call = parse_aggregator("ci_gauss   0.9").unwrap();
    assert_eq!(call.keyword, "ci_gauss");
    assert_eq!(call.args, vec![0.9]);
    assert_eq!(call.to_string(), "ci_gauss 0.9");
}

#[test]
fn rejects_empty_aggregator() {
    let err = parse_aggregator("   ").unwrap_err();
    assert!(err.message.contains("Empty"));
}

#[test]
fn rejects_aggregator_starting_with_number() {
    assert!(parse_aggregator("0.95 ci_gauss").is_err());
}

#[test]
fn rejects_trailing_garbage_in_aggregator() {
    let err = parse_aggregator("ci_gauss 0.95 extra").unwrap_err();
    assert!(err.message.contains("extra"));
}

// ========================================
// METRIC TESTS
// ========================================

#[test]
fn parses_indexed_metric() {
    let metric = parse_metric("3 sum").unwrap();
    assert_eq!(metric.field, FieldRef::Index(3));
    assert_eq!(metric.aggregator.keyword, "sum");
}

#[test]
fn parses_named_metric_with_parameter() {
    let metric = parse_metric("'unit price' ci_gauss 0.99").unwrap();
    assert_eq!(metric.field, FieldRef::Name("unit price".to_string()));
    assert_eq!(metric.aggregator.args, vec![0.99]);
    assert_eq!(metric.to_string(), "unit price ci_gauss 0.99");
}

#[test]
fn rejects_metric_without_aggregator() {
    let err = parse_metric("3").unwrap_err();
    assert!(err.message.contains("Missing aggregator"));
}

#[test]
fn rejects_fractional_field_index() {
    let err = parse_metric("2.5 sum").unwrap_err();
    assert!(err.message.contains("whole number"));
}

// ========================================
// DIMENSION TESTS
// ========================================

#[test]
fn parses_space_separated_dimension() {
    let dim = parse_dimension("1 2").unwrap();
    assert_eq!(dim.fields, vec![FieldRef::Index(1), FieldRef::Index(2)]);
}

#[test]
fn parses_mixed_dimension_with_commas() {
    let dim = parse_dimension("region, 'sales rep' 4").unwrap();
    assert_eq!(
        dim.fields,
        vec![
            FieldRef::Name("region".to_string()),
            FieldRef::Name("sales rep".to_string()),
            FieldRef::Index(4),
        ]
    );
}

#[test]
fn digit_led_caption_stays_one_name() {
    let dim = parse_dimension("2nd, 2019q 3").unwrap();
    assert_eq!(
        dim.fields,
        vec![
            FieldRef::Name("2nd".to_string()),
            FieldRef::Name("2019q".to_string()),
            FieldRef::Index(3),
        ]
    );

    let metric = parse_metric("2019q sum").unwrap();
    assert_eq!(metric.field, FieldRef::Name("2019q".to_string()));
    assert_eq!(metric.aggregator.keyword, "sum");
}

#[test]
fn rejects_empty_dimension() {
    assert!(parse_dimension("").is_err());
}

#[test]
fn rejects_dangling_comma() {
    assert!(parse_dimension("1,").is_err());
}
