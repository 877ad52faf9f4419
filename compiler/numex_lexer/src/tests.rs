#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use super::*;
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).unwrap().into_iter().map(|t| t.kind).collect()
}

#[test]
fn numbers() {
    assert_eq!(
        kinds("1 2.5 .5 3e2 4."),
        vec![
            TokenKind::Int(1),
            TokenKind::Float(2.5),
            TokenKind::Float(0.5),
            TokenKind::Float(300.0),
            TokenKind::Float(4.0),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn operators_prefer_the_longest_match() {
    assert_eq!(
        kinds("a**b<=c<<d"),
        vec![
            TokenKind::Ident,
            TokenKind::StarStar,
            TokenKind::Ident,
            TokenKind::LtEq,
            TokenKind::Ident,
            TokenKind::Shl,
            TokenKind::Ident,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn word_and_symbol_logical_operators_agree() {
    assert_eq!(kinds("a and b"), kinds("a && b"));
    assert_eq!(kinds("a or b"), kinds("a || b"));
    assert_eq!(kinds("not a"), kinds("!a"));
}

#[test]
fn keywords_do_not_swallow_identifiers() {
    let tokens = lex("android").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Ident);
    assert_eq!(tokens[0].span, Span::new(0, 7));
}

#[test]
fn strings_are_cooked() {
    assert_eq!(
        kinds(r#"'it\'s' "a\tb""#),
        vec![
            TokenKind::Str("it's".to_string()),
            TokenKind::Str("a\tb".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn eof_sits_at_the_end() {
    let tokens = lex("x + 1").unwrap();
    assert_eq!(tokens.last().unwrap().span, Span::new(5, 5));
}

#[test]
fn errors_report_offsets() {
    let err = lex("a + \"open").unwrap_err();
    assert_eq!(err.offset, 4);
    assert_eq!(err.message, "unterminated string literal");

    let err = lex("a $ b").unwrap_err();
    assert_eq!(err.offset, 2);

    let err = lex(r"'\q'").unwrap_err();
    assert_eq!(err.offset, 1);
    assert_eq!(err.message, "invalid escape sequence");
}
