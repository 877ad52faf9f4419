#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use super::*;
use numex_diagnostic::CompileErrorKind;
use pretty_assertions::assert_eq;

/// Render an expression fully parenthesized.
fn show(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Int(n) => n.to_string(),
        ExprKind::Float(f) => format!("{f:?}"),
        ExprKind::Str(s) => format!("{s:?}"),
        ExprKind::Name(n) => n.clone(),
        ExprKind::Unary { op, operand } => format!("({} {})", op.symbol(), show(operand)),
        ExprKind::Binary { op, left, right } => {
            format!("({} {} {})", show(left), op.symbol(), show(right))
        }
        ExprKind::Call { name, args, .. } => {
            let args: Vec<String> = args.iter().map(show).collect();
            format!("{name}({})", args.join(", "))
        }
    }
}

fn parsed(source: &str) -> String {
    show(&parse_expr(source).unwrap())
}

fn error_offset(source: &str) -> usize {
    match parse_expr(source).unwrap_err().kind {
        CompileErrorKind::Parse { offset } => offset,
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(parsed("a + b * c"), "(a + (b * c))");
    assert_eq!(parsed("a - b - c"), "((a - b) - c)");
    assert_eq!(parsed("(a + b) * c"), "((a + b) * c)");
}

#[test]
fn power_is_left_associative_and_below_unary() {
    assert_eq!(parsed("2 ** 3 ** 2"), "((2 ** 3) ** 2)");
    assert_eq!(parsed("-a ** 2"), "((- a) ** 2)");
}

#[test]
fn logical_and_bitwise_levels() {
    assert_eq!(parsed("a < b and c | d"), "((a < b) and (c | d))");
    assert_eq!(parsed("not a == b"), "(not (a == b))");
    assert_eq!(parsed("a | b ^ c & d"), "(a | (b ^ (c & d)))");
    assert_eq!(parsed("a << 1 + 2"), "(a << (1 + 2))");
    assert_eq!(parsed("a || b && !c"), "(a or (b and (not c)))");
}

#[test]
fn unary_plus_is_dropped() {
    assert_eq!(parsed("+a"), "a");
    assert_eq!(parsed("~-a"), "(~ (- a))");
}

#[test]
fn calls_and_literals() {
    assert_eq!(parsed("where(x > 0, x, 0.5)"), "where((x > 0), x, 0.5)");
    assert_eq!(parsed("pi()"), "pi()");
    assert_eq!(parsed("contains(s, 'ab')"), "contains(s, \"ab\")");
}

#[test]
fn name_spans_point_at_the_identifier() {
    let expr = parse_expr("1 + foo(x)").unwrap();
    let ExprKind::Binary { right, .. } = expr.kind else {
        panic!("expected a binary expression");
    };
    let ExprKind::Call { name_span, .. } = right.kind else {
        panic!("expected a call");
    };
    assert_eq!(name_span, Span::new(4, 7));
}

#[test]
fn errors_are_one_based() {
    assert_eq!(error_offset("a +"), 4);
    assert_eq!(error_offset("a b"), 3);
    assert_eq!(error_offset("(a"), 3);
    assert_eq!(error_offset(")"), 1);
    assert_eq!(error_offset("a $"), 3);
}

#[test]
fn deep_nesting_does_not_overflow() {
    let depth = 5_000;
    let source = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(parsed(&source), "x");
}
