use super::*;
use crate::test_support::{auto, lowered};
use numex_diagnostic::CompileErrorKind;

fn check(text: &str, vars: &[(&str, Dtype)], requested: Dtype) -> Result<(), CompileError> {
    let tree = lowered(text, vars, auto(vars.first().map(|v| v.1)))?;
    validate(&tree, requested)
}

fn kind(result: Result<(), CompileError>) -> CompileErrorKind {
    result.unwrap_err().kind
}

#[test]
fn plain_arithmetic_passes() {
    let vars = [("a", Dtype::Float64), ("b", Dtype::Int32)];
    assert!(check("a * b + sqrt(a)", &vars, Dtype::Auto).is_ok());
    assert!(check("sum(a * b) + 1", &vars, Dtype::Auto).is_ok());
}

#[test]
fn nested_reductions_are_rejected() {
    let vars = [("a", Dtype::Float64)];
    assert_eq!(
        kind(check("sum(a + max(a))", &vars, Dtype::Auto)),
        CompileErrorKind::ReductionInvalid
    );
    // Sibling reductions are fine.
    assert!(check("sum(a) + max(a)", &vars, Dtype::Auto).is_ok());
}

#[cfg(not(windows))]
#[test]
fn complex_operands_need_complex_support() {
    let vars = [("z", Dtype::Complex128)];
    assert!(check("z * z + conj(z)", &vars, Dtype::Auto).is_ok());
    assert_eq!(
        kind(check("min(z)", &vars, Dtype::Auto)),
        CompileErrorKind::ReductionInvalid
    );
    let err = check("sin(z)", &vars, Dtype::Auto).unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::InvalidArgType);
    assert!(err.message.contains("`sin`"), "{}", err.message);
    assert_eq!(
        kind(check("z < z", &vars, Dtype::Auto)),
        CompileErrorKind::InvalidArgType
    );
}

#[cfg(windows)]
#[test]
fn complex_is_unsupported_on_windows() {
    assert_eq!(
        kind(check("z + 1", &[("z", Dtype::Complex64)], Dtype::Auto)),
        CompileErrorKind::ComplexUnsupported
    );
    assert_eq!(
        kind(check("x", &[("x", Dtype::Float64)], Dtype::Complex128)),
        CompileErrorKind::ComplexUnsupported
    );
}

#[test]
fn string_comparisons_and_predicates() {
    let vars = [("s", Dtype::String), ("t", Dtype::String)];
    assert!(check("s == t", &vars, Dtype::Auto).is_ok());
    assert!(check("startswith(s, \"ab\") & (s != \"x\")", &vars, Dtype::Auto).is_ok());
}

#[test]
fn strings_outside_comparisons_are_rejected() {
    let vars = [("s", Dtype::String), ("x", Dtype::Int32)];
    let err = check("s + s", &vars, Dtype::Auto).unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::InvalidArgType);
    assert!(err.message.contains("does not accept string operands"));

    let err = check("contains(x, x)", &vars, Dtype::Auto).unwrap_err();
    assert!(err.message.contains("needs string operands"));

    assert_eq!(
        kind(check("s < \"b\"", &vars, Dtype::Auto)),
        CompileErrorKind::InvalidArgType
    );
}

#[test]
fn string_output_is_rejected() {
    let vars = [("s", Dtype::String)];
    assert_eq!(
        kind(check("s", &vars, Dtype::Auto)),
        CompileErrorKind::InvalidArgType
    );
    assert_eq!(
        kind(check("s == s", &vars, Dtype::String)),
        CompileErrorKind::InvalidArgType
    );
}
