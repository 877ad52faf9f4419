//! Dtype resolution and compile-time failures.

use numexc::{compile, CompileErrorKind, Dtype, VarDesc};

#[test]
fn auto_with_an_auto_variable_is_unspecified() {
    let err = compile("x + 1", &[VarDesc::new("x", Dtype::Auto)], Dtype::Auto).unwrap_err();
    assert!(matches!(err.kind, CompileErrorKind::VarUnspecified));
}

#[test]
fn mixing_auto_and_explicit_variables_fails() {
    let vars = [
        VarDesc::new("a", Dtype::Auto),
        VarDesc::new("b", Dtype::Float64),
    ];
    let err = compile("a + b", &vars, Dtype::Float64).unwrap_err();
    assert!(matches!(err.kind, CompileErrorKind::VarMixed));
}

#[test]
fn parse_errors_carry_a_one_based_offset() {
    let vars = [VarDesc::new("a", Dtype::Float64)];
    let err = compile("a + nope", &vars, Dtype::Auto).unwrap_err();
    assert_eq!(err.offset(), Some(5));
    assert!(err.code().is_syntax_error());
}

#[test]
fn nested_reductions_are_rejected() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let err = compile("sum(x - sum(x))", &vars, Dtype::Auto).unwrap_err();
    assert!(matches!(err.kind, CompileErrorKind::ReductionInvalid));
}

#[test]
fn dsl_errors_carry_line_and_column() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let err = compile("def k(x):\n    if x > 1\n        y = 1\n", &vars, Dtype::Auto).unwrap_err();
    match err.kind {
        CompileErrorKind::Dsl { line, .. } => assert_eq!(line, 2),
        other => panic!("expected a DSL error, got {other:?}"),
    }
    assert!(err.message.contains("expected ':' after condition"), "{err}");
}

#[test]
fn output_dtype_follows_promotion() {
    let vars = [
        VarDesc::new("a", Dtype::Int16),
        VarDesc::new("b", Dtype::UInt8),
    ];
    assert_eq!(compile("a + b", &vars, Dtype::Auto).unwrap().dtype(), Dtype::Int32);
    assert_eq!(compile("a < b", &vars, Dtype::Auto).unwrap().dtype(), Dtype::Bool);
    assert_eq!(compile("a + b", &vars, Dtype::Float32).unwrap().dtype(), Dtype::Float32);
}

#[test]
fn mixed_signedness_widens_past_the_signed_operand() {
    let cases = [
        (Dtype::Int32, Dtype::UInt8, Dtype::Int64),
        (Dtype::Int32, Dtype::UInt16, Dtype::Int64),
        (Dtype::Int64, Dtype::UInt8, Dtype::Float64),
        (Dtype::UInt32, Dtype::Int64, Dtype::Float64),
    ];
    for (a, b, expected) in cases {
        let vars = [VarDesc::new("a", a), VarDesc::new("b", b)];
        let kernel = compile("a + b", &vars, Dtype::Auto).unwrap();
        assert_eq!(kernel.dtype(), expected, "{a} + {b}");
    }
}

#[test]
fn compile_then_free_releases_every_node() {
    let vars = [
        VarDesc::new("a", Dtype::Float64),
        VarDesc::new("b", Dtype::Float64),
    ];
    let tree = compile("(a + b) * (a - b)", &vars, Dtype::Auto).unwrap();
    assert_eq!(tree.free().nodes, 7);

    let program = compile("t = a + b\nresult = t * 2", &vars, Dtype::Auto).unwrap();
    // `a + b` has 3 nodes, `t * 2` has 3.
    assert_eq!(program.free().nodes, 6);
}

#[test]
fn literals_follow_a_float32_first_variable() {
    let vars = [VarDesc::new("a", Dtype::Float32)];
    for text in ["a * 2", "a + 1", "a + 3.0", "2 * a - 1"] {
        let kernel = compile(text, &vars, Dtype::Auto).unwrap();
        assert_eq!(kernel.dtype(), Dtype::Float32, "{text}");
    }
}
