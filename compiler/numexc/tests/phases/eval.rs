//! Flat evaluation of expressions and reductions.

use numexc::{compile, evaluate, Dtype, EvalConfig, EvalErrorKind, VarDesc};
use pretty_assertions::assert_eq;

use crate::common::{bytes_bool, bytes_f32, bytes_f64, bytes_i32, f32s, f64s, i32s, run};

#[test]
fn float32_addition() {
    let vars = [
        VarDesc::new("a", Dtype::Float32),
        VarDesc::new("b", Dtype::Float32),
    ];
    let kernel = compile("a+b", &vars, Dtype::Auto).unwrap();
    assert_eq!(kernel.dtype(), Dtype::Float32);
    let a = bytes_f32(&[1.0, 2.0, 3.0]);
    let b = bytes_f32(&[10.0, 20.0, 30.0]);
    assert_eq!(f32s(&run(&kernel, &[&a, &b], 3)), vec![11.0, 22.0, 33.0]);
}

#[test]
fn integer_division_truncates_and_tolerates_zero() {
    let vars = [
        VarDesc::new("a", Dtype::Int32),
        VarDesc::new("b", Dtype::Int32),
    ];
    let kernel = compile("a/b", &vars, Dtype::Auto).unwrap();
    assert_eq!(kernel.dtype(), Dtype::Int32);
    let a = bytes_i32(&[7, -7, 5]);
    let b = bytes_i32(&[2, 2, 0]);
    assert_eq!(i32s(&run(&kernel, &[&a, &b], 3)), vec![3, -3, 0]);
}

#[test]
fn any_and_all_over_uniform_input() {
    let vars = [VarDesc::new("p", Dtype::Bool)];
    let any = compile("any(p)", &vars, Dtype::Auto).unwrap();
    let all = compile("all(p)", &vars, Dtype::Auto).unwrap();
    let falses = bytes_bool(&[false; 5]);
    let trues = bytes_bool(&[true; 5]);
    assert_eq!(run(&any, &[&falses], 5), vec![0]);
    assert_eq!(run(&all, &[&trues], 5), vec![1]);
    assert_eq!(run(&any, &[&trues], 5), vec![1]);
    assert_eq!(run(&all, &[&falses], 5), vec![0]);
}

#[test]
fn min_and_max_propagate_nan_from_any_position() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let min = compile("min(x)", &vars, Dtype::Auto).unwrap();
    let max = compile("max(x)", &vars, Dtype::Auto).unwrap();
    for position in 0..4 {
        let mut values = vec![3.0, -1.0, 8.0, 2.0];
        values[position] = f64::NAN;
        let input = bytes_f64(&values);
        assert!(f64s(&run(&min, &[&input], 4))[0].is_nan(), "min, NaN at {position}");
        assert!(f64s(&run(&max, &[&input], 4))[0].is_nan(), "max, NaN at {position}");
    }
}

#[test]
fn mean_of_integers_is_float64() {
    let vars = [VarDesc::new("x", Dtype::Int32)];
    let kernel = compile("mean(x)", &vars, Dtype::Auto).unwrap();
    assert_eq!(kernel.dtype(), Dtype::Float64);
    let input = bytes_i32(&[1, 2, 3, 4]);
    assert_eq!(f64s(&run(&kernel, &[&input], 4)), vec![2.5]);
}

#[test]
fn where_selects_per_element() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let kernel = compile("where(x > 0, x, -x)", &vars, Dtype::Auto).unwrap();
    let input = bytes_f64(&[-2.0, 3.0, -0.5]);
    assert_eq!(f64s(&run(&kernel, &[&input], 3)), vec![2.0, 3.0, 0.5]);
}

#[test]
fn long_arrays_evaluate_in_sub_blocks() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let kernel = compile("x * 2 + 1", &vars, Dtype::Auto).unwrap();
    let n = 10_000;
    let values: Vec<f64> = (0..n).map(f64::from).collect();
    let input = bytes_f64(&values);
    let out = f64s(&run(&kernel, &[&input], n as usize));
    assert_eq!(out.len(), n as usize);
    assert_eq!(out[4095], 8191.0);
    assert_eq!(out[4096], 8193.0);
    assert_eq!(out[9999], 19999.0);
}

#[test]
fn missing_inputs_are_a_var_mismatch() {
    let vars = [
        VarDesc::new("a", Dtype::Float64),
        VarDesc::new("b", Dtype::Float64),
    ];
    let kernel = compile("a + b", &vars, Dtype::Auto).unwrap();
    let a = bytes_f64(&[1.0]);
    let mut out = vec![0u8; 8];
    let err = evaluate(&kernel, &[&a], &mut out, 1, &EvalConfig::default()).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::VarMismatch { expected: 2, got: 1 });
}
