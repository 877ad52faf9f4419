//! DSL programs through the facade.

use numexc::{capture_handler, compile, evaluate_with, Dtype, EvalConfig, Kernel, VarDesc};
use pretty_assertions::assert_eq;

use crate::common::{bytes_f64, f64s, run};

#[test]
fn loop_accumulates_into_result() {
    let source = "result = 0\nfor i in range(5):\n    result = result + i\n";
    let kernel = compile(source, &[], Dtype::Float64).unwrap();
    assert!(matches!(kernel, Kernel::Program(_)));
    assert_eq!(kernel.dtype(), Dtype::Float64);
    assert_eq!(f64s(&run(&kernel, &[], 1)), vec![10.0]);
}

#[test]
fn branches_on_a_uniform_condition() {
    let source = "\
def pick(x):
    if _n0 > 2:
        return x
    elif _n0 > 1:
        return -x
    else:
        return x * 0
";
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let kernel = compile(source, &vars, Dtype::Auto).unwrap();
    let two = bytes_f64(&[-3.0, 0.25]);
    assert_eq!(f64s(&run(&kernel, &[&two], 2)), vec![3.0, -0.25]);
    let three = bytes_f64(&[-3.0, 0.25, 7.0]);
    assert_eq!(f64s(&run(&kernel, &[&three], 3)), vec![-3.0, 0.25, 7.0]);
}

#[test]
fn break_leaves_the_loop() {
    let source = "\
def scale(x):
    k = 0
    for i in range(4):
        if i == 2:
            break
        k = k + 1
    return x * k
";
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let kernel = compile(source, &vars, Dtype::Auto).unwrap();
    let input = bytes_f64(&[1.5, -2.0]);
    assert_eq!(f64s(&run(&kernel, &[&input], 2)), vec![3.0, -4.0]);
}

#[test]
fn flat_index_identifiers() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let kernel = compile("result = x + _i0 * 10 + _n0", &vars, Dtype::Auto).unwrap();
    let input = bytes_f64(&[0.5, 0.5, 0.5]);
    assert_eq!(f64s(&run(&kernel, &[&input], 3)), vec![3.5, 13.5, 23.5]);
}

#[test]
fn prints_once_per_evaluation() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let source = "def k(x):\n    s = sum(x)\n    print(\"total {}\", s)\n    return x / s\n";
    let kernel = compile(source, &vars, Dtype::Auto).unwrap();
    let input = bytes_f64(&[1.0, 3.0]);
    let print = capture_handler();
    let mut out = vec![0u8; 16];
    evaluate_with(
        &kernel,
        &[&input],
        &mut out,
        2,
        &EvalConfig::default(),
        &print,
    )
    .unwrap();
    assert_eq!(print.take(), "total 4\n");
    assert_eq!(f64s(&out), vec![0.25, 0.75]);
}

#[test]
fn fast_pragma_is_accepted() {
    let source = "# me:fp = fast\ndef k(x):\n    return sqrt(x)\n";
    let vars = [VarDesc::new("x", Dtype::Float32)];
    let kernel = compile(source, &vars, Dtype::Auto).unwrap();
    assert_eq!(kernel.dtype(), Dtype::Float32);
}
