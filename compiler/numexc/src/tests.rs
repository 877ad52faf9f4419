use pretty_assertions::assert_eq;

use super::*;

fn f64_bytes(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

fn f64s(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|c| f64::from_ne_bytes(c.try_into().unwrap()))
        .collect()
}

#[test]
fn dsl_shaped_source_compiles_to_a_program() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let expr = compile("x * 2", &vars, Dtype::Auto).unwrap();
    assert!(matches!(expr, Kernel::Tree(_)));
    let program = compile("y = x * 2\ny + 1", &vars, Dtype::Auto).unwrap();
    assert!(matches!(program, Kernel::Program(_)));
    assert_eq!(program.dtype(), Dtype::Float64);
}

#[test]
fn dump_lists_one_node_per_line() {
    let vars = [
        VarDesc::new("a", Dtype::Float32),
        VarDesc::new("b", Dtype::Float32),
    ];
    let kernel = compile("a + b", &vars, Dtype::Auto).unwrap();
    assert_eq!(
        kernel.dump(),
        "+ : float32\n  var a : float32\n  var b : float32\n"
    );
}

#[test]
fn free_reports_every_node() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let kernel = compile("sqrt(x) + x * x", &vars, Dtype::Auto).unwrap();
    let stats = kernel.free();
    assert_eq!(stats.nodes, 6);
}

#[test]
fn parallel_matches_serial_evaluation() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let kernel = compile("x * x - 3 * x", &vars, Dtype::Auto).unwrap();
    let input: Vec<f64> = (0..1000).map(f64::from).collect();
    let bytes = f64_bytes(&input);
    let config = EvalConfig::default();

    let mut serial = vec![0u8; 1000 * 8];
    evaluate(&kernel, &[&bytes], &mut serial, 1000, &config).unwrap();
    let mut parallel = vec![0u8; 1000 * 8];
    evaluate_parallel(
        &kernel,
        &[&bytes],
        &mut parallel,
        1000,
        64,
        &config,
        &silent_handler(),
    )
    .unwrap();
    assert_eq!(f64s(&serial), f64s(&parallel));
}

#[test]
fn parallel_program_sees_global_indices() {
    let vars = [VarDesc::new("x", Dtype::Int64)];
    let kernel = compile("result = x + _i0", &vars, Dtype::Int64).unwrap();
    let input: Vec<u8> = (0..10i64).flat_map(|v| (v * 100).to_ne_bytes()).collect();
    let mut out = vec![0u8; 10 * 8];
    evaluate_parallel(
        &kernel,
        &[&input],
        &mut out,
        10,
        3,
        &EvalConfig::default(),
        &silent_handler(),
    )
    .unwrap();
    let got: Vec<i64> = out
        .chunks_exact(8)
        .map(|c| i64::from_ne_bytes(c.try_into().unwrap()))
        .collect();
    assert_eq!(got, (0..10).map(|v| v * 101).collect::<Vec<i64>>());
}

#[test]
fn parallel_reduction_runs_whole() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let kernel = compile("sum(x)", &vars, Dtype::Auto).unwrap();
    let bytes = f64_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    let mut out = vec![0u8; 8];
    evaluate_parallel(
        &kernel,
        &[&bytes],
        &mut out,
        5,
        2,
        &EvalConfig::default(),
        &silent_handler(),
    )
    .unwrap();
    assert_eq!(f64s(&out), vec![15.0]);
}

#[test]
fn parallel_rejects_short_inputs() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let kernel = compile("x + 1", &vars, Dtype::Auto).unwrap();
    let bytes = f64_bytes(&[1.0; 10]);
    let mut out = vec![0u8; 20 * 8];
    let err = evaluate_parallel(
        &kernel,
        &[&bytes],
        &mut out,
        20,
        4,
        &EvalConfig::default(),
        &silent_handler(),
    )
    .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::InvalidArg);
}

#[test]
fn valid_nitems_needs_a_geometry() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let flat = compile("x", &vars, Dtype::Auto).unwrap();
    assert_eq!(
        nd_valid_nitems(&flat, 0, 0).unwrap_err().kind,
        EvalErrorKind::InvalidArg
    );

    let nd = compile_nd("x", &vars, Dtype::Auto, &[10, 7], &[4, 4], &[3, 2]).unwrap();
    assert_eq!(nd_valid_nitems(&nd, 0, 0).unwrap(), 6);
}

#[test]
fn version_is_the_package_version() {
    assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
}
