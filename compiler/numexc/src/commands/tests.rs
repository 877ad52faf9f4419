use pretty_assertions::assert_eq;

use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

fn options(list: &[&str]) -> Options {
    Options::parse(&args(list)).unwrap()
}

#[test]
fn parses_vars_with_and_without_dtype() {
    assert_eq!(
        parse_var("x:f32=1,2.5, 3").unwrap(),
        InputArg {
            name: "x".to_string(),
            dtype: Dtype::Float32,
            values: vec!["1".to_string(), "2.5".to_string(), "3".to_string()],
        }
    );
    let bare = parse_var("y=4").unwrap();
    assert_eq!(bare.dtype, Dtype::Auto);
    assert_eq!(bare.values, vec!["4".to_string()]);
    assert!(parse_var(":f64=1").is_err());
    assert!(parse_var("x:f16=1").unwrap_err().contains("unknown dtype"));
}

#[test]
fn parses_every_option() {
    let parsed = options(&[
        "x + 1",
        "--var",
        "x:i32=1,2",
        "--dtype=f64",
        "--shape=10,7",
        "--chunks=4,4",
        "--blocks=3,2",
        "--nchunk=2",
        "--nblock=1",
        "--parallel=128",
    ]);
    assert_eq!(parsed.source.as_deref(), Some("x + 1"));
    assert_eq!(parsed.vars.len(), 1);
    assert_eq!(parsed.dtype, Dtype::Float64);
    assert_eq!(parsed.shape, vec![10, 7]);
    assert_eq!(parsed.chunks, vec![4, 4]);
    assert_eq!(parsed.blocks, vec![3, 2]);
    assert_eq!((parsed.nchunk, parsed.nblock), (2, 1));
    assert_eq!(parsed.parallel, Some(128));
    assert_eq!(
        options(&["x", "--parallel"]).parallel,
        Some(DEFAULT_PARALLEL_CHUNK)
    );
}

#[test]
fn rejects_unknown_options_and_extra_arguments() {
    assert!(Options::parse(&args(&["x", "--fast"]))
        .unwrap_err()
        .contains("unknown option"));
    assert!(Options::parse(&args(&["x", "y"]))
        .unwrap_err()
        .contains("unexpected argument"));
    assert!(Options::parse(&args(&["x", "--var"])).is_err());
    assert!(Options::parse(&args(&["x", "--shape=4,a"])).is_err());
}

#[test]
fn parses_values_by_form() {
    assert_eq!(parse_value("-3", Dtype::Int32).unwrap(), Scalar::Int(-3));
    assert_eq!(
        parse_value("18446744073709551615", Dtype::UInt64).unwrap(),
        Scalar::UInt(u64::MAX)
    );
    assert_eq!(parse_value("2.5", Dtype::Float64).unwrap(), Scalar::Float(2.5));
    assert_eq!(parse_value("true", Dtype::Bool).unwrap(), Scalar::Bool(true));
    assert_eq!(
        parse_value("hi", Dtype::String).unwrap(),
        Scalar::Str(vec![u32::from('h'), u32::from('i')])
    );
    assert!(parse_value("abc", Dtype::Float64).is_err());
}

#[test]
fn eval_adds_float32_arrays() {
    let opts = options(&["a + b", "--var", "a:f32=1,2,3", "--var", "b:f32=10,20,30"]);
    assert_eq!(
        eval_command(&opts, &EvalConfig::default()).unwrap(),
        "[11, 22, 33]"
    );
}

#[test]
fn eval_auto_vars_take_the_requested_dtype() {
    let opts = options(&["x / 2", "--var", "x=7,-7", "--dtype=i32"]);
    assert_eq!(
        eval_command(&opts, &EvalConfig::default()).unwrap(),
        "[3, -3]"
    );
}

#[test]
fn eval_prints_a_reduction_as_one_value() {
    let opts = options(&["sum(x)", "--var", "x:i64=1,2,3", "--parallel=1"]);
    assert_eq!(eval_command(&opts, &EvalConfig::default()).unwrap(), "6");
}

#[test]
fn eval_rejects_ragged_var_lengths() {
    let opts = options(&["a + b", "--var", "a:f64=1,2", "--var", "b:f64=1"]);
    let err = eval_command(&opts, &EvalConfig::default()).unwrap_err();
    assert!(err.contains("`b` has 1 values, expected 2"), "{err}");
}

#[test]
fn eval_reports_compile_errors_with_their_code() {
    let opts = options(&["a + ", "--var", "a:f64=1"]);
    let err = eval_command(&opts, &EvalConfig::default()).unwrap_err();
    assert!(err.starts_with("error[E0"), "{err}");
}

#[test]
fn nd_zero_fills_the_tail_block() {
    let opts = options(&[
        "x * 2",
        "--var",
        "x:i32=10",
        "--shape=5",
        "--chunks=4",
        "--blocks=4",
        "--nchunk=1",
    ]);
    assert_eq!(
        nd_command(&opts, &EvalConfig::default()).unwrap(),
        "[20, 0, 0, 0]"
    );
}

#[test]
fn nd_rejects_too_many_values() {
    let opts = options(&[
        "x",
        "--var",
        "x:i32=1,2,3",
        "--shape=4",
        "--chunks=2",
        "--blocks=2",
    ]);
    assert!(nd_command(&opts, &EvalConfig::default())
        .unwrap_err()
        .contains("3 values given for 2 elements"));
}

#[test]
fn dump_prints_the_tree() {
    let opts = options(&["-x", "--var", "x:f64"]);
    assert_eq!(dump_command(&opts).unwrap(), "- : float64\n  var x : float64\n");
}

#[test]
fn check_reports_kind_and_dtype() {
    let opts = options(&["kernel.dsl", "--var", "x:f64"]);
    let source = "def kernel(x):\n    y = x * 2\n    return y\n";
    assert_eq!(
        check_source("kernel.dsl", source, &opts).unwrap(),
        "kernel.dsl: ok (program -> float64)"
    );
    let err = check_source("kernel.dsl", "def kernel(x):\n", &opts).unwrap_err();
    assert!(err.starts_with("kernel.dsl: error[E2"), "{err}");
}

#[test]
fn check_reports_missing_files() {
    let opts = options(&["/nonexistent/numex/kernel.dsl"]);
    assert!(check_command(&opts).unwrap_err().contains("cannot read"));
}
