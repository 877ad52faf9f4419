use super::*;
use numex_compile::{compile_program, compile_program_nd};
use numex_eval::{capture_handler, silent_handler};
use numex_ir::{Dtype, VarDesc};
use pretty_assertions::assert_eq;

fn i64s(values: &[i64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

fn read_i64s(bytes: &[u8]) -> Vec<i64> {
    bytes
        .chunks_exact(8)
        .map(|c| i64::from_ne_bytes(c.try_into().unwrap()))
        .collect()
}

fn compile(source: &str, shape: &[u64], chunks: &[u64], blocks: &[u64]) -> Program {
    let vars = [VarDesc::new("x", Dtype::Int64)];
    compile_program_nd(source, &vars, Dtype::Auto, shape, chunks, blocks).unwrap()
}

fn run(program: &Program, x: &[i64], out_items: usize, nchunk: u64, nblock: u64, config: &EvalConfig) -> Vec<i64> {
    let padded = program.geometry.as_ref().unwrap().block_nitems();
    let x = i64s(x);
    let mut out = i64s(&vec![-1; out_items]);
    execute_program_nd(program, &[&x], &mut out, padded, nchunk, nblock, config, silent_handler())
        .unwrap();
    read_i64s(&out)
}

#[test]
fn index_identifiers_are_global_in_a_tail_chunk() {
    let program = compile("def f(x):\n    result = x + _i0\n", &[5], &[4], &[2]);
    let out = run(&program, &[100, 99], 2, 1, 0, &EvalConfig::default());
    assert_eq!(out, vec![104, 0]);
}

#[test]
fn index_identifiers_in_two_dimensions() {
    let source = "def f(x):\n    result = _i0 * 10 + _i1 + x\n";
    let program = compile(source, &[3, 3], &[3, 3], &[2, 2]);
    let config = EvalConfig::default();

    let interior = run(&program, &[0, 0, 0, 0], 4, 0, 0, &config);
    assert_eq!(interior, vec![0, 1, 10, 11]);

    // Bottom-right block: only (2, 2) is inside the array.
    let corner = run(&program, &[1000, 5, 5, 5], 4, 0, 3, &config);
    assert_eq!(corner, vec![1022, 0, 0, 0]);
}

#[test]
fn runs_and_pack_agree() {
    let source = "def f(x):\n    t = x * _n1\n    if _ndim == 2:\n        t = t + _i0 - _i1\n    result = t\n";
    let program = compile(source, &[5, 7], &[4, 6], &[3, 4]);
    let x: Vec<i64> = (1..=12).collect();
    let packed = EvalConfig {
        force_pack: true,
        ..EvalConfig::default()
    };
    let geometry = program.geometry.as_ref().unwrap();
    for nchunk in 0..geometry.nchunks() {
        for nblock in 0..geometry.nblocks() {
            let split = run(&program, &x, 12, nchunk, nblock, &EvalConfig::default());
            let gathered = run(&program, &x, 12, nchunk, nblock, &packed);
            assert_eq!(split, gathered, "chunk {nchunk} block {nblock}");
        }
    }
}

#[test]
fn printing_programs_run_once_per_block() {
    let source = "def f(x):\n    print(\"rows\", _n0)\n    result = x * 2\n";
    let program = compile(source, &[5, 2], &[4, 2], &[2, 2]);
    let print = capture_handler();
    let x = i64s(&[3, 4, 99, 99]);
    let mut out = vec![0xFF; 32];
    // Chunk 1 holds the single last row.
    execute_program_nd(&program, &[&x], &mut out, 4, 1, 0, &EvalConfig::default(), print.clone())
        .unwrap();
    assert_eq!(print.take(), "rows 5\n");
    assert_eq!(read_i64s(&out), vec![6, 8, 0, 0]);
}

#[test]
fn uniform_programs_write_one_element() {
    let program = compile("def f(x):\n    result = sum(x)\n", &[6], &[6], &[4]);
    let out = run(&program, &[7, 8, 50, 50], 2, 0, 1, &EvalConfig::default());
    assert_eq!(out, vec![15, -1]);
}

#[test]
fn empty_blocks_are_zeroed() {
    let program = compile("def f(x):\n    result = x + 1\n", &[5], &[4], &[2]);
    let out = run(&program, &[1, 1], 2, 1, 1, &EvalConfig::default());
    assert_eq!(out, vec![0, 0]);
}

#[test]
fn programs_need_a_geometry() {
    let vars = [VarDesc::new("x", Dtype::Int64)];
    let program = compile_program("def f(x):\n    result = x\n", &vars, Dtype::Auto).unwrap();
    let x = i64s(&[1]);
    let mut out = vec![0u8; 8];
    let err = execute_program_nd(
        &program,
        &[&x],
        &mut out,
        1,
        0,
        0,
        &EvalConfig::default(),
        silent_handler(),
    )
    .unwrap_err();
    assert_eq!(err.kind, numex_diagnostic::EvalErrorKind::InvalidArg);
}
