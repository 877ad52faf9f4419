//! Chunk/block evaluation through the facade.

use numexc::{
    compile_nd, evaluate_nd, evaluate_nd_with, nd_valid_nitems, silent_handler, Dtype, EvalConfig,
    EvalErrorKind, VarDesc,
};
use pretty_assertions::assert_eq;

use crate::common::{bytes_f32, bytes_f64, bytes_i32, f32s, f64s, i32s};

#[test]
fn tail_block_of_a_ragged_chunk() {
    let vars = [VarDesc::new("x", Dtype::Int32)];
    let kernel = compile_nd("x*2", &vars, Dtype::Auto, &[5], &[4], &[4]).unwrap();
    assert_eq!(nd_valid_nitems(&kernel, 1, 0).unwrap(), 1);

    let input = bytes_i32(&[10, 0, 0, 0]);
    let mut out = vec![0xffu8; 16];
    evaluate_nd(&kernel, &[&input], &mut out, 4, 1, 0, &EvalConfig::default()).unwrap();
    assert_eq!(i32s(&out), vec![20, 0, 0, 0]);
}

#[test]
fn float32_block_keeps_its_width() {
    let vars = [VarDesc::new("x", Dtype::Float32)];
    let kernel = compile_nd("x*2", &vars, Dtype::Auto, &[5], &[4], &[4]).unwrap();
    assert_eq!(kernel.dtype(), Dtype::Float32);

    let input = bytes_f32(&[1.5, -2.0, 0.25, 8.0]);
    let mut out = vec![0u8; 16];
    evaluate_nd(&kernel, &[&input], &mut out, 4, 0, 0, &EvalConfig::default()).unwrap();
    assert_eq!(f32s(&out), vec![3.0, -4.0, 0.5, 16.0]);
}

#[test]
fn every_block_of_a_2d_array_matches_the_flat_values() {
    // 5x7 array, 4x6 chunks, 3x4 blocks: every chunk and block kind occurs.
    let shape = [5u64, 7];
    let chunkshape = [4u64, 6];
    let blockshape = [3u64, 4];
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let kernel = compile_nd("x * x + 1", &vars, Dtype::Auto, &shape, &chunkshape, &blockshape)
        .unwrap();
    let geometry = kernel.geometry().unwrap().clone();
    let config = EvalConfig::default();

    let mut covered = 0;
    for nchunk in 0..geometry.nchunks() {
        for nblock in 0..geometry.nblocks() {
            let Some(layout) = geometry.block_layout(nchunk, nblock) else {
                continue;
            };
            let mut block = vec![0.0f64; 12];
            let mut expected = vec![0.0f64; 12];
            layout.for_each_valid_coord(|coord| {
                let local = coord[0] as usize * 4 + coord[1] as usize;
                let row = layout.origin[0] + coord[0];
                let col = layout.origin[1] + coord[1];
                let value = (row * 7 + col) as f64;
                block[local] = value;
                expected[local] = value * value + 1.0;
            });
            let input = bytes_f64(&block);
            let mut out = vec![0u8; 12 * 8];
            evaluate_nd(&kernel, &[&input], &mut out, 12, nchunk, nblock, &config).unwrap();
            assert_eq!(f64s(&out), expected, "chunk {nchunk} block {nblock}");
            covered += nd_valid_nitems(&kernel, nchunk, nblock).unwrap();
        }
    }
    assert_eq!(covered, 35);
}

#[test]
fn block_reduction_writes_one_element() {
    let vars = [VarDesc::new("x", Dtype::Float64)];
    let kernel = compile_nd("sum(x)", &vars, Dtype::Auto, &[5], &[4], &[4]).unwrap();
    assert!(kernel.is_scalar_output());
    // Padding holds garbage that must not be summed.
    let input = bytes_f64(&[2.5, 99.0, 99.0, 99.0]);
    let mut out = vec![0u8; 8];
    evaluate_nd(&kernel, &[&input], &mut out, 4, 1, 0, &EvalConfig::default()).unwrap();
    assert_eq!(f64s(&out), vec![2.5]);
}

#[test]
fn dsl_program_sees_global_indices() {
    let vars = [VarDesc::new("x", Dtype::Int32)];
    let source = "def k(x):\n    return x + _i0 * 100 + _i1\n";
    let kernel = compile_nd(source, &vars, Dtype::Int64, &[4, 4], &[4, 4], &[2, 2]).unwrap();
    let input = bytes_i32(&[0, 0, 0, 0]);
    let mut out = vec![0u8; 4 * 8];
    evaluate_nd_with(
        &kernel,
        &[&input],
        &mut out,
        4,
        0,
        3,
        &EvalConfig::default(),
        &silent_handler(),
    )
    .unwrap();
    let got: Vec<i64> = out
        .chunks_exact(8)
        .map(|c| i64::from_ne_bytes(c.try_into().unwrap()))
        .collect();
    assert_eq!(got, vec![202, 203, 302, 303]);
}

#[test]
fn out_of_range_block_is_an_argument_error() {
    let vars = [VarDesc::new("x", Dtype::Int32)];
    let kernel = compile_nd("x", &vars, Dtype::Auto, &[5], &[4], &[4]).unwrap();
    let input = bytes_i32(&[0; 4]);
    let mut out = vec![0u8; 16];
    let err = evaluate_nd(&kernel, &[&input], &mut out, 4, 2, 0, &EvalConfig::default())
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::InvalidArg);
}

#[test]
fn bad_geometry_fails_to_compile() {
    let vars = [VarDesc::new("x", Dtype::Int32)];
    assert!(compile_nd("x", &vars, Dtype::Auto, &[5, 5], &[4], &[4]).is_err());
    assert!(compile_nd("x", &vars, Dtype::Auto, &[5], &[0], &[4]).is_err());
}
