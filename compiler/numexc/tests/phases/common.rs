//! Buffer helpers shared by the phase tests.

use numexc::{silent_handler, EvalConfig, Kernel};

pub fn bytes_f32(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

pub fn bytes_f64(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

pub fn bytes_i32(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

pub fn bytes_bool(values: &[bool]) -> Vec<u8> {
    values.iter().map(|v| u8::from(*v)).collect()
}

pub fn f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes(c.try_into().unwrap()))
        .collect()
}

pub fn f64s(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|c| f64::from_ne_bytes(c.try_into().unwrap()))
        .collect()
}

pub fn i32s(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|c| i32::from_ne_bytes(c.try_into().unwrap()))
        .collect()
}

/// Evaluate `kernel` over `n` elements with default settings and no print
/// output, returning the raw output bytes.
pub fn run(kernel: &Kernel, inputs: &[&[u8]], n: usize) -> Vec<u8> {
    let items = if kernel.is_scalar_output() { 1 } else { n };
    let mut out = vec![0u8; items * kernel.dtype().size()];
    numexc::evaluate_with(
        kernel,
        inputs,
        &mut out,
        n,
        &EvalConfig::default(),
        &silent_handler(),
    )
    .unwrap();
    out
}
