//! Numex ND - evaluation of one block of a chunked N-dimensional array.
//!
//! An array of `shape` is split into chunks of `chunkshape`, each chunk into
//! blocks of `blockshape`. Callers hand over one padded block buffer per
//! input (always `∏ blockshape` elements) and receive one padded output
//! block. Elements outside the array, or outside a boundary-truncated
//! chunk, are padding: they are never evaluated and come back zeroed.
//!
//! # Strategies
//!
//! - empty block: zero-fill, no evaluation
//! - interior block: one flat evaluation over the caller's buffers
//! - ragged block whose runs may be evaluated independently: one
//!   evaluation per contiguous run, in place
//! - anything else: gather the valid elements, evaluate once, scatter back
//!
//! Root reductions over a bare variable or a comparison against a constant
//! skip the gather and read the strided block directly.

mod pack;
mod plan;
mod program;
mod strided;
mod tree;

use numex_diagnostic::EvalError;
use numex_ir::{BlockLayout, Geometry};

pub use plan::{choose, KernelShape, Strategy};
pub use program::execute_program_nd;
pub use tree::evaluate_tree_nd;

/// Number of valid elements in block `nblock` of chunk `nchunk`.
pub fn valid_nitems(geometry: &Geometry, nchunk: u64, nblock: u64) -> Result<u64, EvalError> {
    Ok(locate(geometry, nchunk, nblock)?.valid)
}

/// The layout of a block, rejecting indices outside the grids.
fn locate(geometry: &Geometry, nchunk: u64, nblock: u64) -> Result<BlockLayout, EvalError> {
    geometry.block_layout(nchunk, nblock).ok_or_else(|| {
        EvalError::invalid_arg(format!(
            "chunk {nchunk} block {nblock} is outside a grid of {} chunks and {} blocks",
            geometry.nchunks(),
            geometry.nblocks()
        ))
    })
}

/// [`locate`], also checking the caller's idea of the padded block size.
fn block(
    geometry: &Geometry,
    block_nitems: u64,
    nchunk: u64,
    nblock: u64,
) -> Result<BlockLayout, EvalError> {
    if block_nitems != geometry.block_nitems() {
        return Err(EvalError::invalid_arg(format!(
            "block holds {} elements, {block_nitems} given",
            geometry.block_nitems()
        )));
    }
    locate(geometry, nchunk, nblock)
}

/// Check that a buffer holds `items` elements of `itemsize` bytes.
fn check_len(what: &str, bytes: &[u8], items: usize, itemsize: usize) -> Result<(), EvalError> {
    let need = items * itemsize;
    if bytes.len() < need {
        return Err(EvalError::invalid_arg(format!(
            "{what} holds {} bytes, {need} needed",
            bytes.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
