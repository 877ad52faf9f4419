//! Moving valid elements between padded blocks and contiguous buffers.

use numex_diagnostic::EvalError;
use numex_ir::{BlockLayout, Run};

/// Padded-buffer offset of every valid element, row-major.
pub(crate) fn valid_offsets(layout: &BlockLayout) -> Result<Vec<usize>, EvalError> {
    let strides = layout.strides();
    let mut offsets = Vec::new();
    offsets.try_reserve_exact(layout.valid as usize)?;
    layout.for_each_valid_coord(|coord| {
        offsets.push(coord.iter().zip(&strides).map(|(c, s)| *c as usize * s).sum());
    });
    Ok(offsets)
}

/// Copy the elements at `offsets` out of `src` into a fresh buffer.
pub(crate) fn gather(src: &[u8], itemsize: usize, offsets: &[usize]) -> Result<Vec<u8>, EvalError> {
    let mut packed = Vec::new();
    packed.try_reserve_exact(offsets.len() * itemsize)?;
    for &at in offsets {
        packed.extend_from_slice(&src[at * itemsize..(at + 1) * itemsize]);
    }
    Ok(packed)
}

/// Write `packed` back to `offsets` in `dst`, zeroing the other elements
/// of the `padded`-element block.
pub(crate) fn scatter(packed: &[u8], itemsize: usize, offsets: &[usize], dst: &mut [u8], padded: usize) {
    dst[..padded * itemsize].fill(0);
    for (item, &at) in packed.chunks_exact(itemsize).zip(offsets) {
        dst[at * itemsize..(at + 1) * itemsize].copy_from_slice(item);
    }
}

/// Zero every element of the `padded`-element block that no run covers.
pub(crate) fn zero_gaps(dst: &mut [u8], itemsize: usize, runs: &[Run], padded: usize) {
    let mut next = 0;
    for run in runs {
        dst[next * itemsize..run.start * itemsize].fill(0);
        next = run.start + run.len;
    }
    dst[next * itemsize..padded * itemsize].fill(0);
}

/// Global per-dimension indices of the elements at the given padded
/// offsets: `indices[d][i]` for the `i`-th offset.
pub(crate) fn global_indices(
    layout: &BlockLayout,
    offsets: impl ExactSizeIterator<Item = usize> + Clone,
) -> Result<Vec<Vec<i64>>, EvalError> {
    let strides = layout.strides();
    let mut indices = Vec::new();
    indices.try_reserve_exact(strides.len())?;
    for (d, stride) in strides.iter().enumerate() {
        let extent = layout.blockshape[d] as usize;
        let origin = layout.origin[d] as i64;
        let mut column = Vec::new();
        column.try_reserve_exact(offsets.len())?;
        column.extend(
            offsets
                .clone()
                .map(|at| origin + ((at / stride) % extent) as i64),
        );
        indices.push(column);
    }
    Ok(indices)
}

/// Zero-initialized scratch of `len` bytes.
pub(crate) fn zeroed(len: usize) -> Result<Vec<u8>, EvalError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len)?;
    buffer.resize(len, 0);
    Ok(buffer)
}
