//! Chunk/block tiling of an N-dimensional array.
//!
//! Chunks tile the logical array; blocks tile a chunk. The last chunk or
//! block along a dimension may be cut short by the array's true extent.
//! Block buffers are always *padded* to the full `blockshape`, row-major.

use std::fmt;

use smallvec::{smallvec, SmallVec};

use crate::MAX_DIMS;

type Dims = SmallVec<[u64; 8]>;

/// Invalid geometry parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeometryError {
    NoDims,
    TooManyDims { ndims: usize },
    LengthMismatch,
    ZeroExtent { dim: usize },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::NoDims => write!(f, "geometry needs at least one dimension"),
            GeometryError::TooManyDims { ndims } => {
                write!(f, "{ndims} dimensions exceeds the maximum of {MAX_DIMS}")
            }
            GeometryError::LengthMismatch => {
                write!(f, "shape, chunkshape and blockshape must have the same rank")
            }
            GeometryError::ZeroExtent { dim } => {
                write!(f, "extents must be positive (dimension {dim})")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Geometry {
    shape: Dims,
    chunkshape: Dims,
    blockshape: Dims,
}

impl Geometry {
    pub fn new(shape: &[u64], chunkshape: &[u64], blockshape: &[u64]) -> Result<Self, GeometryError> {
        let ndims = shape.len();
        if ndims == 0 {
            return Err(GeometryError::NoDims);
        }
        if ndims > MAX_DIMS {
            return Err(GeometryError::TooManyDims { ndims });
        }
        if chunkshape.len() != ndims || blockshape.len() != ndims {
            return Err(GeometryError::LengthMismatch);
        }
        for dim in 0..ndims {
            if shape[dim] == 0 || chunkshape[dim] == 0 || blockshape[dim] == 0 {
                return Err(GeometryError::ZeroExtent { dim });
            }
        }
        Ok(Geometry {
            shape: shape.iter().copied().collect(),
            chunkshape: chunkshape.iter().copied().collect(),
            blockshape: blockshape.iter().copied().collect(),
        })
    }

    #[inline]
    pub fn ndims(&self) -> usize {
        self.shape.len()
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub fn chunkshape(&self) -> &[u64] {
        &self.chunkshape
    }

    pub fn blockshape(&self) -> &[u64] {
        &self.blockshape
    }

    /// Element count of one padded block buffer.
    pub fn block_nitems(&self) -> u64 {
        self.blockshape.iter().product()
    }

    /// Chunks per dimension.
    pub fn chunk_grid(&self) -> Dims {
        self.shape
            .iter()
            .zip(&self.chunkshape)
            .map(|(s, c)| s.div_ceil(*c))
            .collect()
    }

    /// Blocks per dimension within one (nominal) chunk.
    pub fn block_grid(&self) -> Dims {
        self.chunkshape
            .iter()
            .zip(&self.blockshape)
            .map(|(c, b)| c.div_ceil(*b))
            .collect()
    }

    pub fn nchunks(&self) -> u64 {
        self.chunk_grid().iter().product()
    }

    pub fn nblocks(&self) -> u64 {
        self.block_grid().iter().product()
    }

    /// Valid region of block `nblock` inside chunk `nchunk`.
    ///
    /// Both indices are flat and decoded row-major against their grids.
    /// Returns `None` when either is out of range.
    pub fn block_layout(&self, nchunk: u64, nblock: u64) -> Option<BlockLayout> {
        let chunk_coords = decode(nchunk, &self.chunk_grid())?;
        let block_coords = decode(nblock, &self.block_grid())?;

        let ndims = self.ndims();
        let mut valid_len: Dims = smallvec![0; ndims];
        let mut origin: Dims = smallvec![0; ndims];
        for d in 0..ndims {
            let chunk_start = chunk_coords[d] * self.chunkshape[d];
            let chunk_extent = self.chunkshape[d].min(self.shape[d] - chunk_start);
            let block_start = block_coords[d] * self.blockshape[d];
            origin[d] = chunk_start + block_start;
            valid_len[d] = if block_start >= chunk_extent {
                0
            } else {
                self.blockshape[d].min(chunk_extent - block_start)
            };
        }

        Some(BlockLayout {
            valid: valid_len.iter().product(),
            padded: self.block_nitems(),
            blockshape: self.blockshape.clone(),
            valid_len,
            origin,
        })
    }
}

/// Row-major decode of a flat index; `None` when out of range.
fn decode(mut index: u64, grid: &[u64]) -> Option<Dims> {
    let total: u64 = grid.iter().product();
    if index >= total {
        return None;
    }
    let mut coords: Dims = smallvec![0; grid.len()];
    for d in (0..grid.len()).rev() {
        coords[d] = index % grid[d];
        index /= grid[d];
    }
    Some(coords)
}

/// A contiguous stretch of valid elements in a padded block buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Run {
    /// Element offset into the padded buffer.
    pub start: usize,
    pub len: usize,
}

/// Valid region of one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    pub blockshape: Dims,
    /// Valid extent per dimension, `<= blockshape[d]`.
    pub valid_len: Dims,
    /// Global index of the block's first element.
    pub origin: Dims,
    pub valid: u64,
    pub padded: u64,
}

impl BlockLayout {
    #[inline]
    pub fn is_interior(&self) -> bool {
        self.valid == self.padded
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.valid == 0
    }

    /// Row-major element strides of the padded buffer.
    pub fn strides(&self) -> SmallVec<[usize; 8]> {
        let ndims = self.blockshape.len();
        let mut strides: SmallVec<[usize; 8]> = smallvec![1; ndims];
        for d in (0..ndims.saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * self.blockshape[d + 1] as usize;
        }
        strides
    }

    /// First dimension of the longest suffix of dimensions that are full.
    ///
    /// Returns the index of the last non-full dimension; every dimension
    /// after it spans the whole block. `None` for an interior block.
    pub fn last_partial_dim(&self) -> Option<usize> {
        (0..self.blockshape.len())
            .rev()
            .find(|&d| self.valid_len[d] < self.blockshape[d])
    }

    /// Maximal contiguous runs covering the valid region, in row-major order.
    ///
    /// The full trailing dimensions and the valid length of the last partial
    /// dimension form one run; one run exists per combination of the leading
    /// dimensions' valid indices.
    pub fn runs(&self) -> Vec<Run> {
        if self.is_empty() {
            return Vec::new();
        }
        let Some(k) = self.last_partial_dim() else {
            return vec![Run {
                start: 0,
                len: self.padded as usize,
            }];
        };
        let strides = self.strides();
        let len = self.valid_len[k] as usize * strides[k];

        let nruns: u64 = self.valid_len[..k].iter().product();
        let mut runs = Vec::with_capacity(nruns as usize);
        let mut idx: SmallVec<[u64; 8]> = smallvec![0; k];
        loop {
            let start = idx
                .iter()
                .zip(&strides)
                .map(|(i, s)| *i as usize * s)
                .sum();
            runs.push(Run { start, len });

            let mut d = k;
            loop {
                if d == 0 {
                    return runs;
                }
                d -= 1;
                idx[d] += 1;
                if idx[d] < self.valid_len[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
    }

    /// Visit the block-local coordinates of every valid element, row-major.
    pub fn for_each_valid_coord(&self, mut f: impl FnMut(&[u64])) {
        if self.is_empty() {
            return;
        }
        let ndims = self.valid_len.len();
        let mut idx: SmallVec<[u64; 8]> = smallvec![0; ndims];
        loop {
            f(&idx);
            let mut d = ndims;
            loop {
                if d == 0 {
                    return;
                }
                d -= 1;
                idx[d] += 1;
                if idx[d] < self.valid_len[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
    }
}
