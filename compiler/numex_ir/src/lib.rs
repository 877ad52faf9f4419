//! Numex IR - shared data types for the numex expression compiler.
//!
//! This crate contains the core data structures used by every other numex crate:
//! - `Dtype`: the closed element-type enum and its byte layout
//! - `Scalar` and `Complex`: single values, with byte encoding and casting
//! - `Tree`: the arena-allocated, typed expression tree
//! - `VarDesc` and synthetic variable addresses
//! - `Geometry`: chunk/block tiling of an N-dimensional array
//! - `Program`: a compiled DSL program (statements plus variable table)
//!
//! # Design Philosophy
//!
//! - **Flatten Everything**: tree nodes live in one `Vec`, addressed by `NodeId(u32)`
//! - **Inline Children**: operations store up to seven children inline (`SmallVec`)
//! - **Immutable After Build**: trees and programs are mutated only while compiling,
//!   then shared read-only (`Send + Sync`) across evaluations

mod complex;
mod dtype;
mod geometry;
mod op;
mod program;
mod scalar;
mod tree;
mod var;

pub use complex::Complex;
pub use dtype::Dtype;
pub use geometry::{BlockLayout, Geometry, GeometryError, Run};
pub use op::{lookup_callee, BinaryOp, Builtin, Callee, OpKind, ReduceOp, UnaryOp};
pub use program::{
    CompilerHint, FpMode, Pragmas, PrintFormat, Program, Reserved, ReservedUse, Stmt, VarEntry,
    VarKind, VarTable,
};
pub use scalar::Scalar;
pub use tree::{FreeStats, Node, NodeFlags, NodeId, NodeKind, Ownership, Tree, VarSlot};
pub use var::{synthetic_address, VarAddress, VarDesc};

/// Maximum number of variables an expression may reference.
///
/// Also the size of the synthetic address pool.
pub const MAX_VARS: usize = 128;

/// Maximum array rank supported by the chunk/block engine.
pub const MAX_DIMS: usize = 64;

/// Maximum block nesting depth of a DSL program.
pub const MAX_NESTING: usize = 32;

/// Elementwise trees are evaluated in sub-blocks of this many items.
pub const EVAL_BLOCK_NITEMS: usize = 4096;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
