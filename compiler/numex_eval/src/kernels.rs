//! Elementwise kernels over [`Column`](crate::Column)s.

mod arith;
mod math;

pub use arith::{binary, binary_in_place, unary};
pub use math::call;
