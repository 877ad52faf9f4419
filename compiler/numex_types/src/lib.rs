//! Numex Types - dtype promotion and inference.
//!
//! - [`promote`]: NumPy's binary promotion table, commutative with `bool`
//!   as the identity
//! - [`float_math_dtype`]: operand dtype of transcendental functions
//! - [`op_typing`]: output and computation dtype of one operation
//! - [`infer_output_type`] / [`infer_result_type`]: whole-subtree inference

mod infer;
mod promote;

pub use infer::{infer_output_type, infer_result_type, op_typing, reduction_output_dtype, OpTyping};
pub use promote::{float_math_dtype, promote, promote_all};
