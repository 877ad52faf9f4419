//! Numex Diagnostic - error types for every compile and evaluate entry point.
//!
//! - `CompileError`: failures while compiling an expression or DSL program
//! - `DslError`: DSL syntax errors with a line and column
//! - `EvalError`: failures while evaluating a compiled kernel
//! - `ErrorCode`: stable codes (`E0xxx` parse, `E1xxx` compile, `E2xxx` DSL,
//!   `E3xxx` evaluation)
//!
//! Each error carries a structured `kind` for matching and a human-readable
//! `message` with the details.

mod compile_error;
mod dsl_error;
mod error_code;
mod eval_error;

pub use compile_error::{CompileError, CompileErrorKind};
pub use dsl_error::DslError;
pub use error_code::ErrorCode;
pub use eval_error::{EvalError, EvalErrorKind};
