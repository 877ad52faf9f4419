//! Numex Eval - evaluation of typed expression trees and DSL programs.
//!
//! # Architecture
//!
//! - `Column`: one dtype-tagged vector of values, possibly broadcast from a
//!   single element
//! - `kernels`: elementwise unary, binary and builtin-call dispatch
//! - `Reducer`: accumulation for `sum`, `prod`, `min`, `max`, `any`, `all`
//!   and `mean`, mergeable across partial results
//! - `Evaluator`: the seam the compiler and the ND engine evaluate through;
//!   `TreeEvaluator` is the tree-walking implementation
//! - `Executor`: statement-level interpreter for compiled DSL programs
//!
//! All buffers are native-endian bytes laid out as the variable slots
//! describe.

mod column;
mod config;
mod evaluator;
mod exec;
pub mod kernels;
mod print_handler;
mod reduce;

#[cfg(test)]
mod test_trees;

pub use column::{Column, ColumnData};
pub use config::{detected_backend, EvalConfig, MathBackend, UlpMode, DEFAULT_SUM_RUN_LIMIT};
pub use evaluator::{evaluate_into, result_dtype, Evaluator, TreeEvaluator};
pub use exec::{Executor, IndexContext};
pub use print_handler::{
    capture_handler, silent_handler, stdout_handler, PrintHandler, SharedPrintHandler,
};
pub use reduce::Reducer;
