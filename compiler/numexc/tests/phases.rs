#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test code: panics provide clear failure messages"
)]

//! End-to-end tests through the `numexc` facade, grouped by phase.
//!
//! - `compile/` - dtype resolution and compile errors
//! - `eval/` - flat evaluation of expressions and reductions
//! - `dsl/` - DSL programs
//! - `nd/` - chunk/block evaluation
//!
//! ```bash
//! cargo test -p numexc --test phases
//! cargo test -p numexc --test phases nd
//! ```

#[path = "phases/common.rs"]
mod common;

#[path = "phases/compile.rs"]
mod compile;

#[path = "phases/eval.rs"]
mod eval;

#[path = "phases/dsl.rs"]
mod dsl;

#[path = "phases/nd.rs"]
mod nd;
