//! Numex Compile - expression and DSL program compilation.
//!
//! # Pipeline
//!
//! 1. `numex_parse` turns text into a syntax tree (or a DSL statement AST)
//! 2. `lower` resolves names, types literals and operations, and inserts
//!    conversion nodes around promoted binary operands
//! 3. `validate` rejects nested reductions and unsupported complex or
//!    string operands
//! 4. `const_fold` evaluates constant subtrees
//!
//! The DSL compiler runs that pipeline for every expression of a program,
//! against the program's growing variable table.

mod const_fold;
mod dsl;
mod expr;
mod lower;
mod validate;

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod test_support;

pub use dsl::{compile_program, compile_program_nd};
pub use expr::{compile_expr, compile_expr_nd};
pub use numex_parse::dsl::looks_like_dsl;
