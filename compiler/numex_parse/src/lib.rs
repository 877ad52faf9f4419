//! Numex Parse - parsers for expression text and DSL programs.
//!
//! - [`parse_expr`]: recursive descent over `numex_lexer` tokens, producing
//!   an [`Expr`] syntax tree with byte spans
//! - [`dsl`]: the line-based DSL parser. Statement structure is parsed
//!   here; expression texts are carried verbatim with their positions and
//!   parsed by the compiler against its variable table.

mod ast;
pub mod dsl;
mod parser;

pub use ast::{Expr, ExprKind};
pub use numex_lexer::Span;
pub use parser::parse_expr;
