//! Shared builders for the compiler's unit tests.

use numex_diagnostic::CompileError;
use numex_ir::{synthetic_address, Dtype, Tree, VarAddress, VarDesc, VarSlot};
use numex_parse::parse_expr;

use crate::lower::{Literals, Lowerer};

pub(crate) fn vars(list: &[(&str, Dtype)]) -> Vec<VarDesc> {
    list.iter()
        .map(|(name, dtype)| VarDesc::new(*name, *dtype))
        .collect()
}

/// Parse and lower `text` without validating or folding it.
pub(crate) fn lowered(
    text: &str,
    list: &[(&str, Dtype)],
    literals: Literals,
) -> Result<Tree, CompileError> {
    let slots: Vec<VarSlot> = list
        .iter()
        .map(|(name, dtype)| VarSlot {
            name: (*name).to_string(),
            dtype: *dtype,
            itemsize: if dtype.is_string() { 16 } else { dtype.size() },
        })
        .collect();
    let bindings: Vec<VarAddress> = (0..slots.len()).map(synthetic_address).collect();
    Lowerer::new(slots, &bindings, literals).lower(&parse_expr(text)?)
}

/// Literal typing of an `auto` request whose first variable is `first`.
pub(crate) fn auto(first: Option<Dtype>) -> Literals {
    Literals::for_request(Dtype::Auto, first)
}
