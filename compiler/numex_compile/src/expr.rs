//! Expression compiler entry points.

use numex_diagnostic::CompileError;
use numex_ir::{synthetic_address, Dtype, Geometry, Tree, VarAddress, VarDesc, VarSlot, MAX_VARS};
use numex_parse::parse_expr;
use numex_types::infer_output_type;

use crate::const_fold::fold_constants;
use crate::lower::{assign_aliases, Literals, Lowerer};
use crate::validate::validate;

/// Compile `text` into a typed tree over `vars`.
///
/// With `dtype = auto` every variable must have an explicit dtype and the
/// output dtype is inferred. With a concrete `dtype` the variables are
/// either all `auto` (they take `dtype`) or all explicit (they are promoted
/// and the result is cast to `dtype`).
#[tracing::instrument(level = "trace", skip(vars), fields(nvars = vars.len()))]
pub fn compile_expr(text: &str, vars: &[VarDesc], dtype: Dtype) -> Result<Tree, CompileError> {
    let (slots, bindings) = resolve_vars(vars, dtype)?;
    let literals = Literals::for_request(dtype, slots.first().map(|s| s.dtype));
    build_tree(text, slots, &bindings, literals, dtype)
}

/// [`compile_expr`] for an N-dimensional array tiled by `chunkshape` and
/// `blockshape`.
#[tracing::instrument(level = "trace", skip(vars), fields(nvars = vars.len()))]
pub fn compile_expr_nd(
    text: &str,
    vars: &[VarDesc],
    dtype: Dtype,
    shape: &[u64],
    chunkshape: &[u64],
    blockshape: &[u64],
) -> Result<Tree, CompileError> {
    let geometry = Geometry::new(shape, chunkshape, blockshape)?;
    let mut tree = compile_expr(text, vars, dtype)?;
    tree.set_geometry(geometry);
    Ok(tree)
}

/// Apply the dtype-resolution contract and bind every variable.
pub(crate) fn resolve_vars(
    vars: &[VarDesc],
    dtype: Dtype,
) -> Result<(Vec<VarSlot>, Vec<VarAddress>), CompileError> {
    if vars.len() > MAX_VARS {
        return Err(CompileError::invalid_arg(format!(
            "{} variables exceeds the maximum of {MAX_VARS}",
            vars.len()
        )));
    }
    if dtype.is_auto() {
        if let Some(var) = vars.iter().find(|v| v.dtype.is_auto()) {
            return Err(CompileError::var_unspecified(&var.name));
        }
    } else {
        let autos = vars.iter().filter(|v| v.dtype.is_auto()).count();
        if autos > 0 && autos < vars.len() {
            return Err(CompileError::var_mixed());
        }
    }

    let mut slots = Vec::new();
    slots.try_reserve_exact(vars.len()).map_err(|_| CompileError::oom())?;
    let mut bindings = Vec::with_capacity(vars.len());
    for (position, var) in vars.iter().enumerate() {
        if vars[..position].iter().any(|v| v.name == var.name) {
            return Err(CompileError::invalid_arg(format!(
                "variable `{}` is declared twice",
                var.name
            )));
        }
        let resolved = if var.dtype.is_auto() { dtype } else { var.dtype };
        let itemsize = if var.dtype.is_auto() {
            resolved.size()
        } else {
            var.itemsize
        };
        if resolved.is_string() && itemsize == 0 {
            return Err(CompileError::invalid_arg(format!(
                "string variable `{}` needs a positive itemsize",
                var.name
            )));
        }
        slots.push(VarSlot {
            name: var.name.clone(),
            dtype: resolved,
            itemsize,
        });
        bindings.push(var.address.unwrap_or_else(|| synthetic_address(position)));
    }
    Ok((slots, bindings))
}

/// Parse, lower, validate and fold one expression.
///
/// `requested` is the output dtype: `auto` infers it from the tree.
pub(crate) fn build_tree(
    text: &str,
    slots: Vec<VarSlot>,
    bindings: &[VarAddress],
    literals: Literals,
    requested: Dtype,
) -> Result<Tree, CompileError> {
    let expr = parse_expr(text)?;
    let mut tree = Lowerer::new(slots, bindings, literals).lower(&expr)?;
    validate(&tree, requested)?;
    fold_constants(&mut tree);
    assign_aliases(&mut tree);

    let output = if requested.is_auto() {
        infer_output_type(&tree, tree.root())
    } else {
        requested
    };
    tree.set_output_dtype(output);
    tracing::debug!(nodes = tree.len(), %output, "compiled expression");
    Ok(tree)
}
