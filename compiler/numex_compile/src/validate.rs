//! Post-lowering checks on reductions, complex and string operands.

use numex_diagnostic::CompileError;
use numex_ir::{BinaryOp, Dtype, NodeId, NodeKind, OpKind, ReduceOp, Tree};

/// Reject trees the evaluator cannot run. Checks run in a fixed order:
/// reductions, then the target's complex support, then complex and
/// string operands.
pub(crate) fn validate(tree: &Tree, requested: Dtype) -> Result<(), CompileError> {
    let root = tree.root();
    let order = tree.preorder(root);

    for &id in &order {
        if let Some(OpKind::Reduce(op)) = tree.node(id).op() {
            check_reduction(tree, id, op)?;
        }
    }

    if cfg!(windows) && uses_complex(tree, &order, requested) {
        return Err(CompileError::complex_unsupported());
    }

    for &id in &order {
        check_operands(tree, id)?;
    }

    let output = tree.node(root).dtype;
    if output.is_string() || requested.is_string() {
        return Err(CompileError::invalid_arg_type(
            "an expression cannot produce string output",
        ));
    }
    Ok(())
}

fn check_reduction(tree: &Tree, id: NodeId, op: ReduceOp) -> Result<(), CompileError> {
    let arg = tree.children(id)[0];
    if tree.contains_reduction(arg) {
        return Err(CompileError::reduction_invalid(format!(
            "`{}` argument contains another reduction",
            op.name()
        )));
    }
    let dtype = tree.node(arg).dtype;
    if matches!(op, ReduceOp::Min | ReduceOp::Max) && dtype.is_complex() {
        return Err(CompileError::reduction_invalid(format!(
            "`{}` is not defined for complex values",
            op.name()
        )));
    }
    Ok(())
}

fn uses_complex(tree: &Tree, order: &[NodeId], requested: Dtype) -> bool {
    requested.is_complex()
        || tree.vars().iter().any(|v| v.dtype.is_complex())
        || order.iter().any(|&id| {
            let node = tree.node(id);
            node.dtype.is_complex() || node.input_dtype.is_complex()
        })
}

fn check_operands(tree: &Tree, id: NodeId) -> Result<(), CompileError> {
    let node = tree.node(id);
    let NodeKind::Operation { op, children } = &node.kind else {
        return Ok(());
    };
    let child_dtypes: Vec<Dtype> = children.iter().map(|c| tree.node(*c).dtype).collect();

    let string_operands = child_dtypes.iter().filter(|d| d.is_string()).count();
    let string_op = match op {
        OpKind::Binary(BinaryOp::Eq | BinaryOp::Ne) => true,
        OpKind::Call(b) => b.is_string_fn(),
        _ => false,
    };
    if string_op && string_operands == child_dtypes.len() {
        return Ok(());
    }
    if string_op && matches!(op, OpKind::Call(_)) {
        return Err(CompileError::invalid_arg_type(format!(
            "`{op}` needs string operands"
        )));
    }
    if string_operands > 0 {
        return Err(CompileError::invalid_arg_type(format!(
            "`{op}` does not accept string operands"
        )));
    }

    let complex = node.input_dtype.is_complex() || child_dtypes.iter().any(|d| d.is_complex());
    if complex && !op.supports_complex() {
        return Err(CompileError::invalid_arg_type(format!(
            "`{op}` does not accept complex operands"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
