//! Tree evaluation.
//!
//! [`Evaluator`] is the seam between the compiler and whatever executes a
//! typed tree; [`TreeEvaluator`] is the tree-walking implementation. Both
//! the DSL executor and the chunk/block engine only talk to the trait.

use numex_diagnostic::EvalError;
use numex_ir::{
    Builtin, Dtype, NodeId, NodeKind, OpKind, Ownership, Tree, VarSlot, EVAL_BLOCK_NITEMS,
    MAX_VARS,
};
use numex_stack::ensure_sufficient_stack;

use crate::column::{Column, ColumnData};
use crate::config::EvalConfig;
use crate::kernels;
use crate::reduce::Reducer;

/// Executes typed trees against native-endian byte buffers.
pub trait Evaluator: Send + Sync {
    /// Values of node `id` over `n` elements. `inputs[i]` holds variable
    /// `i`. The result may have length one when every element is equal.
    fn eval_node(
        &self,
        tree: &Tree,
        id: NodeId,
        inputs: &[&[u8]],
        n: usize,
    ) -> Result<Column, EvalError>;

    /// The root's values, cast to the tree's output dtype.
    fn eval(&self, tree: &Tree, inputs: &[&[u8]], n: usize) -> Result<Column, EvalError> {
        if tree.root() == NodeId::INVALID {
            return Err(EvalError::null_expr());
        }
        let column = self.eval_node(tree, tree.root(), inputs, n)?;
        Ok(column.cast(result_dtype(tree)))
    }
}

/// The dtype a tree writes: its output dtype, or the root's when unset.
pub fn result_dtype(tree: &Tree) -> Dtype {
    match tree.output_dtype() {
        Dtype::Auto => tree.node(tree.root()).dtype,
        dtype => dtype,
    }
}

fn check_input(slot: &VarSlot, bytes: &[u8], n: usize) -> Result<(), EvalError> {
    let need = n * slot.itemsize;
    if bytes.len() < need {
        return Err(EvalError::invalid_arg(format!(
            "input `{}` holds {} bytes, {need} needed",
            slot.name,
            bytes.len()
        )));
    }
    Ok(())
}

/// Evaluate `tree` over `n` elements and write the result into `output`.
///
/// A tree rooted at a reduction writes one element. Trees without
/// reductions are evaluated in sub-blocks of [`EVAL_BLOCK_NITEMS`].
pub fn evaluate_into(
    evaluator: &dyn Evaluator,
    tree: &Tree,
    inputs: &[&[u8]],
    output: &mut [u8],
    n: usize,
) -> Result<(), EvalError> {
    if tree.root() == NodeId::INVALID {
        return Err(EvalError::null_expr());
    }
    let vars = tree.vars();
    if vars.len() > MAX_VARS {
        return Err(EvalError::too_many_vars(vars.len()));
    }
    if inputs.len() < vars.len() {
        return Err(EvalError::var_mismatch(vars.len(), inputs.len()));
    }
    for (slot, bytes) in vars.iter().zip(inputs) {
        check_input(slot, bytes, n)?;
    }

    let dtype = result_dtype(tree);
    let itemsize = dtype.size();
    if itemsize == 0 {
        return Err(EvalError::invalid_arg(format!("cannot write {dtype} output")));
    }
    let out_items = if tree.is_scalar_output() { n.min(1) } else { n };
    if output.len() < out_items * itemsize {
        return Err(EvalError::invalid_arg(format!(
            "output holds {} bytes, {} needed",
            output.len(),
            out_items * itemsize
        )));
    }

    if tree.is_scalar_output() || tree.has_reductions() || n <= EVAL_BLOCK_NITEMS {
        let column = evaluator.eval(tree, inputs, n)?;
        column.write(output, itemsize, out_items);
        return Ok(());
    }

    let mut offset = 0;
    while offset < n {
        let len = EVAL_BLOCK_NITEMS.min(n - offset);
        let sub: Vec<&[u8]> = inputs
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                let size = vars.get(i).map_or(0, |v| v.itemsize);
                &bytes[(offset * size).min(bytes.len())..]
            })
            .collect();
        let column = evaluator.eval(tree, &sub, len)?;
        column.write(&mut output[offset * itemsize..], itemsize, len);
        offset += len;
    }
    Ok(())
}

/// Recursive tree-walking evaluator.
#[derive(Clone, Debug, Default)]
pub struct TreeEvaluator {
    config: EvalConfig,
}

impl TreeEvaluator {
    pub fn new(config: EvalConfig) -> Self {
        TreeEvaluator { config }
    }

    fn eval_operation(
        &self,
        tree: &Tree,
        id: NodeId,
        inputs: &[&[u8]],
        n: usize,
    ) -> Result<Column, EvalError> {
        let node = tree.node(id);
        let (op, children) = match &node.kind {
            NodeKind::Operation { op, children } => (*op, children),
            _ => unreachable!("eval_operation on a leaf"),
        };
        let operand = |child: NodeId| -> Result<Column, EvalError> {
            Ok(self.eval_node(tree, child, inputs, n)?.cast(node.input_dtype))
        };

        let column = match op {
            OpKind::Convert => self.eval_node(tree, children[0], inputs, n)?,
            OpKind::Reduce(reduce) => {
                let arg = self.eval_node(tree, children[0], inputs, n)?;
                let mut reducer = Reducer::new(reduce, arg.dtype);
                reducer.push_column(&arg, n);
                let value = reducer.finish();
                tracing::trace!(node = %id, op = reduce.name(), %value, "reduced");
                Column::from_scalar(&value, node.dtype)
            }
            OpKind::Unary(unary) => kernels::unary(unary, operand(children[0])?),
            OpKind::Binary(binary) => {
                let left = operand(children[0])?;
                let right = operand(children[1])?;
                if tree.node(children[0]).ownership == Ownership::AliasOf(id) {
                    kernels::binary_in_place(binary, left, right)
                } else {
                    kernels::binary(binary, left, right)
                }
            }
            OpKind::Call(builtin) => {
                let mut args = Vec::with_capacity(children.len());
                for (i, child) in children.iter().enumerate() {
                    args.push(if i == 0 && builtin == Builtin::Where {
                        self.eval_node(tree, *child, inputs, n)?
                    } else {
                        operand(*child)?
                    });
                }
                kernels::call(builtin, args, node.dtype, &self.config)
            }
        };
        Ok(column.cast(node.dtype))
    }
}

impl Evaluator for TreeEvaluator {
    fn eval_node(
        &self,
        tree: &Tree,
        id: NodeId,
        inputs: &[&[u8]],
        n: usize,
    ) -> Result<Column, EvalError> {
        ensure_sufficient_stack(|| {
            let node = tree.node(id);
            match &node.kind {
                NodeKind::Constant(value) => Ok(Column::from_scalar(value, node.dtype)),
                NodeKind::StringConstant(units) => Ok(Column::new(
                    Dtype::String,
                    ColumnData::Str(vec![units.clone()]),
                )),
                NodeKind::Variable { index, .. } => {
                    let vars = tree.vars();
                    let (Some(slot), Some(bytes)) = (vars.get(*index), inputs.get(*index)) else {
                        return Err(EvalError::var_mismatch(vars.len(), inputs.len()));
                    };
                    check_input(slot, bytes, n)?;
                    Ok(Column::read(slot.dtype, slot.itemsize, bytes, n).cast(node.dtype))
                }
                NodeKind::Operation { .. } => self.eval_operation(tree, id, inputs, n),
            }
        })
    }
}
