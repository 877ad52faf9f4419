//! Root reductions read straight out of a padded block.
//!
//! When the reduced argument is a bare variable, or a comparison between a
//! variable and a constant, each valid element can be folded as it is read
//! without gathering the block first.

use std::cmp::Ordering;

use numex_diagnostic::EvalError;
use numex_eval::Reducer;
use numex_ir::{BinaryOp, BlockLayout, Dtype, NodeId, NodeKind, OpKind, ReduceOp, Scalar, Tree};

/// A reduction argument the strided reducer can evaluate per element.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum StridedArg {
    Var {
        index: usize,
    },
    /// `var <op> constant`, or the mirror image when `var_on_left` is false.
    Compare {
        op: BinaryOp,
        index: usize,
        constant: Scalar,
        var_on_left: bool,
        /// Dtype both sides are compared in.
        input: Dtype,
    },
}

impl StridedArg {
    pub(crate) fn detect(tree: &Tree, arg: NodeId) -> Option<Self> {
        let node = tree.node(arg);
        match &node.kind {
            NodeKind::Variable { index, .. } => Some(StridedArg::Var { index: *index }),
            NodeKind::Operation {
                op: OpKind::Binary(op),
                children,
            } if op.is_comparison() => {
                let left = &tree.node(children[0]).kind;
                let right = &tree.node(children[1]).kind;
                let (index, constant, var_on_left) = match (left, right) {
                    (NodeKind::Variable { index, .. }, NodeKind::Constant(c)) => (*index, c, true),
                    (NodeKind::Constant(c), NodeKind::Variable { index, .. }) => (*index, c, false),
                    _ => return None,
                };
                Some(StridedArg::Compare {
                    op: *op,
                    index,
                    constant: constant.cast(node.input_dtype),
                    var_on_left,
                    input: node.input_dtype,
                })
            }
            _ => None,
        }
    }

    fn var(&self) -> usize {
        match self {
            StridedArg::Var { index } | StridedArg::Compare { index, .. } => *index,
        }
    }

    fn value(&self, element: Scalar) -> Scalar {
        match self {
            StridedArg::Var { .. } => element,
            StridedArg::Compare {
                op,
                constant,
                var_on_left,
                input,
                ..
            } => {
                let element = element.cast(*input);
                let (a, b) = if *var_on_left {
                    (&element, constant)
                } else {
                    (constant, &element)
                };
                Scalar::Bool(compare(*op, a, b))
            }
        }
    }

    /// Fold every valid element of the block in row-major order.
    ///
    /// `arg_dtype` is the dtype of the reduced argument.
    pub(crate) fn reduce(
        &self,
        tree: &Tree,
        op: ReduceOp,
        arg_dtype: Dtype,
        inputs: &[&[u8]],
        layout: &BlockLayout,
    ) -> Result<Scalar, EvalError> {
        let index = self.var();
        let (Some(slot), Some(bytes)) = (tree.vars().get(index), inputs.get(index)) else {
            return Err(EvalError::var_mismatch(tree.vars().len(), inputs.len()));
        };
        let itemsize = slot.itemsize;
        let strides = layout.strides();
        let mut reducer = Reducer::new(op, arg_dtype);
        layout.for_each_valid_coord(|coord| {
            if reducer.is_decided() {
                return;
            }
            let at: usize = coord.iter().zip(&strides).map(|(c, s)| *c as usize * s).sum();
            let element = Scalar::read(slot.dtype, &bytes[at * itemsize..(at + 1) * itemsize]);
            reducer.push(&self.value(element));
        });
        Ok(reducer.finish())
    }
}

fn compare(op: BinaryOp, a: &Scalar, b: &Scalar) -> bool {
    let ordering = match (a, b) {
        (Scalar::Bool(x), Scalar::Bool(y)) => x.partial_cmp(y),
        (Scalar::Int(x), Scalar::Int(y)) => x.partial_cmp(y),
        (Scalar::UInt(x), Scalar::UInt(y)) => x.partial_cmp(y),
        (Scalar::Float(x), Scalar::Float(y)) => x.partial_cmp(y),
        (Scalar::Str(x), Scalar::Str(y)) => x.partial_cmp(y),
        _ => None,
    };
    match op {
        BinaryOp::Eq => ordering == Some(Ordering::Equal),
        BinaryOp::Ne => ordering != Some(Ordering::Equal),
        BinaryOp::Lt => ordering == Some(Ordering::Less),
        BinaryOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Gt => ordering == Some(Ordering::Greater),
        BinaryOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
