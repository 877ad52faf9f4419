//! Per-operation typing and whole-tree inference.

use numex_ir::{Builtin, Dtype, NodeId, NodeKind, OpKind, ReduceOp, Tree, UnaryOp};

use crate::{float_math_dtype, promote_all};

/// Dtypes of one operation node.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct OpTyping {
    /// User-visible result dtype.
    pub output: Dtype,
    /// Dtype the operands are computed in.
    pub input: Dtype,
}

impl OpTyping {
    fn same(dtype: Dtype) -> Self {
        OpTyping {
            output: dtype,
            input: dtype,
        }
    }
}

/// Output dtype of a reduction over `arg`.
pub fn reduction_output_dtype(op: ReduceOp, arg: Dtype) -> Dtype {
    match op {
        ReduceOp::Any | ReduceOp::All => Dtype::Bool,
        ReduceOp::Mean if arg.is_complex() => Dtype::Complex128,
        ReduceOp::Mean => Dtype::Float64,
        ReduceOp::Sum | ReduceOp::Prod if arg.is_bool() || arg.is_signed() => Dtype::Int64,
        ReduceOp::Sum | ReduceOp::Prod if arg.is_unsigned() => Dtype::UInt64,
        _ => arg,
    }
}

/// Type one operation from its children's dtypes.
///
/// `Convert` carries its target on the node and is typed by the caller;
/// here it passes its operand through.
pub fn op_typing(op: OpKind, children: &[Dtype]) -> OpTyping {
    let first = children.first().copied().unwrap_or(Dtype::Bool);
    match op {
        OpKind::Unary(UnaryOp::Not) => OpTyping {
            output: Dtype::Bool,
            input: first,
        },
        OpKind::Unary(_) | OpKind::Convert => OpTyping::same(first),
        OpKind::Binary(op) => {
            let p = promote_all(children.iter().copied());
            if op.is_comparison() || op.is_logical() {
                OpTyping {
                    output: Dtype::Bool,
                    input: p,
                }
            } else {
                OpTyping::same(p)
            }
        }
        OpKind::Call(builtin) => call_typing(builtin, children),
        OpKind::Reduce(op) => OpTyping {
            output: reduction_output_dtype(op, first),
            input: first,
        },
    }
}

fn call_typing(builtin: Builtin, children: &[Dtype]) -> OpTyping {
    let first = children.first().copied().unwrap_or(Dtype::Bool);
    match builtin {
        Builtin::Where => {
            let p = promote_all(children.iter().skip(1).copied());
            OpTyping::same(p)
        }
        Builtin::StartsWith | Builtin::EndsWith | Builtin::Contains => OpTyping {
            output: Dtype::Bool,
            input: Dtype::String,
        },
        Builtin::CastInt => OpTyping {
            output: Dtype::Int64,
            input: first,
        },
        Builtin::CastFloat => OpTyping {
            output: Dtype::Float64,
            input: first,
        },
        Builtin::CastBool => OpTyping {
            output: Dtype::Bool,
            input: first,
        },
        Builtin::Abs | Builtin::Real | Builtin::Imag => OpTyping {
            output: first.complex_component().unwrap_or(first),
            input: first,
        },
        b if b.is_float_math() => OpTyping::same(float_math_dtype(promote_all(
            children.iter().copied(),
        ))),
        _ => OpTyping::same(first),
    }
}

/// User-visible dtype of the subtree at `id`.
///
/// Comparisons and logical operators are `bool`; everything else follows
/// [`op_typing`] from the leaves up.
pub fn infer_output_type(tree: &Tree, id: NodeId) -> Dtype {
    numex_stack::ensure_sufficient_stack(|| {
        let node = tree.node(id);
        match &node.kind {
            NodeKind::Operation {
                op: OpKind::Convert,
                ..
            }
            | NodeKind::Constant(_)
            | NodeKind::StringConstant(_)
            | NodeKind::Variable { .. } => node.dtype,
            NodeKind::Operation { op, children } => {
                let child_types: Vec<Dtype> = children
                    .iter()
                    .map(|c| infer_output_type(tree, *c))
                    .collect();
                op_typing(*op, &child_types).output
            }
        }
    })
}

/// Internal computation dtype of the subtree at `id`.
///
/// Unlike [`infer_output_type`], comparisons and logical operators report
/// the promoted operand dtype they compute in.
pub fn infer_result_type(tree: &Tree, id: NodeId) -> Dtype {
    numex_stack::ensure_sufficient_stack(|| {
        let node = tree.node(id);
        match &node.kind {
            NodeKind::Operation {
                op: OpKind::Convert,
                ..
            }
            | NodeKind::Constant(_)
            | NodeKind::StringConstant(_)
            | NodeKind::Variable { .. } => node.dtype,
            NodeKind::Operation { op, children } => {
                let child_types: Vec<Dtype> = children
                    .iter()
                    .map(|c| infer_result_type(tree, *c))
                    .collect();
                let typing = op_typing(*op, &child_types);
                match op {
                    OpKind::Binary(b) if b.is_comparison() || b.is_logical() => typing.input,
                    _ => typing.output,
                }
            }
        }
    })
}
