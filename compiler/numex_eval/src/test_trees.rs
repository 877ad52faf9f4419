//! Hand-built typed trees for unit tests.

use numex_ir::{
    synthetic_address, BinaryOp, Builtin, Dtype, Node, NodeFlags, NodeId, NodeKind, OpKind,
    ReduceOp, Scalar, Tree, UnaryOp, VarSlot,
};
use numex_types::op_typing;
use smallvec::SmallVec;

pub(crate) struct TreeBuilder {
    tree: Tree,
}

impl TreeBuilder {
    pub(crate) fn new(vars: &[(&str, Dtype)]) -> Self {
        let slots = vars
            .iter()
            .map(|(name, dtype)| VarSlot {
                name: (*name).to_string(),
                dtype: *dtype,
                itemsize: dtype.size(),
            })
            .collect();
        TreeBuilder {
            tree: Tree::new(slots),
        }
    }

    pub(crate) fn var(&mut self, index: usize) -> NodeId {
        let dtype = self.tree.vars()[index].dtype;
        self.tree.push(Node::new(
            NodeKind::Variable {
                index,
                binding: synthetic_address(index),
            },
            dtype,
        ))
    }

    pub(crate) fn constant(&mut self, value: Scalar, dtype: Dtype) -> NodeId {
        self.tree.push(Node::new(NodeKind::Constant(value.cast(dtype)), dtype))
    }

    fn op(&mut self, op: OpKind, children: &[NodeId]) -> NodeId {
        let dtypes: Vec<Dtype> = children.iter().map(|c| self.tree.node(*c).dtype).collect();
        let typing = op_typing(op, &dtypes);
        let mut node = Node::new(
            NodeKind::Operation {
                op,
                children: SmallVec::from_slice(children),
            },
            typing.output,
        );
        node.input_dtype = typing.input;
        if let OpKind::Reduce(_) = op {
            node.flags = NodeFlags::REDUCTION;
        }
        self.tree.push(node)
    }

    pub(crate) fn unary(&mut self, op: UnaryOp, arg: NodeId) -> NodeId {
        self.op(OpKind::Unary(op), &[arg])
    }

    pub(crate) fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.op(OpKind::Binary(op), &[left, right])
    }

    pub(crate) fn call(&mut self, builtin: Builtin, args: &[NodeId]) -> NodeId {
        self.op(OpKind::Call(builtin), args)
    }

    pub(crate) fn reduce(&mut self, op: ReduceOp, arg: NodeId) -> NodeId {
        self.op(OpKind::Reduce(op), &[arg])
    }

    pub(crate) fn finish(mut self, root: NodeId) -> Tree {
        let dtype = self.tree.node(root).dtype;
        self.tree.set_root(root);
        self.tree.set_output_dtype(dtype);
        self.tree
    }
}

pub(crate) fn bytes_f64(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

pub(crate) fn bytes_i32(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

pub(crate) fn bytes_i64(values: &[i64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

pub(crate) fn f64s(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|c| f64::from_ne_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect()
}

pub(crate) fn i32s(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

pub(crate) fn i64s(bytes: &[u8]) -> Vec<i64> {
    bytes
        .chunks_exact(8)
        .map(|c| i64::from_ne_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect()
}
