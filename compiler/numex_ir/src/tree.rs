//! Arena-allocated typed expression trees.
//!
//! A `Tree` owns every node in one `Vec`; nodes refer to their children by
//! `NodeId`. Freeing the tree releases each node exactly once. Traversals
//! here are iterative so arbitrarily deep trees cannot overflow the stack.

use std::fmt::{self, Write as _};

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{Dtype, Geometry, OpKind, ReduceOp, Scalar, VarAddress};

/// Index into a tree's node arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel for a tree whose root has not been set.
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Per-node evaluation properties.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        /// No side effects; may be constant folded.
        const PURE = 1 << 0;
        /// Output element `i` depends only on input elements `i`.
        const ELEMENTWISE = 1 << 1;
        /// The node is a reduction.
        const REDUCTION = 1 << 2;
        const COMPARISON = 1 << 3;
        const LOGICAL = 1 << 4;
    }
}

/// Who owns a node's output buffer.
///
/// `AliasOf(parent)` marks a child whose result is written in place into
/// its parent's output rather than a separate allocation.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Ownership {
    #[default]
    Owned,
    AliasOf(NodeId),
}

#[derive(Clone, PartialEq, Debug)]
pub enum NodeKind {
    Constant(Scalar),
    /// UCS-4 code units.
    StringConstant(Vec<u32>),
    /// Input number `index`, bound to `binding`.
    Variable { index: usize, binding: VarAddress },
    Operation {
        op: OpKind,
        children: SmallVec<[NodeId; 7]>,
    },
}

#[derive(Clone, PartialEq, Debug)]
pub struct Node {
    pub kind: NodeKind,
    /// Output dtype.
    pub dtype: Dtype,
    /// Dtype operands are computed in. Differs from `dtype` for
    /// comparisons, logical operators and conversion nodes.
    pub input_dtype: Dtype,
    pub flags: NodeFlags,
    pub ownership: Ownership,
}

impl Node {
    pub fn new(kind: NodeKind, dtype: Dtype) -> Self {
        Node {
            kind,
            dtype,
            input_dtype: dtype,
            flags: NodeFlags::PURE | NodeFlags::ELEMENTWISE,
            ownership: Ownership::Owned,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        !matches!(self.kind, NodeKind::Operation { .. })
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, NodeKind::Constant(_) | NodeKind::StringConstant(_))
    }

    pub fn op(&self) -> Option<OpKind> {
        match &self.kind {
            NodeKind::Operation { op, .. } => Some(*op),
            _ => None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Operation { children, .. } => children,
            _ => &[],
        }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.children().len()
    }
}

/// Dtype and width of one input slot, in binding order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VarSlot {
    pub name: String,
    pub dtype: Dtype,
    pub itemsize: usize,
}

/// What [`Tree::free`] released.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct FreeStats {
    pub nodes: usize,
    /// Operation outputs with their own buffer (not aliased into a parent).
    pub buffers: usize,
}

#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    vars: Vec<VarSlot>,
    output_dtype: Dtype,
    geometry: Option<Geometry>,
}

impl Tree {
    pub fn new(vars: Vec<VarSlot>) -> Self {
        Tree {
            nodes: Vec::new(),
            root: NodeId::INVALID,
            vars,
            output_dtype: Dtype::Auto,
            geometry: None,
        }
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn vars(&self) -> &[VarSlot] {
        &self.vars
    }

    pub fn output_dtype(&self) -> Dtype {
        self.output_dtype
    }

    pub fn set_output_dtype(&mut self, dtype: Dtype) {
        self.output_dtype = dtype;
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = Some(geometry);
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes of the subtree at `from`, parents before children.
    pub fn preorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    /// Nodes of the subtree at `from`, children before parents.
    pub fn postorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = self.preorder_mirrored(from);
        order.reverse();
        order
    }

    // Pre-order visiting children right to left; reversed it is a
    // left-to-right post-order.
    fn preorder_mirrored(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter());
        }
        order
    }

    /// Whether any node in the subtree at `from` is a reduction.
    pub fn contains_reduction(&self, from: NodeId) -> bool {
        self.preorder(from)
            .into_iter()
            .any(|id| self.node(id).flags.contains(NodeFlags::REDUCTION))
    }

    pub fn has_reductions(&self) -> bool {
        self.root != NodeId::INVALID && self.contains_reduction(self.root)
    }

    /// The reduction at the root, with its argument.
    pub fn root_reduction(&self) -> Option<(ReduceOp, NodeId)> {
        let root = self.node(self.root);
        match (&root.kind, root.op()) {
            (NodeKind::Operation { children, .. }, Some(OpKind::Reduce(op))) => {
                Some((op, children[0]))
            }
            _ => None,
        }
    }

    /// A tree whose root is a reduction produces one value, not `n`.
    pub fn is_scalar_output(&self) -> bool {
        self.root_reduction().is_some()
    }

    /// Number of nodes reachable from the root.
    pub fn reachable(&self) -> usize {
        if self.root == NodeId::INVALID {
            return 0;
        }
        self.preorder(self.root).len()
    }

    /// Drop nodes unreachable from the root and renumber the rest.
    ///
    /// Children keep lower ids than their parents afterwards.
    pub fn compact(&mut self) {
        if self.root == NodeId::INVALID {
            self.nodes.clear();
            return;
        }
        let order = self.postorder(self.root);
        let mut remap = vec![NodeId::INVALID; self.nodes.len()];
        for (new, old) in order.iter().enumerate() {
            remap[old.index()] = NodeId::new(new as u32);
        }

        let mut old_nodes: Vec<Option<Node>> = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(Some)
            .collect();
        let mut nodes = Vec::with_capacity(order.len());
        for old in &order {
            let Some(mut node) = old_nodes[old.index()].take() else {
                continue;
            };
            if let NodeKind::Operation { children, .. } = &mut node.kind {
                for child in children.iter_mut() {
                    *child = remap[child.index()];
                }
            }
            if let Ownership::AliasOf(parent) = node.ownership {
                node.ownership = Ownership::AliasOf(remap[parent.index()]);
            }
            nodes.push(node);
        }
        self.nodes = nodes;
        self.root = remap[self.root.index()];
    }

    /// Release the tree, reporting what was freed.
    pub fn free(self) -> FreeStats {
        let buffers = self
            .nodes
            .iter()
            .filter(|n| !n.is_leaf() && n.ownership == Ownership::Owned)
            .count();
        FreeStats {
            nodes: self.nodes.len(),
            buffers,
        }
    }

    /// Indented, one-node-per-line rendering of the tree.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if self.root == NodeId::INVALID {
            return out;
        }
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            let _ = write!(out, "{:indent$}", "", indent = depth * 2);
            match &node.kind {
                NodeKind::Constant(value) => {
                    let _ = write!(out, "const {value}");
                }
                NodeKind::StringConstant(units) => {
                    let _ = write!(out, "const \"{}\"", Scalar::Str(units.clone()));
                }
                NodeKind::Variable { index, .. } => {
                    let name = self.vars.get(*index).map_or("?", |v| v.name.as_str());
                    let _ = write!(out, "var {name}");
                }
                NodeKind::Operation { op, .. } => {
                    let _ = write!(out, "{op}");
                    if node.input_dtype != node.dtype {
                        let _ = write!(out, " [{}]", node.input_dtype);
                    }
                }
            }
            let _ = writeln!(out, " : {}", node.dtype);
            for child in node.children().iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests;
