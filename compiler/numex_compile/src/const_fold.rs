//! Constant folding.
//!
//! A pure, non-reducing operation whose children are all constants is
//! evaluated once at compile time and replaced by its value. Folding runs
//! children first, so whole constant subtrees collapse in one pass.
//! Unreachable nodes are dropped afterwards.

use numex_eval::{Evaluator, TreeEvaluator};
use numex_ir::{NodeFlags, NodeId, NodeKind, Tree};

/// Fold constant subtrees of `tree`. Returns how many operations folded.
pub(crate) fn fold_constants(tree: &mut Tree) -> usize {
    if tree.root() == NodeId::INVALID {
        return 0;
    }
    let evaluator = TreeEvaluator::default();
    let mut folded = 0;
    for id in tree.postorder(tree.root()) {
        if !is_foldable(tree, id) {
            continue;
        }
        // Children are constants, so no inputs are read.
        let Ok(column) = evaluator.eval_node(tree, id, &[], 1) else {
            continue;
        };
        let node = tree.node_mut(id);
        let value = column.get(0).cast(node.dtype);
        node.kind = NodeKind::Constant(value);
        node.input_dtype = node.dtype;
        node.flags = NodeFlags::PURE | NodeFlags::ELEMENTWISE;
        folded += 1;
    }
    if folded > 0 {
        tree.compact();
        tracing::trace!(folded, nodes = tree.len(), "folded constants");
    }
    folded
}

fn is_foldable(tree: &Tree, id: NodeId) -> bool {
    let node = tree.node(id);
    if node.is_leaf() || node.dtype.is_string() {
        return false;
    }
    if !node.flags.contains(NodeFlags::PURE) || node.flags.contains(NodeFlags::REDUCTION) {
        return false;
    }
    node.children()
        .iter()
        .all(|c| tree.node(*c).is_constant())
}
