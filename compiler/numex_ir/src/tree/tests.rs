use super::*;
use crate::{synthetic_address, BinaryOp, ReduceOp};
use pretty_assertions::assert_eq;
use smallvec::smallvec;

fn var_slot(name: &str) -> VarSlot {
    VarSlot {
        name: name.to_string(),
        dtype: Dtype::Float64,
        itemsize: 8,
    }
}

fn var(tree: &mut Tree, index: usize) -> NodeId {
    tree.push(Node::new(
        NodeKind::Variable {
            index,
            binding: synthetic_address(index),
        },
        Dtype::Float64,
    ))
}

fn binary(tree: &mut Tree, op: BinaryOp, l: NodeId, r: NodeId) -> NodeId {
    tree.push(Node::new(
        NodeKind::Operation {
            op: OpKind::Binary(op),
            children: smallvec![l, r],
        },
        Dtype::Float64,
    ))
}

/// `a + b * 2`
fn sample() -> Tree {
    let mut tree = Tree::new(vec![var_slot("a"), var_slot("b")]);
    let a = var(&mut tree, 0);
    let b = var(&mut tree, 1);
    let two = tree.push(Node::new(
        NodeKind::Constant(Scalar::Float(2.0)),
        Dtype::Float64,
    ));
    let mul = binary(&mut tree, BinaryOp::Mul, b, two);
    let add = binary(&mut tree, BinaryOp::Add, a, mul);
    tree.set_root(add);
    tree
}

#[test]
fn preorder_visits_parents_first() {
    let tree = sample();
    let order: Vec<usize> = tree.preorder(tree.root()).iter().map(|id| id.index()).collect();
    assert_eq!(order, vec![4, 0, 3, 1, 2]);
}

#[test]
fn postorder_visits_children_first() {
    let tree = sample();
    let order: Vec<usize> = tree.postorder(tree.root()).iter().map(|id| id.index()).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[test]
fn compact_drops_orphans() {
    let mut tree = sample();
    // replace the root with its right child; `a` and the add become orphans
    let mul = tree.children(tree.root())[1];
    tree.set_root(mul);
    tree.compact();
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.reachable(), 3);
    assert_eq!(tree.root(), NodeId::new(2));
}

#[test]
fn free_releases_every_node_once() {
    let tree = sample();
    let reachable = tree.reachable();
    let stats = tree.free();
    assert_eq!(stats.nodes, reachable);
    assert_eq!(stats.buffers, 2);
}

#[test]
fn aliased_children_do_not_own_buffers() {
    let mut tree = sample();
    let mul = tree.children(tree.root())[1];
    let root = tree.root();
    tree.node_mut(mul).ownership = Ownership::AliasOf(root);
    assert_eq!(tree.free().buffers, 1);
}

#[test]
fn root_reduction_is_detected() {
    let mut tree = Tree::new(vec![var_slot("x")]);
    let x = var(&mut tree, 0);
    let mut node = Node::new(
        NodeKind::Operation {
            op: OpKind::Reduce(ReduceOp::Sum),
            children: smallvec![x],
        },
        Dtype::Float64,
    );
    node.flags |= NodeFlags::REDUCTION;
    let sum = tree.push(node);
    tree.set_root(sum);
    assert_eq!(tree.root_reduction(), Some((ReduceOp::Sum, x)));
    assert!(tree.is_scalar_output());
    assert!(tree.has_reductions());
    assert!(!sample().has_reductions());
}

#[test]
fn dump_indents_children() {
    let tree = sample();
    assert_eq!(
        tree.dump(),
        "+ : float64\n  var a : float64\n  * : float64\n    var b : float64\n    const 2 : float64\n"
    );
}
