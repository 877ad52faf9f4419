//! Syntax tree to typed expression tree.
//!
//! Resolves names against the variable slots, types literals, types every
//! operation with [`op_typing`] and inserts conversion nodes around binary
//! operands. The result still needs validation and folding.

use numex_diagnostic::CompileError;
use numex_ir::{
    BinaryOp, Callee, Dtype, Node, NodeFlags, NodeId, NodeKind, OpKind, Ownership, Scalar, Tree,
    UnaryOp, VarAddress, VarSlot,
};
use numex_parse::{Expr, ExprKind, Span};
use numex_stack::ensure_sufficient_stack;
use numex_types::op_typing;
use smallvec::SmallVec;

/// How numeric literals are typed.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct Literals {
    /// Integer literals in int32 range take this dtype when it is an
    /// integer type.
    pub target: Dtype,
    /// Every numeric literal takes this dtype.
    pub forced: Option<Dtype>,
}

impl Literals {
    /// Literal typing for an expression compiled with `requested` output.
    /// An `auto` request targets `first_var`, the first variable's dtype.
    /// A float or complex target forces every numeric literal to it.
    pub(crate) fn for_request(requested: Dtype, first_var: Option<Dtype>) -> Self {
        let target = if requested.is_auto() {
            first_var.unwrap_or(Dtype::Auto)
        } else {
            requested
        };
        let forced = (target.is_float() || target.is_complex()).then_some(target);
        Literals { target, forced }
    }

    fn int(self, value: u64) -> Dtype {
        if let Some(dtype) = self.forced {
            dtype
        } else if value > i64::MAX as u64 {
            Dtype::UInt64
        } else if value > i32::MAX as u64 {
            Dtype::Int64
        } else if self.target.is_integer() {
            self.target
        } else {
            Dtype::Int32
        }
    }

    fn float(self) -> Dtype {
        self.forced.unwrap_or(Dtype::Float64)
    }
}

pub(crate) struct Lowerer<'a> {
    bindings: &'a [VarAddress],
    literals: Literals,
    tree: Tree,
}

impl<'a> Lowerer<'a> {
    /// `bindings[i]` is the address of `vars[i]`.
    pub(crate) fn new(vars: Vec<VarSlot>, bindings: &'a [VarAddress], literals: Literals) -> Self {
        Lowerer {
            bindings,
            literals,
            tree: Tree::new(vars),
        }
    }

    /// Lower `expr` and make it the root.
    pub(crate) fn lower(mut self, expr: &Expr) -> Result<Tree, CompileError> {
        let root = self.lower_expr(expr)?;
        self.tree.set_root(root);
        Ok(self.tree)
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<NodeId, CompileError> {
        ensure_sufficient_stack(|| match &expr.kind {
            ExprKind::Int(value) => {
                let dtype = self.literals.int(*value);
                Ok(self.constant(Scalar::UInt(*value), dtype))
            }
            ExprKind::Float(value) => {
                let dtype = self.literals.float();
                Ok(self.constant(Scalar::Float(*value), dtype))
            }
            ExprKind::Str(text) => {
                let units = text.chars().map(u32::from).collect();
                Ok(self
                    .tree
                    .push(Node::new(NodeKind::StringConstant(units), Dtype::String)))
            }
            ExprKind::Name(name) => self.lower_name(name, expr.span),
            ExprKind::Unary { op, operand } => {
                let operand = self.lower_expr(operand)?;
                Ok(self.operation(OpKind::Unary(*op), &[operand]))
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                Ok(self.binary(*op, left, right))
            }
            ExprKind::Call {
                name,
                name_span,
                args,
            } => self.lower_call(name, *name_span, args),
        })
    }

    fn lower_name(&mut self, name: &str, span: Span) -> Result<NodeId, CompileError> {
        if let Some(index) = self.tree.vars().iter().position(|v| v.name == name) {
            let dtype = self.tree.vars()[index].dtype;
            let binding = self.bindings[index];
            return Ok(self
                .tree
                .push(Node::new(NodeKind::Variable { index, binding }, dtype)));
        }
        match numex_ir::lookup_callee(name) {
            Some(Callee::Constant(value)) => {
                let dtype = self.literals.float();
                Ok(self.constant(Scalar::Float(value), dtype))
            }
            _ => Err(CompileError::parse(
                span.start as usize + 1,
                format!("unknown identifier `{name}`"),
            )),
        }
    }

    fn lower_call(
        &mut self,
        name: &str,
        name_span: Span,
        args: &[Expr],
    ) -> Result<NodeId, CompileError> {
        let offset = name_span.start as usize + 1;
        let Some(callee) = numex_ir::lookup_callee(name) else {
            return Err(CompileError::parse(offset, format!("unknown function `{name}`")));
        };
        if args.len() != callee.arity() {
            return Err(CompileError::parse(
                offset,
                format!(
                    "`{name}` takes {} argument{}, {} given",
                    callee.arity(),
                    if callee.arity() == 1 { "" } else { "s" },
                    args.len()
                ),
            ));
        }
        let mut children = SmallVec::<[NodeId; 7]>::new();
        for arg in args {
            children.push(self.lower_expr(arg)?);
        }
        Ok(match callee {
            Callee::Constant(value) => {
                let dtype = self.literals.float();
                self.constant(Scalar::Float(value), dtype)
            }
            Callee::Binary(op) => self.binary(op, children[0], children[1]),
            Callee::Reduce(op) => self.operation(OpKind::Reduce(op), &children),
            Callee::Builtin(builtin) => self.operation(OpKind::Call(builtin), &children),
        })
    }

    fn constant(&mut self, value: Scalar, dtype: Dtype) -> NodeId {
        self.tree
            .push(Node::new(NodeKind::Constant(value.cast(dtype)), dtype))
    }

    /// An operation node typed from its children.
    fn operation(&mut self, op: OpKind, children: &[NodeId]) -> NodeId {
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
        node.flags = flags_for(op);
        self.tree.push(node)
    }

    /// Promote both operands and wrap computed ones in conversions.
    fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        let id = self.operation(OpKind::Binary(op), &[left, right]);
        let input = self.tree.node(id).input_dtype;
        let left = self.convert(left, input);
        let right = self.convert(right, input);
        if let NodeKind::Operation { children, .. } = &mut self.tree.node_mut(id).kind {
            children[0] = left;
            children[1] = right;
        }
        id
    }

    /// `child` as `dtype`. Leaves are coerced at evaluation instead.
    fn convert(&mut self, child: NodeId, dtype: Dtype) -> NodeId {
        let node = self.tree.node(child);
        if node.is_leaf() || node.dtype == dtype {
            return child;
        }
        let mut conversion = Node::new(
            NodeKind::Operation {
                op: OpKind::Convert,
                children: SmallVec::from_slice(&[child]),
            },
            dtype,
        );
        conversion.input_dtype = node.dtype;
        self.tree.push(conversion)
    }
}

fn flags_for(op: OpKind) -> NodeFlags {
    match op {
        OpKind::Reduce(_) => NodeFlags::PURE | NodeFlags::REDUCTION,
        OpKind::Binary(b) if b.is_comparison() => {
            NodeFlags::PURE | NodeFlags::ELEMENTWISE | NodeFlags::COMPARISON
        }
        OpKind::Binary(b) if b.is_logical() => {
            NodeFlags::PURE | NodeFlags::ELEMENTWISE | NodeFlags::LOGICAL
        }
        OpKind::Unary(UnaryOp::Not) => NodeFlags::PURE | NodeFlags::ELEMENTWISE | NodeFlags::LOGICAL,
        _ => NodeFlags::PURE | NodeFlags::ELEMENTWISE,
    }
}

/// Let an operation write its first operand's result straight into its own
/// output when both have the same dtype.
pub(crate) fn assign_aliases(tree: &mut Tree) {
    if tree.root() == NodeId::INVALID {
        return;
    }
    for parent in tree.preorder(tree.root()) {
        let node = tree.node(parent);
        let Some(op) = node.op() else {
            continue;
        };
        if matches!(op, OpKind::Reduce(_)) || node.input_dtype != node.dtype {
            continue;
        }
        let dtype = node.dtype;
        let Some(&first) = node.children().first() else {
            continue;
        };
        let child = tree.node(first);
        let aliasable = !child.is_leaf()
            && child.dtype == dtype
            && !child.flags.contains(NodeFlags::REDUCTION);
        if aliasable {
            tree.node_mut(first).ownership = Ownership::AliasOf(parent);
        }
    }
}
