//! Compiled DSL programs.
//!
//! A `Program` is built once by the DSL compiler and executed read-only for
//! every block. Every expression inside it is a complete `Tree` whose
//! variable slots are the program's variable table (as it stood when the
//! statement was compiled).

use std::fmt::Write as _;

use rustc_hash::FxHashMap;

use crate::{Dtype, FreeStats, Geometry, Tree, VarSlot, MAX_DIMS};

/// `# me:fp = ...` pragma.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FpMode {
    Strict,
    Contract,
    /// Allows relaxed-precision transcendental kernels.
    Fast,
}

/// `# me:compiler = ...` pragma. Recorded, but there is no native backend.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CompilerHint {
    Tcc,
    Cc,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct Pragmas {
    pub fp: Option<FpMode>,
    pub compiler: Option<CompilerHint>,
}

/// Reserved geometry identifiers: `_ndim`, `_i<d>`, `_n<d>`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Reserved {
    /// Array rank.
    Ndim,
    /// Global index along a dimension, per element.
    Index(u8),
    /// Array extent along a dimension.
    Shape(u8),
}

impl Reserved {
    /// Recognize a reserved identifier. Dimensions must be below `MAX_DIMS`.
    pub fn parse(name: &str) -> Option<Reserved> {
        if name == "_ndim" {
            return Some(Reserved::Ndim);
        }
        let (make, digits): (fn(u8) -> Reserved, &str) = if let Some(d) = name.strip_prefix("_i") {
            (Reserved::Index, d)
        } else if let Some(d) = name.strip_prefix("_n") {
            (Reserved::Shape, d)
        } else {
            return None;
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let dim: usize = digits.parse().ok()?;
        (dim < MAX_DIMS).then(|| make(dim as u8))
    }

    pub fn name(self) -> String {
        match self {
            Reserved::Ndim => "_ndim".to_string(),
            Reserved::Index(d) => format!("_i{d}"),
            Reserved::Shape(d) => format!("_n{d}"),
        }
    }

    /// Every element of a block sees the same value.
    pub const fn is_uniform(self) -> bool {
        !matches!(self, Reserved::Index(_))
    }

    pub const fn dim(self) -> Option<usize> {
        match self {
            Reserved::Ndim => None,
            Reserved::Index(d) | Reserved::Shape(d) => Some(d as usize),
        }
    }
}

/// Which reserved identifiers a program references (bitmasks by dimension).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct ReservedUse {
    pub ndim: bool,
    pub index: u64,
    pub shape: u64,
}

impl ReservedUse {
    pub fn mark(&mut self, reserved: Reserved) {
        match reserved {
            Reserved::Ndim => self.ndim = true,
            Reserved::Index(d) => self.index |= 1 << d,
            Reserved::Shape(d) => self.shape |= 1 << d,
        }
    }

    #[inline]
    pub fn uses_index(&self) -> bool {
        self.index != 0
    }

    /// Highest referenced dimension plus one.
    pub fn max_dim(&self) -> usize {
        let mask = self.index | self.shape;
        (u64::BITS - mask.leading_zeros()) as usize
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum VarKind {
    /// Caller-supplied buffer, in caller order.
    Input,
    /// DSL-declared local.
    Local,
    Reserved(Reserved),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VarEntry {
    pub name: String,
    pub dtype: Dtype,
    pub itemsize: usize,
    /// Identical across every element position within one block.
    pub uniform: bool,
    pub kind: VarKind,
}

/// Ordered, name-unique variable table: inputs first, then locals and
/// reserved identifiers in declaration order.
#[derive(Clone, Debug, Default)]
pub struct VarTable {
    entries: Vec<VarEntry>,
    index: FxHashMap<String, usize>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Names must be new; an existing name returns its index unchanged.
    pub fn push(&mut self, entry: VarEntry) -> usize {
        if let Some(&existing) = self.index.get(&entry.name) {
            return existing;
        }
        let idx = self.entries.len();
        self.index.insert(entry.name.clone(), idx);
        self.entries.push(entry);
        idx
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> &VarEntry {
        &self.entries[idx]
    }

    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> &mut VarEntry {
        &mut self.entries[idx]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[VarEntry] {
        &self.entries
    }

    /// Input slots for trees compiled against this table.
    pub fn slots(&self) -> Vec<VarSlot> {
        self.entries
            .iter()
            .map(|e| VarSlot {
                name: e.name.clone(),
                dtype: e.dtype,
                itemsize: e.itemsize,
            })
            .collect()
    }
}

/// How a `print` statement lays out its arguments.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PrintFormat {
    /// Literal pieces around each `{}`; one more piece than arguments.
    Template(Vec<String>),
    /// A leading label, then the arguments, joined by spaces.
    Label(String),
    /// Arguments joined by spaces.
    Bare,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Assign {
        var: usize,
        expr: Tree,
    },
    /// A bare expression statement that produces the program output.
    Output {
        expr: Tree,
    },
    /// Assign `result` and stop.
    Return {
        expr: Tree,
    },
    Print {
        format: PrintFormat,
        args: Vec<Tree>,
    },
    For {
        var: usize,
        limit: Tree,
        body: Vec<Stmt>,
    },
    If {
        branches: Vec<(Tree, Vec<Stmt>)>,
        else_body: Option<Vec<Stmt>>,
    },
    Break,
    Continue,
}

impl Stmt {
    fn into_trees(self, out: &mut Vec<Tree>) {
        match self {
            Stmt::Assign { expr, .. } | Stmt::Output { expr } | Stmt::Return { expr } => {
                out.push(expr);
            }
            Stmt::Print { args, .. } => out.extend(args),
            Stmt::For { limit, body, .. } => {
                out.push(limit);
                body.into_iter().for_each(|s| s.into_trees(out));
            }
            Stmt::If {
                branches,
                else_body,
            } => {
                for (cond, body) in branches {
                    out.push(cond);
                    body.into_iter().for_each(|s| s.into_trees(out));
                }
                if let Some(body) = else_body {
                    body.into_iter().for_each(|s| s.into_trees(out));
                }
            }
            Stmt::Break | Stmt::Continue => {}
        }
    }

    fn trees<'a>(&'a self, out: &mut Vec<&'a Tree>) {
        match self {
            Stmt::Assign { expr, .. } | Stmt::Output { expr } | Stmt::Return { expr } => {
                out.push(expr);
            }
            Stmt::Print { args, .. } => out.extend(args),
            Stmt::For { limit, body, .. } => {
                out.push(limit);
                body.iter().for_each(|s| s.trees(out));
            }
            Stmt::If {
                branches,
                else_body,
            } => {
                for (cond, body) in branches {
                    out.push(cond);
                    body.iter().for_each(|s| s.trees(out));
                }
                if let Some(body) = else_body {
                    body.iter().for_each(|s| s.trees(out));
                }
            }
            Stmt::Break | Stmt::Continue => {}
        }
    }
}

/// A compiled DSL program.
#[derive(Clone, Debug)]
pub struct Program {
    /// Function name from the `def` header, if any.
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub vars: VarTable,
    /// Variable-table index to local buffer slot; `None` for inputs and
    /// reserved identifiers.
    pub slots: Vec<Option<usize>>,
    pub n_inputs: usize,
    pub n_locals: usize,
    /// Variable-table index of `result`, when the program assigns it.
    pub result: Option<usize>,
    pub output_dtype: Dtype,
    /// Every output-producing expression is uniform: one value per block.
    pub output_is_scalar: bool,
    pub reserved: ReservedUse,
    pub pragmas: Pragmas,
    pub has_prints: bool,
    pub has_reductions: bool,
    pub geometry: Option<Geometry>,
}

impl Program {
    /// Whether each element can be computed independently of the others,
    /// so a ragged block may be evaluated one contiguous run at a time.
    pub fn is_elementwise_safe(&self) -> bool {
        !self.has_reductions
            && !self.has_prints
            && !self.reserved.uses_index()
            && !self.output_is_scalar
    }

    fn trees(&self) -> Vec<&Tree> {
        let mut out = Vec::new();
        self.body.iter().for_each(|s| s.trees(&mut out));
        out
    }

    /// Release the program and every expression tree it owns.
    pub fn free(self) -> FreeStats {
        let mut trees = Vec::new();
        self.body
            .into_iter()
            .for_each(|s| s.into_trees(&mut trees));
        trees.into_iter().map(Tree::free).fold(
            FreeStats {
                nodes: 0,
                buffers: 0,
            },
            |acc, stats| FreeStats {
                nodes: acc.nodes + stats.nodes,
                buffers: acc.buffers + stats.buffers,
            },
        )
    }

    /// Total nodes across every expression tree.
    pub fn node_count(&self) -> usize {
        self.trees().iter().map(|t| t.len()).sum()
    }

    /// Human-readable listing of the program.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "program {} -> {}{}",
            self.name.as_deref().unwrap_or("<anonymous>"),
            self.output_dtype,
            if self.output_is_scalar { " (scalar)" } else { "" }
        );
        for (idx, entry) in self.vars.entries().iter().enumerate() {
            let slot = self.slots.get(idx).copied().flatten();
            let _ = writeln!(
                out,
                "  var {} : {}{}{}",
                entry.name,
                entry.dtype,
                if entry.uniform { " uniform" } else { "" },
                slot.map(|s| format!(" slot {s}")).unwrap_or_default()
            );
        }
        dump_block(&self.body, &self.vars, 1, &mut out);
        out
    }
}

fn dump_block(body: &[Stmt], vars: &VarTable, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    let tree = |t: &Tree, out: &mut String| {
        for line in t.dump().lines() {
            let _ = writeln!(out, "{pad}  {line}");
        }
    };
    for stmt in body {
        match stmt {
            Stmt::Assign { var, expr } => {
                let _ = writeln!(out, "{pad}assign {}", vars.get(*var).name);
                tree(expr, out);
            }
            Stmt::Output { expr } => {
                let _ = writeln!(out, "{pad}output");
                tree(expr, out);
            }
            Stmt::Return { expr } => {
                let _ = writeln!(out, "{pad}return");
                tree(expr, out);
            }
            Stmt::Print { args, .. } => {
                let _ = writeln!(out, "{pad}print ({} args)", args.len());
            }
            Stmt::For { var, limit, body } => {
                let _ = writeln!(out, "{pad}for {} in range", vars.get(*var).name);
                tree(limit, out);
                dump_block(body, vars, depth + 1, out);
            }
            Stmt::If {
                branches,
                else_body,
            } => {
                for (i, (cond, body)) in branches.iter().enumerate() {
                    let _ = writeln!(out, "{pad}{}", if i == 0 { "if" } else { "elif" });
                    tree(cond, out);
                    dump_block(body, vars, depth + 1, out);
                }
                if let Some(body) = else_body {
                    let _ = writeln!(out, "{pad}else");
                    dump_block(body, vars, depth + 1, out);
                }
            }
            Stmt::Break => {
                let _ = writeln!(out, "{pad}break");
            }
            Stmt::Continue => {
                let _ = writeln!(out, "{pad}continue");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_identifiers_parse() {
        assert_eq!(Reserved::parse("_ndim"), Some(Reserved::Ndim));
        assert_eq!(Reserved::parse("_i0"), Some(Reserved::Index(0)));
        assert_eq!(Reserved::parse("_n12"), Some(Reserved::Shape(12)));
        assert_eq!(Reserved::parse("_i64"), None);
        assert_eq!(Reserved::parse("_ix"), None);
        assert_eq!(Reserved::parse("_i"), None);
        assert_eq!(Reserved::parse("index"), None);
    }

    #[test]
    fn reserved_use_tracks_dims() {
        let mut used = ReservedUse::default();
        assert_eq!(used.max_dim(), 0);
        used.mark(Reserved::Index(2));
        used.mark(Reserved::Shape(0));
        assert!(used.uses_index());
        assert_eq!(used.max_dim(), 3);
    }

    #[test]
    fn var_table_keeps_first_declaration() {
        let mut table = VarTable::new();
        let entry = |name: &str, dtype| VarEntry {
            name: name.to_string(),
            dtype,
            itemsize: dtype.size(),
            uniform: false,
            kind: VarKind::Local,
        };
        assert_eq!(table.push(entry("x", Dtype::Float64)), 0);
        assert_eq!(table.push(entry("y", Dtype::Int64)), 1);
        assert_eq!(table.push(entry("x", Dtype::Int8)), 0);
        assert_eq!(table.get(0).dtype, Dtype::Float64);
        assert_eq!(table.lookup("y"), Some(1));
        assert_eq!(table.len(), 2);
    }
}
