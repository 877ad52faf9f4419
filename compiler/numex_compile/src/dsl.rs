//! DSL program compiler.
//!
//! Turns a parsed [`DslProgram`] into a [`Program`]: a typed variable
//! table (inputs, then reserved geometry identifiers, then locals in
//! first-use order) and statements whose expressions are complete trees.
//!
//! Control flow, loop bounds and `print` run once per evaluated block, so
//! their expressions must be *uniform*: the same at every element position.
//! A local is uniform when every assignment to it is. That is decided by
//! compiling the body until no local loses uniformity.

mod reserved;

use rustc_hash::FxHashSet;

use numex_diagnostic::{CompileError, CompileErrorKind};
use numex_ir::{
    synthetic_address, Dtype, Geometry, NodeFlags, NodeId, NodeKind, PrintFormat, Program,
    Reserved, ReservedUse, Stmt, Tree, VarAddress, VarDesc, VarEntry, VarKind, VarTable, MAX_NESTING,
    MAX_VARS,
};
use numex_parse::dsl::{parse_program, DslProgram, DslStmt, DslStmtKind, ExprText};
use numex_parse::{parse_expr, ExprKind};
use numex_stack::ensure_sufficient_stack;

use crate::expr::{build_tree, resolve_vars};
use crate::lower::Literals;

/// Name of the variable that holds the program output.
const RESULT: &str = "result";

/// Compile DSL `source` against the caller's input variables.
#[tracing::instrument(level = "trace", skip(source, vars), fields(nvars = vars.len()))]
pub fn compile_program(
    source: &str,
    vars: &[VarDesc],
    dtype: Dtype,
) -> Result<Program, CompileError> {
    let parsed = parse_program(source)?;
    check_params(&parsed, vars)?;
    let (slots, _) = resolve_vars(vars, dtype)?;

    let mut inputs = VarTable::new();
    for slot in slots {
        inputs.push(VarEntry {
            name: slot.name,
            dtype: slot.dtype,
            itemsize: slot.itemsize,
            uniform: false,
            kind: VarKind::Input,
        });
    }
    let n_inputs = inputs.len();
    let mut reserved = ReservedUse::default();
    for found in reserved::scan(&parsed.body) {
        if inputs.lookup(&found.name()).is_none() {
            reserved.mark(found);
            inputs.push(VarEntry {
                name: found.name(),
                dtype: Dtype::Int64,
                itemsize: Dtype::Int64.size(),
                uniform: found.is_uniform(),
                kind: VarKind::Reserved(found),
            });
        }
    }

    let literals = Literals::for_request(dtype, inputs.entries().first().map(|e| e.dtype));
    let mut varying: FxHashSet<String> = FxHashSet::default();
    let mut passes = 0;
    let (compiler, body) = loop {
        passes += 1;
        let mut compiler = DslCompiler {
            vars: inputs.clone(),
            varying,
            discovered: Vec::new(),
            literals,
            requested: dtype,
            loop_depth: 0,
            outputs: Outputs::default(),
            has_prints: false,
            has_reductions: false,
        };
        let body = compiler.block(&parsed.body, 0)?;
        if compiler.discovered.is_empty() {
            break (compiler, body);
        }
        varying = compiler.varying;
        varying.extend(compiler.discovered);
    };
    tracing::debug!(
        passes,
        varying = compiler.varying.len(),
        "resolved local uniformity"
    );

    let outputs = compiler.outputs;
    let output_dtype = outputs.output_dtype(dtype).ok_or_else(|| {
        CompileError::dsl(1, 1, "program produces no output; assign `result` or end with an expression")
    })?;
    if output_dtype.is_string() {
        return Err(CompileError::invalid_arg_type("a program cannot produce string output"));
    }

    let vars = compiler.vars;
    let mut slots = Vec::with_capacity(vars.len());
    let mut n_locals = 0;
    for entry in vars.entries() {
        if entry.kind == VarKind::Local {
            slots.push(Some(n_locals));
            n_locals += 1;
        } else {
            slots.push(None);
        }
    }

    let program = Program {
        name: parsed.name,
        body,
        result: vars.lookup(RESULT).filter(|&r| vars.get(r).kind == VarKind::Local),
        vars,
        slots,
        n_inputs,
        n_locals,
        output_dtype,
        output_is_scalar: outputs.all_uniform,
        reserved,
        pragmas: parsed.pragmas,
        has_prints: compiler.has_prints,
        has_reductions: compiler.has_reductions,
        geometry: None,
    };
    tracing::debug!(
        name = program.name.as_deref().unwrap_or("<anonymous>"),
        n_inputs,
        n_locals,
        output = %program.output_dtype,
        scalar = program.output_is_scalar,
        "compiled DSL program"
    );
    Ok(program)
}

/// [`compile_program`] with chunk/block geometry attached.
pub fn compile_program_nd(
    source: &str,
    vars: &[VarDesc],
    dtype: Dtype,
    shape: &[u64],
    chunkshape: &[u64],
    blockshape: &[u64],
) -> Result<Program, CompileError> {
    let geometry = Geometry::new(shape, chunkshape, blockshape)?;
    let mut program = compile_program(source, vars, dtype)?;
    program.geometry = Some(geometry);
    Ok(program)
}

/// `def` parameters must name the supplied variables one to one.
fn check_params(parsed: &DslProgram, vars: &[VarDesc]) -> Result<(), CompileError> {
    if parsed.name.is_none() {
        return Ok(());
    }
    for param in &parsed.params {
        if !vars.iter().any(|v| v.name == param.name) {
            return Err(CompileError::dsl(
                param.line,
                param.column,
                format!("parameter `{}` is not a supplied variable", param.name),
            ));
        }
    }
    if let Some(var) = vars
        .iter()
        .find(|v| !parsed.params.iter().any(|p| p.name == v.name))
    {
        let (line, column) = parsed.params.first().map_or((1, 1), |p| (p.line, p.column));
        return Err(CompileError::dsl(
            line,
            column,
            format!("variable `{}` is not a parameter of the function", var.name),
        ));
    }
    Ok(())
}

/// Output-producing statements seen so far.
#[derive(Default)]
struct Outputs {
    /// Dtype of the first `result` assignment or `return`.
    result_dtype: Option<Dtype>,
    /// Dtype of the bare expression statement.
    bare_dtype: Option<Dtype>,
    all_uniform: bool,
    any: bool,
}

impl Outputs {
    fn record(&mut self, uniform: bool) {
        self.all_uniform = if self.any { self.all_uniform && uniform } else { uniform };
        self.any = true;
    }

    fn output_dtype(&self, requested: Dtype) -> Option<Dtype> {
        let inferred = self.result_dtype.or(self.bare_dtype)?;
        Some(if requested.is_auto() { inferred } else { requested })
    }
}

struct DslCompiler {
    vars: VarTable,
    /// Locals known to differ between element positions.
    varying: FxHashSet<String>,
    /// Locals found non-uniform in this pass that were assumed uniform.
    discovered: Vec<String>,
    literals: Literals,
    requested: Dtype,
    loop_depth: usize,
    outputs: Outputs,
    has_prints: bool,
    has_reductions: bool,
}

impl DslCompiler {
    fn block(&mut self, stmts: &[DslStmt], depth: usize) -> Result<Vec<Stmt>, CompileError> {
        if depth > MAX_NESTING {
            let (line, column) = stmts.first().map_or((1, 1), |s| (s.line, s.column));
            return Err(CompileError::dsl(line, column, "too many nested blocks"));
        }
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            out.push(ensure_sufficient_stack(|| self.stmt(stmt, depth))?);
        }
        Ok(out)
    }

    fn stmt(&mut self, stmt: &DslStmt, depth: usize) -> Result<Stmt, CompileError> {
        let here = |message: String| CompileError::dsl(stmt.line, stmt.column, message);
        match &stmt.kind {
            DslStmtKind::Assign { name, value } => {
                let expr = self.expr(value, Dtype::Auto)?;
                let uniform = self.is_uniform(&expr);
                if name == RESULT {
                    self.check_output_mix(stmt, true)?;
                    self.outputs.record(uniform);
                }
                let var = self.assign_target(stmt, name, expr.output_dtype(), uniform)?;
                if name == RESULT && self.outputs.result_dtype.is_none() {
                    self.outputs.result_dtype = Some(self.vars.get(var).dtype);
                }
                Ok(Stmt::Assign { var, expr })
            }
            DslStmtKind::Return(value) => {
                let expr = self.expr(value, Dtype::Auto)?;
                let uniform = self.is_uniform(&expr);
                self.check_output_mix(stmt, true)?;
                self.outputs.record(uniform);
                let var = self.assign_target(stmt, RESULT, expr.output_dtype(), uniform)?;
                if self.outputs.result_dtype.is_none() {
                    self.outputs.result_dtype = Some(self.vars.get(var).dtype);
                }
                Ok(Stmt::Return { expr })
            }
            DslStmtKind::Expr(value) => {
                self.check_output_mix(stmt, false)?;
                if self.outputs.bare_dtype.is_some() {
                    return Err(here(
                        "a program may have only one bare output expression".to_string(),
                    ));
                }
                let expr = self.expr(value, self.requested)?;
                let uniform = self.is_uniform(&expr);
                self.outputs.record(uniform);
                self.outputs.bare_dtype = Some(expr.output_dtype());
                Ok(Stmt::Output { expr })
            }
            DslStmtKind::Print { args } => self.print(stmt, args),
            DslStmtKind::For { var, limit, body } => {
                let limit = self.expr(limit, Dtype::Auto)?;
                if !self.is_uniform(&limit) {
                    return Err(here("loop bound must be uniform".to_string()));
                }
                let var = self.declare_counter(stmt, var)?;
                self.loop_depth += 1;
                let body = self.block(body, depth + 1);
                self.loop_depth -= 1;
                Ok(Stmt::For {
                    var,
                    limit,
                    body: body?,
                })
            }
            DslStmtKind::If {
                cond,
                then_body,
                elifs,
                else_body,
            } => {
                let mut branches = Vec::with_capacity(1 + elifs.len());
                for (cond, body) in std::iter::once((cond, then_body)).chain(
                    elifs.iter().map(|(c, b)| (c, b)),
                ) {
                    let tree = self.expr(cond, Dtype::Auto)?;
                    if !self.is_uniform(&tree) {
                        return Err(CompileError::dsl(
                            cond.line,
                            cond.column,
                            "condition must be uniform",
                        ));
                    }
                    let body = self.block(body, depth + 1)?;
                    branches.push((tree, body));
                }
                let else_body = match else_body {
                    Some(body) => Some(self.block(body, depth + 1)?),
                    None => None,
                };
                Ok(Stmt::If {
                    branches,
                    else_body,
                })
            }
            DslStmtKind::Break | DslStmtKind::Continue => {
                if self.loop_depth == 0 {
                    return Err(here("break/continue only allowed inside loops".to_string()));
                }
                Ok(if matches!(stmt.kind, DslStmtKind::Break) {
                    Stmt::Break
                } else {
                    Stmt::Continue
                })
            }
        }
    }

    fn print(&mut self, stmt: &DslStmt, args: &[ExprText]) -> Result<Stmt, CompileError> {
        self.has_prints = true;
        let leading = args.first().and_then(|first| match parse_expr(&first.text) {
            Ok(expr) => match expr.kind {
                ExprKind::Str(text) => Some(text),
                _ => None,
            },
            Err(_) => None,
        });
        let (format, values) = match leading {
            Some(text) if text.contains("{}") => {
                let pieces: Vec<String> = text.split("{}").map(str::to_string).collect();
                if pieces.len() != args.len() {
                    return Err(CompileError::dsl(
                        stmt.line,
                        stmt.column,
                        format!(
                            "print format has {} placeholders but {} arguments",
                            pieces.len() - 1,
                            args.len() - 1
                        ),
                    ));
                }
                (PrintFormat::Template(pieces), &args[1..])
            }
            Some(label) => (PrintFormat::Label(label), &args[1..]),
            None => (PrintFormat::Bare, args),
        };

        let mut trees = Vec::with_capacity(values.len());
        for arg in values {
            let tree = self.expr(arg, Dtype::Auto)?;
            if !self.is_uniform(&tree) {
                return Err(CompileError::dsl(
                    arg.line,
                    arg.column,
                    "print arguments must be uniform",
                ));
            }
            trees.push(tree);
        }
        Ok(Stmt::Print {
            format,
            args: trees,
        })
    }

    /// Compile one expression text against the current variable table.
    fn expr(&mut self, text: &ExprText, requested: Dtype) -> Result<Tree, CompileError> {
        if self.vars.len() > MAX_VARS {
            return Err(CompileError::invalid_arg(format!(
                "{} variables exceeds the maximum of {MAX_VARS}",
                self.vars.len()
            )));
        }
        let bindings: Vec<VarAddress> = (0..self.vars.len()).map(synthetic_address).collect();
        let tree = build_tree(
            &text.text,
            self.vars.slots(),
            &bindings,
            self.literals,
            requested,
        )
        .map_err(|err| at_text(err, text))?;
        if tree.has_reductions() {
            self.has_reductions = true;
        }
        Ok(tree)
    }

    /// Uniform when every variable the tree reads outside a reduction is.
    fn is_uniform(&self, tree: &Tree) -> bool {
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            if id == NodeId::INVALID {
                continue;
            }
            let node = tree.node(id);
            if node.flags.contains(NodeFlags::REDUCTION) {
                continue;
            }
            if let NodeKind::Variable { index, .. } = node.kind {
                if !self.vars.get(index).uniform {
                    return false;
                }
            }
            stack.extend_from_slice(node.children());
        }
        true
    }

    /// Reject a `result` assignment after a bare output expression, or
    /// the reverse.
    fn check_output_mix(&self, stmt: &DslStmt, is_result: bool) -> Result<(), CompileError> {
        let mixed = if is_result {
            self.outputs.bare_dtype.is_some()
        } else {
            self.outputs.result_dtype.is_some()
        };
        if mixed {
            return Err(CompileError::dsl(
                stmt.line,
                stmt.column,
                "a program cannot mix `result` with a bare output expression",
            ));
        }
        Ok(())
    }

    /// Index of `name`, declaring it on first assignment.
    fn assign_target(
        &mut self,
        stmt: &DslStmt,
        name: &str,
        dtype: Dtype,
        uniform: bool,
    ) -> Result<usize, CompileError> {
        let here = |message: String| CompileError::dsl(stmt.line, stmt.column, message);
        match self.vars.lookup(name) {
            Some(var) => {
                let entry = self.vars.get(var);
                match entry.kind {
                    VarKind::Input => {
                        return Err(here(format!("cannot assign to input `{name}`")));
                    }
                    VarKind::Reserved(_) => {
                        return Err(here(format!(
                            "cannot assign to reserved identifier `{name}`"
                        )));
                    }
                    VarKind::Local => {}
                }
                if entry.dtype != dtype {
                    return Err(here(format!(
                        "`{name}` is {} but this assignment is {dtype}",
                        entry.dtype
                    )));
                }
                if entry.uniform && !uniform {
                    self.discovered.push(name.to_string());
                    self.vars.get_mut(var).uniform = false;
                }
                Ok(var)
            }
            None => {
                if Reserved::parse(name).is_some() {
                    return Err(here(format!(
                        "cannot assign to reserved identifier `{name}`"
                    )));
                }
                let assumed = !self.varying.contains(name);
                if assumed && !uniform {
                    self.discovered.push(name.to_string());
                }
                Ok(self.declare(name, dtype, assumed && uniform))
            }
        }
    }

    /// The `for` loop counter: a uniform `int64` local.
    fn declare_counter(&mut self, stmt: &DslStmt, name: &str) -> Result<usize, CompileError> {
        self.assign_target(stmt, name, Dtype::Int64, true)
    }

    fn declare(&mut self, name: &str, dtype: Dtype, uniform: bool) -> usize {
        self.vars.push(VarEntry {
            name: name.to_string(),
            dtype,
            itemsize: dtype.size(),
            uniform,
            kind: VarKind::Local,
        })
    }
}

/// Position an expression error inside the program source.
fn at_text(err: CompileError, text: &ExprText) -> CompileError {
    match err.kind {
        CompileErrorKind::Parse { offset } => {
            CompileError::dsl(text.line, text.column + offset as u32 - 1, err.message)
        }
        kind => CompileError::new(
            kind,
            format!("{}:{}: {}", text.line, text.column, err.message),
        ),
    }
}
