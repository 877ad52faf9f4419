//! DSL program execution.
//!
//! An [`Executor`] interprets a compiled [`Program`] over one block of `n`
//! elements. Every local gets its own `n`-element buffer; `result` writes
//! straight into the caller's output unless the program's output is a
//! single value. Control flow and `print` run once per block, which is why
//! the compiler only accepts uniform conditions, bounds and print
//! arguments.

use numex_diagnostic::EvalError;
use numex_ir::{
    Dtype, FpMode, PrintFormat, Program, Reserved, Scalar, Stmt, Tree, VarKind,
};
use numex_stack::ensure_sufficient_stack;

use crate::column::Column;
use crate::config::{EvalConfig, UlpMode};
use crate::evaluator::{Evaluator, TreeEvaluator};
use crate::print_handler::SharedPrintHandler;

/// Where the elements of a block sit in the whole array, for `_i<d>`,
/// `_n<d>` and `_ndim`.
#[derive(Copy, Clone, Debug)]
pub enum IndexContext<'a> {
    /// A flat array of `len` elements; the block starts at `offset`.
    Flat { len: u64, offset: u64 },
    /// A block of an N-dimensional array. `indices[d][i]` is the global
    /// index of element `i` along dimension `d`.
    Nd {
        shape: &'a [u64],
        indices: &'a [Vec<i64>],
    },
}

impl IndexContext<'_> {
    fn ndim(&self) -> usize {
        match self {
            IndexContext::Flat { .. } => 1,
            IndexContext::Nd { shape, .. } => shape.len(),
        }
    }

    fn extent(&self, dim: usize) -> Option<u64> {
        match self {
            IndexContext::Flat { len, .. } => (dim == 0).then_some(*len),
            IndexContext::Nd { shape, .. } => shape.get(dim).copied(),
        }
    }

    fn index(&self, dim: usize, i: usize) -> Option<i64> {
        match self {
            IndexContext::Flat { offset, .. } => (dim == 0).then(|| (*offset + i as u64) as i64),
            IndexContext::Nd { indices, .. } => indices.get(dim)?.get(i).copied(),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return,
}

fn zeroed(len: usize) -> Result<Vec<u8>, EvalError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len)?;
    buffer.resize(len, 0);
    Ok(buffer)
}

fn stmt_name(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::Assign { .. } => "assign",
        Stmt::Output { .. } => "output",
        Stmt::Return { .. } => "return",
        Stmt::Print { .. } => "print",
        Stmt::For { .. } => "for",
        Stmt::If { .. } => "if",
        Stmt::Break => "break",
        Stmt::Continue => "continue",
    }
}

/// Buffers of one program run.
struct Frame<'a> {
    program: &'a Program,
    inputs: &'a [&'a [u8]],
    output: &'a mut [u8],
    /// Indexed by variable-table position minus `n_inputs`.
    locals: Vec<Vec<u8>>,
    /// `result` lives in `output` rather than in `locals`.
    result_in_output: bool,
    result_written: bool,
    n: usize,
}

impl Frame<'_> {
    fn views(&self) -> Vec<&[u8]> {
        let n_inputs = self.program.n_inputs;
        let mut views: Vec<&[u8]> = self.inputs[..n_inputs].to_vec();
        for (i, local) in self.locals.iter().enumerate() {
            if self.result_in_output && self.program.result == Some(n_inputs + i) {
                views.push(&*self.output);
            } else {
                views.push(local);
            }
        }
        views
    }

    fn eval(&self, evaluator: &TreeEvaluator, tree: &Tree) -> Result<Column, EvalError> {
        let views = self.views();
        evaluator.eval(tree, &views, self.n)
    }

    fn store(&mut self, var: usize, column: Column) {
        let entry = self.program.vars.get(var);
        let column = column.cast(entry.dtype);
        let n = self.n;
        if self.program.result == Some(var) {
            self.result_written = true;
        }
        if self.result_in_output && self.program.result == Some(var) {
            column.write(self.output, entry.itemsize, n);
        } else {
            let buffer = &mut self.locals[var - self.program.n_inputs];
            column.write(buffer, entry.itemsize, n);
        }
    }

    /// A bare output expression, written without a `result` variable.
    fn store_output(&mut self, column: Column) {
        let dtype = self.program.output_dtype;
        let count = if self.program.output_is_scalar { 1 } else { self.n };
        column.cast(dtype).write(self.output, dtype.size(), count);
    }

    /// Copy a `result` kept in `locals` into the caller's output.
    fn finish(&mut self) {
        let Some(result) = self.program.result else {
            return;
        };
        if self.result_in_output || !self.result_written {
            return;
        }
        let entry = self.program.vars.get(result);
        let count = if self.program.output_is_scalar { 1 } else { self.n };
        let local = &self.locals[result - self.program.n_inputs];
        let dtype = self.program.output_dtype;
        Column::read(entry.dtype, entry.itemsize, local, count)
            .cast(dtype)
            .write(self.output, dtype.size(), count);
    }
}

/// Interprets compiled DSL programs.
pub struct Executor {
    config: EvalConfig,
    print: SharedPrintHandler,
}

impl Executor {
    pub fn new(config: EvalConfig, print: SharedPrintHandler) -> Self {
        Executor { config, print }
    }

    /// Run `program` over `n` elements.
    ///
    /// `inputs` holds one buffer per declared input. `output` must hold `n`
    /// elements of the output dtype, or one when the output is scalar.
    /// On error the output contents are undefined; `print` lines already
    /// emitted stay emitted.
    pub fn execute(
        &self,
        program: &Program,
        inputs: &[&[u8]],
        output: &mut [u8],
        n: usize,
        index: IndexContext<'_>,
    ) -> Result<(), EvalError> {
        if inputs.len() < program.n_inputs {
            return Err(EvalError::var_mismatch(program.n_inputs, inputs.len()));
        }
        for (entry, bytes) in program.vars.entries().iter().zip(&inputs[..program.n_inputs]) {
            if bytes.len() < n * entry.itemsize {
                return Err(EvalError::invalid_arg(format!(
                    "input `{}` holds {} bytes, {} needed",
                    entry.name,
                    bytes.len(),
                    n * entry.itemsize
                )));
            }
        }
        let out_size = program.output_dtype.size();
        if out_size == 0 {
            return Err(EvalError::invalid_arg(format!(
                "cannot write {} output",
                program.output_dtype
            )));
        }
        let out_items = if program.output_is_scalar { n.min(1) } else { n };
        if output.len() < out_items * out_size {
            return Err(EvalError::invalid_arg(format!(
                "output holds {} bytes, {} needed",
                output.len(),
                out_items * out_size
            )));
        }
        if n == 0 {
            return Ok(());
        }

        let result_in_output = !program.output_is_scalar
            && program
                .result
                .is_some_and(|r| program.vars.get(r).dtype == program.output_dtype);
        let mut locals = Vec::with_capacity(program.vars.len() - program.n_inputs);
        for (var, entry) in program.vars.entries().iter().enumerate().skip(program.n_inputs) {
            let buffer = match entry.kind {
                _ if result_in_output && program.result == Some(var) => Vec::new(),
                VarKind::Reserved(reserved) => materialize(reserved, &index, n)?,
                VarKind::Local | VarKind::Input => zeroed(n * entry.itemsize)?,
            };
            locals.push(buffer);
        }

        let config = if program.pragmas.fp == Some(FpMode::Fast) {
            self.config.with_ulp_mode(UlpMode::Relaxed)
        } else {
            self.config
        };
        let evaluator = TreeEvaluator::new(config);
        let mut frame = Frame {
            program,
            inputs,
            output,
            locals,
            result_in_output,
            result_written: false,
            n,
        };
        tracing::debug!(
            name = program.name.as_deref().unwrap_or("<anonymous>"),
            n,
            "executing program"
        );
        self.run_block(&evaluator, &mut frame, &program.body)?;
        frame.finish();
        Ok(())
    }

    fn run_block(
        &self,
        evaluator: &TreeEvaluator,
        frame: &mut Frame<'_>,
        body: &[Stmt],
    ) -> Result<Flow, EvalError> {
        for stmt in body {
            let flow = ensure_sufficient_stack(|| self.run_stmt(evaluator, frame, stmt))?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn run_stmt(
        &self,
        evaluator: &TreeEvaluator,
        frame: &mut Frame<'_>,
        stmt: &Stmt,
    ) -> Result<Flow, EvalError> {
        tracing::debug!(stmt = stmt_name(stmt), "dispatch");
        match stmt {
            Stmt::Assign { var, expr } => {
                let column = frame.eval(evaluator, expr)?;
                frame.store(*var, column);
                Ok(Flow::Normal)
            }
            Stmt::Output { expr } => {
                let column = frame.eval(evaluator, expr)?;
                frame.store_output(column);
                Ok(Flow::Normal)
            }
            Stmt::Return { expr } => {
                let column = frame.eval(evaluator, expr)?;
                match frame.program.result {
                    Some(var) => frame.store(var, column),
                    None => frame.store_output(column),
                }
                Ok(Flow::Return)
            }
            Stmt::Print { format, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(frame.eval(evaluator, arg)?.get(0).to_string());
                }
                self.print.println(&render(format, &values));
                Ok(Flow::Normal)
            }
            Stmt::For { var, limit, body } => {
                let limit = frame.eval(evaluator, limit)?.get(0).to_i64();
                for i in 0..limit.max(0) {
                    frame.store(*var, Column::from_scalar(&Scalar::Int(i), Dtype::Int64));
                    match self.run_block(evaluator, frame, body)? {
                        Flow::Break => break,
                        Flow::Return => return Ok(Flow::Return),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::If {
                branches,
                else_body,
            } => {
                for (cond, body) in branches {
                    if frame.eval(evaluator, cond)?.get(0).is_truthy() {
                        return self.run_block(evaluator, frame, body);
                    }
                }
                match else_body {
                    Some(body) => self.run_block(evaluator, frame, body),
                    None => Ok(Flow::Normal),
                }
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
        }
    }
}

/// An `int64` buffer with the reserved identifier's value per element.
fn materialize(reserved: Reserved, index: &IndexContext<'_>, n: usize) -> Result<Vec<u8>, EvalError> {
    let mut buffer = zeroed(n * 8)?;
    let missing = || {
        EvalError::invalid_arg(format!(
            "{} is outside the {}-dimensional evaluation",
            reserved.name(),
            index.ndim()
        ))
    };
    let uniform = match reserved {
        Reserved::Ndim => Some(index.ndim() as i64),
        Reserved::Shape(d) => Some(index.extent(usize::from(d)).ok_or_else(missing)? as i64),
        Reserved::Index(_) => None,
    };
    for (i, slot) in buffer.chunks_exact_mut(8).enumerate() {
        let value = match (uniform, reserved) {
            (Some(v), _) => v,
            (None, Reserved::Index(d)) => index.index(usize::from(d), i).ok_or_else(missing)?,
            (None, _) => 0,
        };
        slot.copy_from_slice(&value.to_ne_bytes());
    }
    Ok(buffer)
}

fn render(format: &PrintFormat, values: &[String]) -> String {
    match format {
        PrintFormat::Template(pieces) => {
            let mut line = String::new();
            for (i, piece) in pieces.iter().enumerate() {
                line.push_str(piece);
                if let Some(value) = values.get(i) {
                    line.push_str(value);
                }
            }
            line
        }
        PrintFormat::Label(label) => {
            let mut parts = vec![label.clone()];
            parts.extend(values.iter().cloned());
            parts.join(" ")
        }
        PrintFormat::Bare => values.join(" "),
    }
}
