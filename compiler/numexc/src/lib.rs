//! Numex - compile numeric expressions and small DSL kernels, then evaluate
//! them over flat or chunked N-dimensional buffers.
//!
//! # Architecture
//!
//! ```text
//! source text
//!     │
//!     ├── single expression ──► compile_expr ──► Kernel::Tree
//!     └── DSL program ────────► compile_program ──► Kernel::Program
//!                                                      │
//!          evaluate (flat) / evaluate_nd (one block) ◄─┘
//! ```
//!
//! Buffers are native-endian bytes. A kernel is immutable once compiled and
//! may be evaluated from several threads at once.

use std::sync::Once;

use numex_eval::{
    evaluate_into, result_dtype, stdout_handler, Executor, IndexContext, SharedPrintHandler,
    TreeEvaluator,
};
use numex_ir::{FreeStats, Geometry, NodeId, Program, Tree};
use rayon::prelude::*;

pub mod commands;

pub use numex_compile::looks_like_dsl;
pub use numex_diagnostic::{
    CompileError, CompileErrorKind, DslError, ErrorCode, EvalError, EvalErrorKind,
};
pub use numex_eval::{capture_handler, silent_handler, EvalConfig, UlpMode};
pub use numex_ir::{Dtype, Scalar, VarAddress, VarDesc};

/// Crate version, as reported by `numex --version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A compiled expression or DSL program.
#[derive(Clone, Debug)]
pub enum Kernel {
    Tree(Tree),
    Program(Program),
}

impl Kernel {
    /// The dtype written to the output buffer.
    pub fn dtype(&self) -> Dtype {
        match self {
            Kernel::Tree(tree) if tree.root() == NodeId::INVALID => tree.output_dtype(),
            Kernel::Tree(tree) => result_dtype(tree),
            Kernel::Program(program) => program.output_dtype,
        }
    }

    /// Whether evaluation writes one element regardless of `n`.
    pub fn is_scalar_output(&self) -> bool {
        match self {
            Kernel::Tree(tree) => tree.root() != NodeId::INVALID && tree.is_scalar_output(),
            Kernel::Program(program) => program.output_is_scalar,
        }
    }

    /// Indented listing for debugging.
    pub fn dump(&self) -> String {
        match self {
            Kernel::Tree(tree) => tree.dump(),
            Kernel::Program(program) => program.dump(),
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            Kernel::Tree(tree) => tree.geometry(),
            Kernel::Program(program) => program.geometry.as_ref(),
        }
    }

    /// Release the kernel and everything it owns.
    pub fn free(self) -> FreeStats {
        match self {
            Kernel::Tree(tree) => tree.free(),
            Kernel::Program(program) => program.free(),
        }
    }

    /// Each element depends only on the inputs at the same position, so
    /// any split of the index range evaluates to the same output.
    fn is_elementwise(&self) -> bool {
        match self {
            Kernel::Tree(tree) => tree.root() != NodeId::INVALID && !tree.has_reductions(),
            Kernel::Program(program) => {
                !program.has_reductions && !program.has_prints && !program.output_is_scalar
            }
        }
    }

    /// Resolved dtype and bytes per element of each declared input, in
    /// declaration order.
    pub fn input_layout(&self) -> Vec<(Dtype, usize)> {
        match self {
            Kernel::Tree(tree) => tree.vars().iter().map(|v| (v.dtype, v.itemsize)).collect(),
            Kernel::Program(program) => program.vars.entries()[..program.n_inputs]
                .iter()
                .map(|e| (e.dtype, e.itemsize))
                .collect(),
        }
    }
}

impl From<Tree> for Kernel {
    fn from(tree: Tree) -> Self {
        Kernel::Tree(tree)
    }
}

impl From<Program> for Kernel {
    fn from(program: Program) -> Self {
        Kernel::Program(program)
    }
}

/// Compile `text` over `vars`. DSL programs are recognised by their shape
/// (a `def` header, several statements, assignments, control flow).
pub fn compile(text: &str, vars: &[VarDesc], dtype: Dtype) -> Result<Kernel, CompileError> {
    if looks_like_dsl(text) {
        numex_compile::compile_program(text, vars, dtype).map(Kernel::Program)
    } else {
        numex_compile::compile_expr(text, vars, dtype).map(Kernel::Tree)
    }
}

/// [`compile`] for an N-dimensional array tiled into chunks and blocks.
pub fn compile_nd(
    text: &str,
    vars: &[VarDesc],
    dtype: Dtype,
    shape: &[u64],
    chunkshape: &[u64],
    blockshape: &[u64],
) -> Result<Kernel, CompileError> {
    if looks_like_dsl(text) {
        numex_compile::compile_program_nd(text, vars, dtype, shape, chunkshape, blockshape)
            .map(Kernel::Program)
    } else {
        numex_compile::compile_expr_nd(text, vars, dtype, shape, chunkshape, blockshape)
            .map(Kernel::Tree)
    }
}

/// Evaluate `kernel` over `n` flat elements. DSL `print` goes to stdout.
pub fn evaluate(
    kernel: &Kernel,
    inputs: &[&[u8]],
    output: &mut [u8],
    n: usize,
    config: &EvalConfig,
) -> Result<(), EvalError> {
    evaluate_with(kernel, inputs, output, n, config, &stdout_handler())
}

/// [`evaluate`] with an explicit `print` destination.
pub fn evaluate_with(
    kernel: &Kernel,
    inputs: &[&[u8]],
    output: &mut [u8],
    n: usize,
    config: &EvalConfig,
    print: &SharedPrintHandler,
) -> Result<(), EvalError> {
    evaluate_range(kernel, inputs, output, n, 0, n, config, print)
}

/// Evaluate `kernel` over `n` flat elements split into ranges of
/// `chunk_len`, evaluated concurrently.
///
/// Kernels with reductions, prints or scalar output see the whole range at
/// once and run on the calling thread.
pub fn evaluate_parallel(
    kernel: &Kernel,
    inputs: &[&[u8]],
    output: &mut [u8],
    n: usize,
    chunk_len: usize,
    config: &EvalConfig,
    print: &SharedPrintHandler,
) -> Result<(), EvalError> {
    let chunk_len = chunk_len.max(1);
    if !kernel.is_elementwise() || n <= chunk_len {
        return evaluate_with(kernel, inputs, output, n, config, print);
    }

    let itemsizes: Vec<usize> = kernel.input_layout().iter().map(|(_, size)| *size).collect();
    if inputs.len() < itemsizes.len() {
        return Err(EvalError::var_mismatch(itemsizes.len(), inputs.len()));
    }
    for (position, (bytes, size)) in inputs.iter().zip(&itemsizes).enumerate() {
        if bytes.len() < n * size {
            return Err(EvalError::invalid_arg(format!(
                "input {position} holds {} bytes, {} needed",
                bytes.len(),
                n * size
            )));
        }
    }
    let out_size = kernel.dtype().size();
    if out_size == 0 || output.len() < n * out_size {
        return Err(EvalError::invalid_arg(format!(
            "output holds {} bytes, {} needed",
            output.len(),
            n * out_size
        )));
    }

    tracing::debug!(n, chunk_len, "parallel flat evaluation");
    output[..n * out_size]
        .par_chunks_mut(chunk_len * out_size)
        .enumerate()
        .try_for_each(|(index, out)| {
            let offset = index * chunk_len;
            let len = out.len() / out_size;
            let sub: Vec<&[u8]> = inputs
                .iter()
                .zip(&itemsizes)
                .map(|(bytes, size)| &bytes[offset * size..(offset + len) * size])
                .collect();
            evaluate_range(kernel, &sub, out, len, offset, n, config, print)
        })
}

/// Evaluate `len` elements that start at `offset` of an `n`-element array.
#[expect(
    clippy::too_many_arguments,
    reason = "flat evaluate arguments plus the range being evaluated"
)]
fn evaluate_range(
    kernel: &Kernel,
    inputs: &[&[u8]],
    output: &mut [u8],
    len: usize,
    offset: usize,
    n: usize,
    config: &EvalConfig,
    print: &SharedPrintHandler,
) -> Result<(), EvalError> {
    match kernel {
        Kernel::Tree(tree) => {
            evaluate_into(&TreeEvaluator::new(*config), tree, inputs, output, len)
        }
        Kernel::Program(program) => Executor::new(*config, print.clone()).execute(
            program,
            inputs,
            output,
            len,
            IndexContext::Flat {
                len: n as u64,
                offset: offset as u64,
            },
        ),
    }
}

/// Evaluate one block of a kernel compiled with [`compile_nd`].
///
/// `inputs` and `output` hold `block_nitems` elements each (one output
/// element for scalar kernels). Padding positions of a ragged block are
/// written as zero.
pub fn evaluate_nd(
    kernel: &Kernel,
    inputs: &[&[u8]],
    output: &mut [u8],
    block_nitems: u64,
    nchunk: u64,
    nblock: u64,
    config: &EvalConfig,
) -> Result<(), EvalError> {
    evaluate_nd_with(
        kernel,
        inputs,
        output,
        block_nitems,
        nchunk,
        nblock,
        config,
        &stdout_handler(),
    )
}

/// [`evaluate_nd`] with an explicit `print` destination.
#[expect(
    clippy::too_many_arguments,
    reason = "block evaluate arguments plus the print destination"
)]
pub fn evaluate_nd_with(
    kernel: &Kernel,
    inputs: &[&[u8]],
    output: &mut [u8],
    block_nitems: u64,
    nchunk: u64,
    nblock: u64,
    config: &EvalConfig,
    print: &SharedPrintHandler,
) -> Result<(), EvalError> {
    match kernel {
        Kernel::Tree(tree) => numex_nd::evaluate_tree_nd(
            tree,
            inputs,
            output,
            block_nitems,
            nchunk,
            nblock,
            config,
        ),
        Kernel::Program(program) => numex_nd::execute_program_nd(
            program,
            inputs,
            output,
            block_nitems,
            nchunk,
            nblock,
            config,
            print.clone(),
        ),
    }
}

/// How many elements of block `nblock` in chunk `nchunk` lie inside the
/// array.
pub fn nd_valid_nitems(kernel: &Kernel, nchunk: u64, nblock: u64) -> Result<u64, EvalError> {
    let geometry = kernel
        .geometry()
        .ok_or_else(|| EvalError::invalid_arg("kernel was compiled without a geometry"))?;
    numex_nd::valid_nitems(geometry, nchunk, nblock)
}

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber, once per process.
///
/// Nothing is installed unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=numex_nd=debug`. `NUMEX_LOG_TREE=1` selects the hierarchical
/// span layout.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let tree = std::env::var("NUMEX_LOG_TREE").is_ok_and(|v| v.trim() == "1");
        if tree {
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
