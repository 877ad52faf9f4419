//! Subcommands of the `numex` driver.
//!
//! Each command returns the text to print on success, or a rendered error
//! line for the driver to report before exiting non-zero.

use numex_eval::stdout_handler;

use crate::{
    compile, compile_nd, evaluate_nd, evaluate_parallel, evaluate_with, CompileError, Dtype,
    EvalConfig, EvalError, Kernel, Scalar, VarDesc,
};

/// Elements per range when `--parallel` is given without a length.
pub const DEFAULT_PARALLEL_CHUNK: usize = 16 * 1024;

/// One `--var name:dtype=v1,v2,...` argument.
#[derive(Clone, Debug, PartialEq)]
pub struct InputArg {
    pub name: String,
    /// `auto` when no `:dtype` was given.
    pub dtype: Dtype,
    pub values: Vec<String>,
}

/// Options shared by every subcommand.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// The first positional argument: expression text or a file path.
    pub source: Option<String>,
    pub dtype: Dtype,
    pub vars: Vec<InputArg>,
    pub shape: Vec<u64>,
    pub chunks: Vec<u64>,
    pub blocks: Vec<u64>,
    pub nchunk: u64,
    pub nblock: u64,
    /// Range length for concurrent flat evaluation.
    pub parallel: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            source: None,
            dtype: Dtype::Auto,
            vars: Vec::new(),
            shape: Vec::new(),
            chunks: Vec::new(),
            blocks: Vec::new(),
            nchunk: 0,
            nblock: 0,
            parallel: None,
        }
    }
}

impl Options {
    /// Parse the arguments that follow the subcommand name.
    pub fn parse(args: &[String]) -> Result<Options, String> {
        let mut options = Options::default();
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            if arg == "--var" {
                let Some(text) = args.get(i + 1) else {
                    return Err("error: --var needs a value".to_string());
                };
                options.vars.push(parse_var(text)?);
                i += 2;
                continue;
            }
            if let Some(text) = arg.strip_prefix("--var=") {
                options.vars.push(parse_var(text)?);
            } else if let Some(name) = arg.strip_prefix("--dtype=") {
                options.dtype = parse_dtype(name)?;
            } else if let Some(dims) = arg.strip_prefix("--shape=") {
                options.shape = parse_dims(dims)?;
            } else if let Some(dims) = arg.strip_prefix("--chunks=") {
                options.chunks = parse_dims(dims)?;
            } else if let Some(dims) = arg.strip_prefix("--blocks=") {
                options.blocks = parse_dims(dims)?;
            } else if let Some(index) = arg.strip_prefix("--nchunk=") {
                options.nchunk = parse_count(index)?;
            } else if let Some(index) = arg.strip_prefix("--nblock=") {
                options.nblock = parse_count(index)?;
            } else if arg == "--parallel" {
                options.parallel = Some(DEFAULT_PARALLEL_CHUNK);
            } else if let Some(len) = arg.strip_prefix("--parallel=") {
                options.parallel = Some(parse_count(len)?.max(1) as usize);
            } else if arg.starts_with("--") {
                return Err(format!("error: unknown option `{arg}`"));
            } else if options.source.is_none() {
                options.source = Some(arg.to_string());
            } else {
                return Err(format!("error: unexpected argument `{arg}`"));
            }
            i += 1;
        }
        Ok(options)
    }

    fn source(&self) -> Result<&str, String> {
        self.source
            .as_deref()
            .ok_or_else(|| "error: missing expression".to_string())
    }

    fn var_descs(&self) -> Vec<VarDesc> {
        self.vars
            .iter()
            .map(|var| {
                if var.dtype.is_string() {
                    let chars = var.values.iter().map(|v| v.chars().count()).max();
                    VarDesc::string(var.name.clone(), chars.unwrap_or(1).max(1))
                } else {
                    VarDesc::new(var.name.clone(), var.dtype)
                }
            })
            .collect()
    }
}

/// `name:dtype=v1,v2` or `name=v1,v2`.
pub fn parse_var(text: &str) -> Result<InputArg, String> {
    let (decl, values) = text.split_once('=').unwrap_or((text, ""));
    let (name, dtype) = match decl.split_once(':') {
        Some((name, dtype)) => (name, parse_dtype(dtype)?),
        None => (decl, Dtype::Auto),
    };
    if name.is_empty() {
        return Err(format!("error: --var `{text}` has no name"));
    }
    let values = if values.is_empty() {
        Vec::new()
    } else {
        values.split(',').map(|v| v.trim().to_string()).collect()
    };
    Ok(InputArg {
        name: name.to_string(),
        dtype,
        values,
    })
}

/// A comma-separated list of extents, e.g. `10,7`.
pub fn parse_dims(text: &str) -> Result<Vec<u64>, String> {
    text.split(',').map(parse_count).collect()
}

fn parse_count(text: &str) -> Result<u64, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("error: `{text}` is not a non-negative integer"))
}

fn parse_dtype(name: &str) -> Result<Dtype, String> {
    Dtype::from_name(name.trim()).ok_or_else(|| format!("error: unknown dtype `{name}`"))
}

/// Parse one command-line value as an element of `dtype`.
pub fn parse_value(text: &str, dtype: Dtype) -> Result<Scalar, String> {
    if dtype.is_string() {
        return Ok(Scalar::Str(text.chars().map(u32::from).collect()));
    }
    let value = match text {
        "true" => Scalar::Bool(true),
        "false" => Scalar::Bool(false),
        _ => {
            if let Ok(v) = text.parse::<i64>() {
                Scalar::Int(v)
            } else if let Ok(v) = text.parse::<u64>() {
                Scalar::UInt(v)
            } else if let Ok(v) = text.parse::<f64>() {
                Scalar::Float(v)
            } else {
                return Err(format!("error: cannot parse `{text}` as {dtype}"));
            }
        }
    };
    Ok(value)
}

/// Encode `values` as `len` elements; missing trailing elements are zero.
fn encode(values: &[String], dtype: Dtype, itemsize: usize, len: usize) -> Result<Vec<u8>, String> {
    if values.len() > len {
        return Err(format!(
            "error: {} values given for {len} elements",
            values.len()
        ));
    }
    let mut bytes = vec![0u8; len * itemsize];
    for (text, out) in values.iter().zip(bytes.chunks_exact_mut(itemsize.max(1))) {
        parse_value(text, dtype)?.write(dtype, out);
    }
    Ok(bytes)
}

/// Render `items` output elements as `[a, b, c]`, or a bare value for a
/// scalar kernel.
pub fn render(kernel: &Kernel, output: &[u8], items: usize) -> String {
    let dtype = kernel.dtype();
    let size = dtype.size().max(1);
    let values: Vec<String> = output
        .chunks_exact(size)
        .take(items)
        .map(|bytes| Scalar::read(dtype, bytes).to_string())
        .collect();
    if kernel.is_scalar_output() {
        values.join(", ")
    } else {
        format!("[{}]", values.join(", "))
    }
}

fn compile_error(err: &CompileError) -> String {
    format!("error[{}]: {err}", err.code())
}

fn eval_error(err: &EvalError) -> String {
    format!("error[{}]: {err}", err.code())
}

fn input_buffers(kernel: &Kernel, options: &Options, len: usize) -> Result<Vec<Vec<u8>>, String> {
    kernel
        .input_layout()
        .into_iter()
        .zip(&options.vars)
        .map(|((dtype, itemsize), var)| encode(&var.values, dtype, itemsize, len))
        .collect()
}

/// `numex eval <expr>`: evaluate over the `--var` values as flat arrays.
pub fn eval_command(options: &Options, config: &EvalConfig) -> Result<String, String> {
    let source = options.source()?;
    let kernel = compile(source, &options.var_descs(), options.dtype)
        .map_err(|e| compile_error(&e))?;

    let n = options.vars.first().map_or(1, |v| v.values.len());
    if let Some(var) = options.vars.iter().find(|v| v.values.len() != n) {
        return Err(format!(
            "error: `{}` has {} values, expected {n}",
            var.name,
            var.values.len()
        ));
    }
    let inputs = input_buffers(&kernel, options, n)?;
    let views: Vec<&[u8]> = inputs.iter().map(Vec::as_slice).collect();

    let items = if kernel.is_scalar_output() { n.min(1) } else { n };
    let mut output = vec![0u8; items.max(1) * kernel.dtype().size()];
    let print = stdout_handler();
    match options.parallel {
        Some(chunk_len) => {
            evaluate_parallel(&kernel, &views, &mut output, n, chunk_len, config, &print)
        }
        None => evaluate_with(&kernel, &views, &mut output, n, config, &print),
    }
    .map_err(|e| eval_error(&e))?;
    Ok(render(&kernel, &output, items))
}

/// `numex nd <expr>`: evaluate one block. `--var` values fill the block in
/// row-major order.
pub fn nd_command(options: &Options, config: &EvalConfig) -> Result<String, String> {
    let source = options.source()?;
    let kernel = compile_nd(
        source,
        &options.var_descs(),
        options.dtype,
        &options.shape,
        &options.chunks,
        &options.blocks,
    )
    .map_err(|e| compile_error(&e))?;

    let block_nitems: u64 = options.blocks.iter().product();
    let len = block_nitems as usize;
    let inputs = input_buffers(&kernel, options, len)?;
    let views: Vec<&[u8]> = inputs.iter().map(Vec::as_slice).collect();

    let items = if kernel.is_scalar_output() { 1 } else { len };
    let mut output = vec![0u8; items * kernel.dtype().size()];
    evaluate_nd(
        &kernel,
        &views,
        &mut output,
        block_nitems,
        options.nchunk,
        options.nblock,
        config,
    )
    .map_err(|e| eval_error(&e))?;
    Ok(render(&kernel, &output, items))
}

/// `numex dump <expr>`: the compiled kernel's listing.
pub fn dump_command(options: &Options) -> Result<String, String> {
    let source = options.source()?;
    let kernel = compile(source, &options.var_descs(), options.dtype)
        .map_err(|e| compile_error(&e))?;
    Ok(kernel.dump())
}

/// `numex check <file>`: compile a DSL file and report its output dtype.
pub fn check_command(options: &Options) -> Result<String, String> {
    let path = options.source()?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error: cannot read `{path}`: {e}"))?;
    check_source(path, &text, options)
}

fn check_source(path: &str, text: &str, options: &Options) -> Result<String, String> {
    let kernel = compile(text, &options.var_descs(), options.dtype)
        .map_err(|e| format!("{path}: {}", compile_error(&e)))?;
    let kind = match &kernel {
        Kernel::Tree(_) => "expression",
        Kernel::Program(_) => "program",
    };
    Ok(format!(
        "{path}: ok ({kind} -> {}{})",
        kernel.dtype(),
        if kernel.is_scalar_output() { ", scalar" } else { "" }
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
