//! Block execution of compiled DSL programs.

use numex_diagnostic::EvalError;
use numex_eval::{EvalConfig, Executor, IndexContext, SharedPrintHandler};
use numex_ir::{BlockLayout, Program};

use crate::pack::{gather, global_indices, scatter, valid_offsets, zero_gaps, zeroed};
use crate::plan::{choose, KernelShape, Strategy};
use crate::{block, check_len};

/// Run `program` over block `nblock` of chunk `nchunk`.
///
/// Buffers follow [`evaluate_tree_nd`](crate::evaluate_tree_nd). Index
/// identifiers (`_i0`, ...) see global array indices; shape identifiers
/// see the full array shape.
#[expect(clippy::too_many_arguments, reason = "flat execute arguments plus block coordinates")]
pub fn execute_program_nd(
    program: &Program,
    inputs: &[&[u8]],
    output: &mut [u8],
    block_nitems: u64,
    nchunk: u64,
    nblock: u64,
    config: &EvalConfig,
    print: SharedPrintHandler,
) -> Result<(), EvalError> {
    let geometry = program
        .geometry
        .as_ref()
        .ok_or_else(|| EvalError::invalid_arg("program was compiled without a geometry"))?;
    let layout = block(geometry, block_nitems, nchunk, nblock)?;
    let padded = layout.padded as usize;

    if inputs.len() < program.n_inputs {
        return Err(EvalError::var_mismatch(program.n_inputs, inputs.len()));
    }
    let itemsizes: Vec<usize> = program.vars.entries()[..program.n_inputs]
        .iter()
        .map(|entry| entry.itemsize)
        .collect();
    for ((entry, bytes), itemsize) in program.vars.entries().iter().zip(inputs).zip(&itemsizes) {
        check_len(&format!("input `{}`", entry.name), bytes, padded, *itemsize)?;
    }
    let itemsize = program.output_dtype.size();
    let out_items = if program.output_is_scalar { 1 } else { padded };
    check_len("output", output, out_items, itemsize)?;

    let shape = if program.has_prints || program.has_reductions || program.output_is_scalar {
        KernelShape::Whole
    } else {
        KernelShape::Elementwise
    };
    let strategy = choose(&layout, shape, config);
    tracing::debug!(
        strategy = strategy.name(),
        valid = layout.valid,
        padded,
        program = program.name.as_deref().unwrap_or("<anonymous>"),
        "executing block"
    );

    let executor = Executor::new(*config, print);
    let dims = geometry.shape();
    let with_indices = program.reserved.uses_index();

    match strategy {
        Strategy::Empty => {
            output[..out_items * itemsize].fill(0);
            Ok(())
        }
        Strategy::Interior => {
            let indices = indices_for(&layout, with_indices, 0..padded)?;
            let index = IndexContext::Nd {
                shape: dims,
                indices: &indices,
            };
            executor.execute(program, inputs, output, padded, index)
        }
        Strategy::Runs(runs) => {
            for run in &runs {
                let indices =
                    indices_for(&layout, with_indices, run.start..run.start + run.len)?;
                let sub: Vec<&[u8]> = inputs
                    .iter()
                    .zip(&itemsizes)
                    .map(|(bytes, size)| &bytes[run.start * size..])
                    .collect();
                let index = IndexContext::Nd {
                    shape: dims,
                    indices: &indices,
                };
                executor.execute(program, &sub, &mut output[run.start * itemsize..], run.len, index)?;
            }
            zero_gaps(output, itemsize, &runs, padded);
            Ok(())
        }
        Strategy::Pack => {
            let offsets = valid_offsets(&layout)?;
            let mut packed = Vec::new();
            packed.try_reserve_exact(itemsizes.len())?;
            for (bytes, size) in inputs.iter().zip(&itemsizes) {
                packed.push(gather(bytes, *size, &offsets)?);
            }
            let views: Vec<&[u8]> = packed.iter().map(Vec::as_slice).collect();
            let indices = indices_for(&layout, with_indices, offsets.iter().copied())?;
            let index = IndexContext::Nd {
                shape: dims,
                indices: &indices,
            };
            if program.output_is_scalar {
                return executor.execute(program, &views, output, offsets.len(), index);
            }
            let mut result = zeroed(offsets.len() * itemsize)?;
            executor.execute(program, &views, &mut result, offsets.len(), index)?;
            scatter(&result, itemsize, &offsets, output, padded);
            Ok(())
        }
    }
}

/// Global indices of the given block offsets, when the program reads any.
fn indices_for(
    layout: &BlockLayout,
    with_indices: bool,
    offsets: impl ExactSizeIterator<Item = usize> + Clone,
) -> Result<Vec<Vec<i64>>, EvalError> {
    if with_indices {
        global_indices(layout, offsets)
    } else {
        Ok(Vec::new())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
