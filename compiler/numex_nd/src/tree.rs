//! Block evaluation of compiled expressions.

use numex_diagnostic::EvalError;
use numex_eval::{evaluate_into, result_dtype, EvalConfig, Evaluator, Reducer, TreeEvaluator};
use numex_ir::{BlockLayout, NodeId, ReduceOp, Run, Scalar, Tree, VarSlot};

use crate::pack::{gather, scatter, valid_offsets, zero_gaps, zeroed};
use crate::plan::{choose, KernelShape, Strategy};
use crate::strided::StridedArg;
use crate::{block, check_len};

/// Evaluate block `nblock` of chunk `nchunk` for a tree compiled with a
/// geometry.
///
/// Every input holds `block_nitems` padded elements. The output receives
/// `block_nitems` elements, padding zeroed, or a single element when the
/// tree is rooted at a reduction.
pub fn evaluate_tree_nd(
    tree: &Tree,
    inputs: &[&[u8]],
    output: &mut [u8],
    block_nitems: u64,
    nchunk: u64,
    nblock: u64,
    config: &EvalConfig,
) -> Result<(), EvalError> {
    if tree.root() == NodeId::INVALID {
        return Err(EvalError::null_expr());
    }
    let geometry = tree
        .geometry()
        .ok_or_else(|| EvalError::invalid_arg("expression was compiled without a geometry"))?;
    let layout = block(geometry, block_nitems, nchunk, nblock)?;
    let padded = layout.padded as usize;

    let vars = tree.vars();
    if inputs.len() < vars.len() {
        return Err(EvalError::var_mismatch(vars.len(), inputs.len()));
    }
    for (slot, bytes) in vars.iter().zip(inputs) {
        check_len(&format!("input `{}`", slot.name), bytes, padded, slot.itemsize)?;
    }
    let dtype = result_dtype(tree);
    let itemsize = dtype.size();
    if itemsize == 0 {
        return Err(EvalError::invalid_arg(format!("cannot write {dtype} output")));
    }
    let out_items = if tree.is_scalar_output() { 1 } else { padded };
    check_len("output", output, out_items, itemsize)?;

    let shape = kernel_shape(tree);
    let strategy = choose(&layout, shape, config);
    tracing::debug!(
        strategy = strategy.name(),
        valid = layout.valid,
        padded,
        ?shape,
        "evaluating block"
    );

    let evaluator = TreeEvaluator::new(*config);
    match strategy {
        Strategy::Empty => {
            output[..out_items * itemsize].fill(0);
            Ok(())
        }
        Strategy::Interior => evaluate_into(&evaluator, tree, inputs, output, padded),
        Strategy::Runs(runs) => match tree.root_reduction() {
            Some((op, arg)) => {
                let value = reduce_runs(&evaluator, tree, op, arg, inputs, &runs)?;
                value.write(dtype, &mut output[..itemsize]);
                Ok(())
            }
            None => {
                for run in &runs {
                    tracing::trace!(start = run.start, len = run.len, "run");
                    let sub = offset_inputs(vars, inputs, run.start);
                    evaluate_into(
                        &evaluator,
                        tree,
                        &sub,
                        &mut output[run.start * itemsize..],
                        run.len,
                    )?;
                }
                zero_gaps(output, itemsize, &runs, padded);
                Ok(())
            }
        },
        Strategy::Pack => pack(&evaluator, tree, inputs, output, &layout),
    }
}

fn kernel_shape(tree: &Tree) -> KernelShape {
    match tree.root_reduction() {
        Some((op, _)) => KernelShape::RootReduction(op),
        None if tree.has_reductions() => KernelShape::Whole,
        None => KernelShape::Elementwise,
    }
}

/// Each input advanced by `start` elements.
fn offset_inputs<'a>(vars: &[VarSlot], inputs: &[&'a [u8]], start: usize) -> Vec<&'a [u8]> {
    vars.iter()
        .zip(inputs)
        .map(|(slot, bytes)| &bytes[start * slot.itemsize..])
        .collect()
}

fn reduce_runs(
    evaluator: &TreeEvaluator,
    tree: &Tree,
    op: ReduceOp,
    arg: NodeId,
    inputs: &[&[u8]],
    runs: &[Run],
) -> Result<Scalar, EvalError> {
    let mut reducer = Reducer::new(op, tree.node(arg).dtype);
    for run in runs {
        if reducer.is_decided() {
            break;
        }
        let sub = offset_inputs(tree.vars(), inputs, run.start);
        let column = evaluator.eval_node(tree, arg, &sub, run.len)?;
        reducer.push_column(&column, run.len);
    }
    Ok(reducer.finish())
}

fn pack(
    evaluator: &TreeEvaluator,
    tree: &Tree,
    inputs: &[&[u8]],
    output: &mut [u8],
    layout: &BlockLayout,
) -> Result<(), EvalError> {
    let dtype = result_dtype(tree);
    let itemsize = dtype.size();

    if let Some((op, arg)) = tree.root_reduction() {
        if let Some(strided) = StridedArg::detect(tree, arg) {
            tracing::trace!(?strided, "strided reduction");
            let value = strided.reduce(tree, op, tree.node(arg).dtype, inputs, layout)?;
            value.write(dtype, &mut output[..itemsize]);
            return Ok(());
        }
    }

    let offsets = valid_offsets(layout)?;
    let mut packed = Vec::new();
    packed.try_reserve_exact(tree.vars().len())?;
    for (slot, bytes) in tree.vars().iter().zip(inputs) {
        packed.push(gather(bytes, slot.itemsize, &offsets)?);
    }
    let views: Vec<&[u8]> = packed.iter().map(Vec::as_slice).collect();

    if tree.is_scalar_output() {
        return evaluate_into(evaluator, tree, &views, output, offsets.len());
    }
    let mut result = zeroed(offsets.len() * itemsize)?;
    evaluate_into(evaluator, tree, &views, &mut result, offsets.len())?;
    scatter(&result, itemsize, &offsets, output, layout.padded as usize);
    Ok(())
}
