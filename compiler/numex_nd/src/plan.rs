//! Strategy selection for one block.

use numex_eval::EvalConfig;
use numex_ir::{BlockLayout, ReduceOp, Run};

/// How a block is evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// No valid elements: zero-fill without evaluating.
    Empty,
    /// Every element is valid: one flat evaluation.
    Interior,
    /// One evaluation per contiguous run, directly on sub-slices.
    Runs(Vec<Run>),
    /// Gather the valid elements, evaluate once, scatter back.
    Pack,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Empty => "empty",
            Strategy::Interior => "interior",
            Strategy::Runs(_) => "runs",
            Strategy::Pack => "pack",
        }
    }
}

/// What a kernel computes, as far as splitting a block is concerned.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KernelShape {
    /// Every output element depends only on the inputs at its position.
    Elementwise,
    /// A reduction at the root over an elementwise argument.
    RootReduction(ReduceOp),
    /// Must see all valid elements in one evaluation: reductions nested in
    /// an elementwise expression, or programs that print or reduce.
    Whole,
}

/// Pick the strategy for `layout`.
///
/// Runs are used for elementwise kernels and for root reductions whose
/// result does not depend on how the input is split: `any`, `all`, `min`
/// and `max` always, `sum` while the run count stays within
/// `config.sum_run_limit`.
pub fn choose(layout: &BlockLayout, shape: KernelShape, config: &EvalConfig) -> Strategy {
    if layout.is_empty() {
        return Strategy::Empty;
    }
    if layout.is_interior() {
        return Strategy::Interior;
    }
    if config.force_pack {
        return Strategy::Pack;
    }
    let runs = match shape {
        KernelShape::Whole
        | KernelShape::RootReduction(ReduceOp::Prod | ReduceOp::Mean) => return Strategy::Pack,
        KernelShape::Elementwise
        | KernelShape::RootReduction(
            ReduceOp::Any | ReduceOp::All | ReduceOp::Min | ReduceOp::Max,
        ) => layout.runs(),
        KernelShape::RootReduction(ReduceOp::Sum) => {
            let runs = layout.runs();
            if runs.len() > config.sum_run_limit {
                return Strategy::Pack;
            }
            runs
        }
    };
    Strategy::Runs(runs)
}
