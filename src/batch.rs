use rayon::prelude::*;

use crate::assemble::{compile_plan, CompiledPlan};
use crate::config::CompileOptions;
use crate::graph::PlanInput;

/// Compile independent snapshots in parallel. Results keep input order.
pub fn compile_batch(inputs: &[PlanInput], options: &CompileOptions) -> Vec<CompiledPlan> {
    log::debug!("[PlanCompiler] batch of {} plan(s)", inputs.len());
    inputs
        .par_iter()
        .map(|input| compile_plan(input, options))
        .collect()
}
