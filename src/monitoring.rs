//! High-level functionality tying the compiler and the evaluation engine together.

use crate::algebra::boolean::BddPolynomialManager;
use crate::automaton::{LabellingFn, StrelAutomaton};
use crate::errors::{CompileError, MonitorError};
use crate::formulae::strel_tree::StrelTreeNode;
use crate::spatial::{Location, SpatialGraph};

/// A qualitative automaton: Boolean verdicts over BDD-backed polynomials.
pub type BooleanAutomaton<G> = StrelAutomaton<G, BddPolynomialManager>;

/// Compile a Boolean (qualitative) monitoring automaton for a STREL formula.
///
/// `label_fn` takes an input graph, a location and a predicate name, and
/// returns the predicate's truth value there. `max_locs` fixes the number of
/// locations; `dist_attr` optionally overrides the edge attribute under which
/// reach distances are read.
pub fn make_boolean_automaton<G: SpatialGraph>(
    phi: &StrelTreeNode,
    label_fn: LabellingFn<G, bool>,
    max_locs: usize,
    dist_attr: Option<&str>,
) -> Result<BooleanAutomaton<G>, CompileError> {
    StrelAutomaton::from_strel_expr(phi, label_fn, max_locs, dist_attr)
}

/// Compile a formula and evaluate it at `ego_location` over a trace, in one
/// call. For repeated traces of the same formula, build the automaton once
/// with [make_boolean_automaton] instead.
pub fn monitor_boolean_trace<G: SpatialGraph>(
    phi: &StrelTreeNode,
    label_fn: LabellingFn<G, bool>,
    max_locs: usize,
    ego_location: Location,
    trace: &[G],
) -> Result<bool, MonitorError> {
    let automaton = make_boolean_automaton(phi, label_fn, max_locs, None)?;
    Ok(automaton.check_run(ego_location, trace)?)
}
