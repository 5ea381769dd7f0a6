//! The alternating automaton compiled from a STREL formula, and its trace
//! evaluation.

pub mod compiler;
pub mod transition_table;

use crate::algebra::PolynomialManager;
use crate::automaton::compiler::compile;
use crate::automaton::transition_table::{AutomatonState, ExprId, TransitionTable};
use crate::errors::{CompileError, EvalError};
use crate::formulae::operator_enums::{BinaryOp, UnaryOp};
use crate::formulae::strel_tree::{NodeType, StrelTreeNode};
use crate::spatial::{Location, SpatialGraph};

use std::collections::{HashMap, HashSet};

/// Maps an input graph, a location and a predicate name to a carrier value.
pub type LabellingFn<G, K> = Box<dyn Fn(&G, Location, &str) -> K>;

/// The default edge attribute under which distances are read.
pub const DEFAULT_DIST_ATTR: &str = "weight";

/// An alternating automaton over graph inputs, compiled from a STREL formula.
///
/// States are (subformula, location) pairs; the current configuration of a run
/// is a polynomial over the state variables. The automaton owns its polynomial
/// manager and is read-only after construction.
pub struct StrelAutomaton<G: SpatialGraph, M: PolynomialManager> {
    table: TransitionTable,
    manager: M,
    label_fn: LabellingFn<G, M::Value>,
    initial_expr: ExprId,
    accepting_states: HashSet<AutomatonState>,
    var_states: HashMap<String, AutomatonState>,
}

/// A state accepts a pending obligation iff its subformula is the negation of
/// an untimed eventually or until: the greatest-fixed-point shape whose
/// obligation may remain open forever.
fn is_accepting(node: &StrelTreeNode) -> bool {
    match &node.node_type {
        NodeType::Unary(UnaryOp::Not, child) => match &child.node_type {
            NodeType::Unary(UnaryOp::Eventually(interval), _) => {
                interval.is_none_or(|i| i.is_untimed())
            }
            NodeType::Binary(BinaryOp::Until(interval), _, _) => {
                interval.is_none_or(|i| i.is_untimed())
            }
            _ => false,
        },
        _ => false,
    }
}

impl<G: SpatialGraph, M: PolynomialManager> StrelAutomaton<G, M> {
    /// Compile a STREL expression into an automaton over `max_locs` locations.
    ///
    /// `label_fn` evaluates atomic predicates on input graphs; `dist_attr`
    /// names the edge attribute carrying distances (default
    /// [DEFAULT_DIST_ATTR]).
    pub fn from_strel_expr(
        phi: &StrelTreeNode,
        label_fn: LabellingFn<G, M::Value>,
        max_locs: usize,
        dist_attr: Option<&str>,
    ) -> Result<Self, CompileError> {
        let (table, initial_expr) = compile(phi, max_locs, dist_attr.unwrap_or(DEFAULT_DIST_ATTR))?;

        // all states are known, freeze the variable set
        let states = table.states();
        let names: Vec<String> = states
            .iter()
            .map(|state| table.state_variable_name(*state))
            .collect();
        let manager = M::with_variables(&names);

        let var_states = names.iter().cloned().zip(states.iter().copied()).collect();
        let accepting_states = states
            .into_iter()
            .filter(|(id, _)| is_accepting(table.expr(*id)))
            .collect();

        Ok(StrelAutomaton {
            table,
            manager,
            label_fn,
            initial_expr,
            accepting_states,
            var_states,
        })
    }

    /// All automaton states, ordered by subformula then location.
    pub fn states(&self) -> Vec<AutomatonState> {
        self.table.states()
    }

    pub fn accepting_states(&self) -> &HashSet<AutomatonState> {
        &self.accepting_states
    }

    pub fn transition_table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// The polynomial representation of the initial state at an ego location.
    pub fn initial_at(&self, loc: Location) -> Result<M::Poly, EvalError> {
        if loc >= self.table.max_locations() {
            return Err(EvalError::LocationOutOfRange {
                location: loc,
                max_locs: self.table.max_locations(),
            });
        }
        self.table.var_of(&self.manager, (self.initial_expr, loc))
    }

    /// The weights of the final states: ⊤ for accepting states, ⊥ otherwise,
    /// keyed by state variable name.
    pub fn final_mapping(&self) -> HashMap<String, M::Value> {
        self.table
            .states()
            .into_iter()
            .map(|state| {
                let value = if self.accepting_states.contains(&state) {
                    self.manager.top_value()
                } else {
                    self.manager.bottom_value()
                };
                (self.table.state_variable_name(state), value)
            })
            .collect()
    }

    /// One forward step: substitute every state variable of the current
    /// configuration with its transition on `input`.
    pub fn next(&self, input: &G, current: &M::Poly) -> Result<M::Poly, EvalError> {
        let mut substitution: HashMap<String, M::Poly> = HashMap::new();
        for name in self.manager.support(current) {
            let state = *self
                .var_states
                .get(&name)
                .ok_or_else(|| EvalError::UnknownVariable(name.clone()))?;
            let successor = self
                .table
                .eval_transition(&self.manager, &self.label_fn, input, state)?;
            substitution.insert(name, successor);
        }
        tracing::trace!("forward step substitutes {} state variables", substitution.len());
        self.manager.substitute(current, &substitution)
    }

    /// Evaluate the formula at `ego_location` over a finite trace.
    ///
    /// The empty trace evaluates the initial polynomial directly against the
    /// final mapping.
    pub fn check_run(&self, ego_location: Location, trace: &[G]) -> Result<M::Value, EvalError> {
        let mut state = self.initial_at(ego_location)?;
        for input in trace {
            state = self.next(input, &state)?;
        }
        self.manager.eval(&state, &self.final_mapping())
    }

    /// Evaluate the formula over a finite trace, consuming it back to front.
    ///
    /// This propagates concrete values instead of polynomials and is cheaper
    /// when configurations grow large, but it agrees with [Self::check_run]
    /// only on fragments whose verdict is determined by the final valuation
    /// alone (no strict liveness obligations); callers must pick the mode to
    /// match their fragment.
    pub fn check_run_reverse(
        &self,
        ego_location: Location,
        trace: &[G],
    ) -> Result<M::Value, EvalError> {
        let mut costs = self.final_mapping();
        for input in trace.iter().rev() {
            let mut previous: HashMap<String, M::Value> = HashMap::new();
            for state in self.table.states() {
                let successor =
                    self.table
                        .eval_transition(&self.manager, &self.label_fn, input, state)?;
                previous.insert(
                    self.table.state_variable_name(state),
                    self.manager.eval(&successor, &costs)?,
                );
            }
            costs = previous;
        }
        self.manager.eval(&self.initial_at(ego_location)?, &costs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::boolean::BddPolynomialManager;
    use crate::formulae::operator_enums::TimeInterval;
    use crate::spatial::signal_graph::{SignalGraph, UndirectedSignalGraph};

    type PropGraph = UndirectedSignalGraph<HashMap<String, bool>>;
    type BoolAutomaton = StrelAutomaton<PropGraph, BddPolynomialManager>;

    fn labeller() -> LabellingFn<PropGraph, bool> {
        Box::new(|graph, loc, name| graph.payload(loc).get(name).copied().unwrap_or(false))
    }

    fn two_location_line(p0: bool, p1: bool) -> PropGraph {
        let mut graph = SignalGraph::with_locations(vec![
            HashMap::from([("p".to_string(), p0)]),
            HashMap::from([("p".to_string(), p1)]),
        ]);
        graph.add_edge(0, 1, &[]);
        graph
    }

    fn automaton(phi: &StrelTreeNode) -> BoolAutomaton {
        StrelAutomaton::from_strel_expr(phi, labeller(), 2, None).unwrap()
    }

    #[test]
    /// Every transition only mentions declared state variables (variable
    /// closure), on every state and input.
    fn transitions_are_variable_closed() {
        let phi = StrelTreeNode::mk_until(
            StrelTreeNode::mk_proposition("p"),
            Some(TimeInterval::bounded(0, 2)),
            StrelTreeNode::mk_next(2, StrelTreeNode::mk_proposition("p")),
        );
        let automaton = automaton(&phi);
        let declared: HashSet<String> = automaton
            .states()
            .into_iter()
            .map(|state| automaton.transition_table().state_variable_name(state))
            .collect();

        let input = two_location_line(true, false);
        for state in automaton.states() {
            let successor = automaton
                .transition_table()
                .eval_transition(automaton.manager(), &automaton.label_fn, &input, state)
                .unwrap();
            for name in automaton.manager().support(&successor) {
                assert!(declared.contains(&name), "undeclared variable {name}");
            }
        }
    }

    #[test]
    /// Accepting states are exactly the negated untimed fixed points.
    fn accepting_states_shape() {
        let phi = StrelTreeNode::mk_globally(None, StrelTreeNode::mk_proposition("p"));
        let automaton = automaton(&phi);
        let table = automaton.transition_table();
        for (id, _) in automaton.accepting_states() {
            assert_eq!(table.expr(*id).formula_str, "(~(F (~p)))");
        }
        // one accepting expression, over both locations
        assert_eq!(automaton.accepting_states().len(), 2);

        // the final mapping follows acceptance
        let finals = automaton.final_mapping();
        let accepted: usize = finals.values().filter(|accepted| **accepted).count();
        assert_eq!(accepted, 2);
    }

    #[test]
    /// The ego location is range-checked.
    fn ego_location_range() {
        let automaton = automaton(&StrelTreeNode::mk_proposition("p"));
        assert!(automaton.initial_at(1).is_ok());
        assert_eq!(
            automaton.initial_at(2),
            Err(EvalError::LocationOutOfRange {
                location: 2,
                max_locs: 2
            })
        );
        assert_eq!(
            automaton.check_run(5, &[]),
            Err(EvalError::LocationOutOfRange {
                location: 5,
                max_locs: 2
            })
        );
    }

    #[test]
    /// The empty trace evaluates the initial polynomial against the final
    /// mapping.
    fn empty_trace() {
        // a plain predicate is not an accepting shape
        let prop_automaton = automaton(&StrelTreeNode::mk_proposition("p"));
        assert!(!prop_automaton.check_run(0, &[]).unwrap());

        // a safety formula accepts the empty trace vacuously
        let globally_automaton = automaton(&StrelTreeNode::mk_globally(
            None,
            StrelTreeNode::mk_proposition("p"),
        ));
        assert!(globally_automaton.check_run(0, &[]).unwrap());
    }

    #[test]
    /// A constant-rooted formula never introduces state variables.
    fn constant_formula() {
        let automaton = automaton(&StrelTreeNode::mk_constant(true));
        assert!(automaton.states().is_empty());
        let initial = automaton.initial_at(0).unwrap();
        assert!(automaton.manager().is_top(&initial));
        assert!(automaton.check_run(0, &[two_location_line(false, false)]).unwrap());
    }
}
