//! The frozen symbolic transition table of a compiled automaton.
//!
//! Subformulae are interned once and addressed by a stable [ExprId]; the
//! transition of every state is a tagged [TransitionKind] descriptor shared by
//! all locations and interpreted against an input graph on demand. Derived
//! operators do not get descriptors of their own: an alias entry redirects
//! them to their kernel rewrite.

use crate::algebra::PolynomialManager;
use crate::automaton::LabellingFn;
use crate::errors::EvalError;
use crate::formulae::operator_enums::{Atomic, DistanceInterval};
use crate::formulae::strel_tree::{NodeType, StrelTreeNode};
use crate::spatial::reach_paths::all_reach_edge_paths;
use crate::spatial::{Location, SpatialGraph};

use std::collections::{BTreeMap, HashMap};

/// Stable identifier of an interned subformula.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExprId(u32);

/// One automaton state: an interned subformula paired with an ego location.
pub type AutomatonState = (ExprId, Location);

/// The one-step successor of a state, as data.
///
/// Operand identifiers refer to interned subformulae; the location dimension
/// is supplied when the descriptor is interpreted. `eval` below stands for the
/// recursive interpretation of the operand's own descriptor on the current
/// input, `var` for the operand's state variable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransitionKind {
    /// An atomic predicate: the labelling of the current input at the ego
    /// location.
    Label(String),
    /// `negate(eval(arg))`.
    Negation(ExprId),
    /// `eval(lhs) ⊗ eval(rhs)`.
    Conjunction(ExprId, ExprId),
    /// `eval(lhs) ⊕ eval(rhs)`.
    Disjunction(ExprId, ExprId),
    /// `var(target)`: the next input resolves the target by substitution.
    Successor(ExprId),
    /// `eval(arg) ⊕ var(tail)`; the untimed operator is its own tail
    /// (greatest-fixed-point form), a bounded one chains to its shrunk copy.
    Eventually { arg: ExprId, tail: ExprId },
    /// `eval(rhs) ⊕ (eval(lhs) ⊗ var(self))`; untimed only.
    Until { lhs: ExprId, rhs: ExprId },
    /// ⊕ over weight-bounded simple paths of the current input (see
    /// [all_reach_edge_paths]) of `eval(rhs)` at the path end ⊗ `eval(lhs)`
    /// at every location crossed.
    Reach {
        lhs: ExprId,
        rhs: ExprId,
        interval: DistanceInterval,
    },
}

/// Mapping from automaton states to their symbolic transitions, plus the
/// subformula alias rewrites. Built by the compiler in one pass, read-only
/// afterwards.
#[derive(Debug)]
pub struct TransitionTable {
    exprs: Vec<StrelTreeNode>,
    ids_by_key: HashMap<String, ExprId>,
    transitions: BTreeMap<ExprId, TransitionKind>,
    aliases: BTreeMap<ExprId, ExprId>,
    max_locs: usize,
    dist_attr: String,
}

impl TransitionTable {
    pub(crate) fn new(max_locs: usize, dist_attr: &str) -> TransitionTable {
        TransitionTable {
            exprs: Vec::new(),
            ids_by_key: HashMap::new(),
            transitions: BTreeMap::new(),
            aliases: BTreeMap::new(),
            max_locs,
            dist_attr: dist_attr.to_string(),
        }
    }

    /// Intern a subformula, returning the existing identifier if a formula
    /// with the same canonical string was interned before.
    pub(crate) fn intern(&mut self, node: &StrelTreeNode) -> ExprId {
        if let Some(id) = self.ids_by_key.get(&node.formula_str) {
            return *id;
        }
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(node.clone());
        self.ids_by_key.insert(node.formula_str.clone(), id);
        id
    }

    /// Install a transition descriptor; the first installation wins.
    pub(crate) fn install(&mut self, id: ExprId, kind: TransitionKind) {
        self.transitions.entry(id).or_insert(kind);
    }

    /// Record an alias rewrite; the first alias wins.
    pub(crate) fn add_alias(&mut self, from: ExprId, to: ExprId) {
        self.aliases.entry(from).or_insert(to);
    }

    /// True once `id` has either a transition or an alias; such formulae are
    /// skipped by the compiler on re-visits.
    pub(crate) fn is_processed(&self, id: ExprId) -> bool {
        self.transitions.contains_key(&id) || self.aliases.contains_key(&id)
    }

    /// Look up an interned subformula by its canonical string.
    pub fn lookup(&self, node: &StrelTreeNode) -> Option<ExprId> {
        self.ids_by_key.get(&node.formula_str).copied()
    }

    /// The interned subformula behind an identifier.
    pub fn expr(&self, id: ExprId) -> &StrelTreeNode {
        &self.exprs[id.0 as usize]
    }

    /// The alias target of `id`, if `id` is an alias source.
    pub fn aliased(&self, id: ExprId) -> Option<ExprId> {
        self.aliases.get(&id).copied()
    }

    /// Chase aliases to the identifier that actually owns a transition.
    /// Chains are acyclic by construction and at most a few hops deep.
    pub fn resolve(&self, id: ExprId) -> ExprId {
        let mut current = id;
        while let Some(target) = self.aliases.get(&current) {
            current = *target;
        }
        current
    }

    pub fn max_locations(&self) -> usize {
        self.max_locs
    }

    pub fn dist_attr(&self) -> &str {
        &self.dist_attr
    }

    /// All automaton states, ordered by subformula identifier then location.
    pub fn states(&self) -> Vec<AutomatonState> {
        self.transitions
            .keys()
            .flat_map(|id| (0..self.max_locs).map(move |loc| (*id, loc)))
            .collect()
    }

    /// The symbolic variable name of a state. Interned identifiers make the
    /// names short and stable; see [TransitionTable::describe_state] for the
    /// readable form.
    pub fn state_variable_name(&self, state: AutomatonState) -> String {
        format!("s{}_l{}", state.0.0, state.1)
    }

    /// Human-readable rendering of a state, for diagnostics.
    pub fn describe_state(&self, state: AutomatonState) -> String {
        format!("({}, {})", self.expr(state.0).formula_str, state.1)
    }

    /// The declared variable polynomial of a state, with alias chasing and
    /// analytic handling of constants.
    pub fn var_of<M: PolynomialManager>(
        &self,
        manager: &M,
        state: AutomatonState,
    ) -> Result<M::Poly, EvalError> {
        let (id, loc) = state;
        let id = self.resolve(id);
        match &self.expr(id).node_type {
            NodeType::Terminal(Atomic::True) => Ok(manager.top()),
            NodeType::Terminal(Atomic::False) => Ok(manager.bottom()),
            _ => manager.var(&self.state_variable_name((id, loc))),
        }
    }

    /// Evaluate the one-step symbolic successor of a state on an input graph.
    pub fn eval_transition<G, M>(
        &self,
        manager: &M,
        label_fn: &LabellingFn<G, M::Value>,
        input: &G,
        state: AutomatonState,
    ) -> Result<M::Poly, EvalError>
    where
        G: SpatialGraph,
        M: PolynomialManager,
    {
        let (id, loc) = state;
        let id = self.resolve(id);
        match &self.expr(id).node_type {
            NodeType::Terminal(Atomic::True) => return Ok(manager.top()),
            NodeType::Terminal(Atomic::False) => return Ok(manager.bottom()),
            NodeType::Terminal(Atomic::Prop(name)) => {
                return Ok(manager.constant(label_fn(input, loc, name)));
            }
            _ => {}
        }
        let kind = self.transitions.get(&id).ok_or_else(|| {
            EvalError::UnknownVariable(self.describe_state((id, loc)))
        })?;
        match kind {
            TransitionKind::Label(name) => Ok(manager.constant(label_fn(input, loc, name))),
            TransitionKind::Negation(arg) => {
                let inner = self.eval_transition(manager, label_fn, input, (*arg, loc))?;
                Ok(manager.negate(&inner))
            }
            TransitionKind::Conjunction(lhs, rhs) => {
                let left = self.eval_transition(manager, label_fn, input, (*lhs, loc))?;
                let right = self.eval_transition(manager, label_fn, input, (*rhs, loc))?;
                Ok(manager.mul(&left, &right))
            }
            TransitionKind::Disjunction(lhs, rhs) => {
                let left = self.eval_transition(manager, label_fn, input, (*lhs, loc))?;
                let right = self.eval_transition(manager, label_fn, input, (*rhs, loc))?;
                Ok(manager.add(&left, &right))
            }
            TransitionKind::Successor(target) => self.var_of(manager, (*target, loc)),
            TransitionKind::Eventually { arg, tail } => {
                let now = self.eval_transition(manager, label_fn, input, (*arg, loc))?;
                let later = self.var_of(manager, (*tail, loc))?;
                Ok(manager.add(&now, &later))
            }
            TransitionKind::Until { lhs, rhs } => {
                let release = self.eval_transition(manager, label_fn, input, (*rhs, loc))?;
                let hold = self.eval_transition(manager, label_fn, input, (*lhs, loc))?;
                let continuation = self.var_of(manager, (id, loc))?;
                Ok(manager.add(&release, &manager.mul(&hold, &continuation)))
            }
            TransitionKind::Reach {
                lhs,
                rhs,
                interval,
            } => self.eval_reach(manager, label_fn, input, loc, *lhs, *rhs, *interval),
        }
    }

    /// Assemble the reach expression: one summand per weight-bounded simple
    /// path, short-circuited as soon as the sum saturates to ⊤.
    #[allow(clippy::too_many_arguments)]
    fn eval_reach<G, M>(
        &self,
        manager: &M,
        label_fn: &LabellingFn<G, M::Value>,
        input: &G,
        loc: Location,
        lhs: ExprId,
        rhs: ExprId,
        interval: DistanceInterval,
    ) -> Result<M::Poly, EvalError>
    where
        G: SpatialGraph,
        M: PolynomialManager,
    {
        let mut expr = manager.bottom();
        for edge_path in
            all_reach_edge_paths(input, loc, interval.low(), interval.high(), &self.dist_attr)
        {
            let terminal = edge_path.last().map_or(loc, |(_, to, _)| *to);
            // the path end must satisfy the rhs, every location crossed on the
            // way (the ego location included) the lhs
            let mut path_expr = self.eval_transition(manager, label_fn, input, (rhs, terminal))?;
            let mut crossed: Vec<Location> = std::iter::once(loc)
                .chain(edge_path.iter().map(|(_, to, _)| *to))
                .collect();
            crossed.pop();
            for on_path in crossed.into_iter().rev() {
                let hold = self.eval_transition(manager, label_fn, input, (lhs, on_path))?;
                path_expr = manager.mul(&path_expr, &hold);
            }
            expr = manager.add(&expr, &path_expr);
            if manager.is_top(&expr) {
                return Ok(expr);
            }
        }
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulae::strel_tree::StrelTreeNode;

    #[test]
    /// Structurally equal subformulae intern to one identifier.
    fn interning_is_canonical() {
        let mut table = TransitionTable::new(2, "weight");
        let a = StrelTreeNode::mk_and(
            StrelTreeNode::mk_proposition("p"),
            StrelTreeNode::mk_proposition("q"),
        );
        let b = StrelTreeNode::mk_and(
            StrelTreeNode::mk_proposition("p"),
            StrelTreeNode::mk_proposition("q"),
        );
        let id_a = table.intern(&a);
        let id_b = table.intern(&b);
        assert_eq!(id_a, id_b);
        assert_eq!(table.expr(id_a).formula_str, a.formula_str);
        assert_eq!(table.lookup(&b), Some(id_a));
    }

    #[test]
    /// Alias chains resolve to the owning identifier.
    fn alias_resolution() {
        let mut table = TransitionTable::new(1, "weight");
        let p = table.intern(&StrelTreeNode::mk_proposition("p"));
        let q = table.intern(&StrelTreeNode::mk_proposition("q"));
        let r = table.intern(&StrelTreeNode::mk_proposition("r"));
        table.add_alias(q, p);
        table.add_alias(r, q);
        assert_eq!(table.resolve(r), p);
        assert_eq!(table.resolve(p), p);
        // the first alias wins
        table.add_alias(q, r);
        assert_eq!(table.aliased(q), Some(p));
    }

    #[test]
    /// State variable names are stable per (subformula, location).
    fn state_naming() {
        let mut table = TransitionTable::new(3, "weight");
        let p = table.intern(&StrelTreeNode::mk_proposition("p"));
        assert_eq!(table.state_variable_name((p, 2)), "s0_l2");
        assert_eq!(table.describe_state((p, 2)), "(p, 2)");
    }

    #[test]
    /// States enumerate the transition domain across all locations, in order.
    fn state_enumeration() {
        let mut table = TransitionTable::new(2, "weight");
        let p = table.intern(&StrelTreeNode::mk_proposition("p"));
        let q = table.intern(&StrelTreeNode::mk_proposition("q"));
        table.install(p, TransitionKind::Label("p".to_string()));
        table.install(q, TransitionKind::Label("q".to_string()));
        assert_eq!(table.states(), vec![(p, 0), (p, 1), (q, 0), (q, 1)]);
    }
}
