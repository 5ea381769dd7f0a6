//! A syntax tree struct for STREL formulae and functionality for its manipulation.

use crate::formulae::operator_enums::*;

use rand::prelude::StdRng;
use rand::{RngCore, SeedableRng};
use std::cmp;
use std::collections::HashSet;
use std::fmt;

/// Enum of possible node data types in a STREL formula syntax tree.
///
/// In particular, a node type can be:
///     - A "terminal" node, containing a single atomic value (predicate or constant).
///     - A "unary" node, with a `UnaryOp` and a sub-formula.
///     - A "binary" node, with a `BinaryOp` and two sub-formulae.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum NodeType {
    Terminal(Atomic),
    Unary(UnaryOp, Box<StrelTreeNode>),
    Binary(BinaryOp, Box<StrelTreeNode>, Box<StrelTreeNode>),
}

/// A single node in a syntax tree of a STREL formula.
///
/// Each node tracks its:
///     - `formula_str`; A canonical string representation of the formula, which is
///       used for uniqueness testing of subformulae during compilation.
///     - `height`; A positive integer starting from 0 (for atomic predicates).
///     - `node_type`; A collection of node data represented through `NodeType`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct StrelTreeNode {
    pub formula_str: String,
    pub height: u32,
    pub node_type: NodeType,
}

/// Bring `[0, unbounded)` intervals (in all their spellings) to the `None`
/// form, and missing lower bounds to an explicit 0, so that equivalent
/// operators share one canonical string.
fn normalize_interval(interval: Option<TimeInterval>) -> Option<TimeInterval> {
    match interval {
        Some(i) if i.is_untimed() => None,
        Some(TimeInterval { start: None, end }) => Some(TimeInterval::new(Some(0), end)),
        other => other,
    }
}

impl StrelTreeNode {
    /// Create a "unary" [StrelTreeNode] from the given arguments.
    ///
    /// See also [NodeType::Unary].
    pub fn mk_unary(child: StrelTreeNode, op: UnaryOp) -> StrelTreeNode {
        let formula_str = if matches!(op, UnaryOp::Not) {
            format!("({op}{child})")
        } else {
            format!("({op} {child})")
        };
        StrelTreeNode {
            formula_str,
            height: child.height + 1,
            node_type: NodeType::Unary(op, Box::new(child)),
        }
    }

    /// Create a "binary" [StrelTreeNode] from the given arguments.
    ///
    /// See also [NodeType::Binary].
    pub fn mk_binary(left: StrelTreeNode, right: StrelTreeNode, op: BinaryOp) -> StrelTreeNode {
        StrelTreeNode {
            formula_str: format!("({left} {op} {right})"),
            height: cmp::max(left.height, right.height) + 1,
            node_type: NodeType::Binary(op, Box::new(left), Box::new(right)),
        }
    }

    /// Create a [StrelTreeNode] representing a Boolean constant.
    pub fn mk_constant(constant_val: bool) -> StrelTreeNode {
        Self::mk_atom(Atomic::from(constant_val))
    }

    /// Create a [StrelTreeNode] representing an atomic predicate.
    pub fn mk_proposition(prop_name: &str) -> StrelTreeNode {
        Self::mk_atom(Atomic::Prop(prop_name.to_string()))
    }

    /// Create a negation node.
    pub fn mk_not(child: StrelTreeNode) -> StrelTreeNode {
        Self::mk_unary(child, UnaryOp::Not)
    }

    /// Create a conjunction node.
    pub fn mk_and(left: StrelTreeNode, right: StrelTreeNode) -> StrelTreeNode {
        Self::mk_binary(left, right, BinaryOp::And)
    }

    /// Create a disjunction node.
    pub fn mk_or(left: StrelTreeNode, right: StrelTreeNode) -> StrelTreeNode {
        Self::mk_binary(left, right, BinaryOp::Or)
    }

    /// Create a `steps`-fold next node; the untimed next is `steps = 1`.
    /// The compiler rejects `steps = 0`.
    pub fn mk_next(steps: u32, child: StrelTreeNode) -> StrelTreeNode {
        Self::mk_unary(child, UnaryOp::Next(steps))
    }

    /// Create an eventually node; `None` or an untimed interval both give the
    /// untimed operator.
    pub fn mk_eventually(interval: Option<TimeInterval>, child: StrelTreeNode) -> StrelTreeNode {
        Self::mk_unary(child, UnaryOp::Eventually(normalize_interval(interval)))
    }

    /// Create a globally node; `None` or an untimed interval both give the
    /// untimed operator.
    pub fn mk_globally(interval: Option<TimeInterval>, child: StrelTreeNode) -> StrelTreeNode {
        Self::mk_unary(child, UnaryOp::Globally(normalize_interval(interval)))
    }

    /// Create an until node; `None` or an untimed interval both give the
    /// untimed operator.
    pub fn mk_until(
        left: StrelTreeNode,
        interval: Option<TimeInterval>,
        right: StrelTreeNode,
    ) -> StrelTreeNode {
        Self::mk_binary(left, right, BinaryOp::Until(normalize_interval(interval)))
    }

    /// Create a somewhere node over the given distance interval.
    pub fn mk_somewhere(interval: DistanceInterval, child: StrelTreeNode) -> StrelTreeNode {
        Self::mk_unary(child, UnaryOp::Somewhere(interval))
    }

    /// Create an everywhere node over the given distance interval.
    pub fn mk_everywhere(interval: DistanceInterval, child: StrelTreeNode) -> StrelTreeNode {
        Self::mk_unary(child, UnaryOp::Everywhere(interval))
    }

    /// Create a reach node over the given distance interval.
    pub fn mk_reach(
        left: StrelTreeNode,
        interval: DistanceInterval,
        right: StrelTreeNode,
    ) -> StrelTreeNode {
        Self::mk_binary(left, right, BinaryOp::Reach(interval))
    }

    /// Create an escape node over the given distance interval.
    /// The compiler recognizes escape but rejects it.
    pub fn mk_escape(interval: DistanceInterval, child: StrelTreeNode) -> StrelTreeNode {
        Self::mk_unary(child, UnaryOp::Escape(interval))
    }

    /// A helper function which creates a new [StrelTreeNode] for the given [Atomic] value.
    fn mk_atom(atom: Atomic) -> StrelTreeNode {
        StrelTreeNode {
            formula_str: atom.to_string(),
            height: 0,
            node_type: NodeType::Terminal(atom),
        }
    }

    /// Compute the set of all uniquely named atomic predicates in the formula tree.
    /// A labelling function must provide a value for each of them.
    pub fn collect_unique_propositions(&self) -> HashSet<String> {
        let mut props = HashSet::new();
        self.collect_propositions_rec(&mut props);
        props
    }

    fn collect_propositions_rec(&self, props: &mut HashSet<String>) {
        match &self.node_type {
            NodeType::Terminal(Atomic::Prop(name)) => {
                props.insert(name.clone());
            }
            NodeType::Terminal(_) => {}
            NodeType::Unary(_, child) => child.collect_propositions_rec(props),
            NodeType::Binary(_, left, right) => {
                left.collect_propositions_rec(props);
                right.collect_propositions_rec(props);
            }
        }
    }

    /// Create a new random tree containing Boolean operations and predicates. The `tree_height`
    /// is the number of levels in the tree (not counting random negation nodes between each
    /// "level"). The number of leaves will be `2^tree_height`.
    pub fn new_random_boolean(
        tree_height: u8,
        propositions: &[String],
        seed: u64,
    ) -> StrelTreeNode {
        let num_props = propositions.len() as u32;
        let mut rand = StdRng::seed_from_u64(seed);

        if tree_height <= 1 {
            let prop_index = rand.next_u32() % num_props;
            let prop = &propositions[prop_index as usize];
            return StrelTreeNode::mk_proposition(prop);
        }

        let binary_op = match rand.next_u32() % 2 {
            0 => BinaryOp::And,
            _ => BinaryOp::Or,
        };

        let binary_node = StrelTreeNode::mk_binary(
            StrelTreeNode::new_random_boolean(tree_height - 1, propositions, rand.next_u64()),
            StrelTreeNode::new_random_boolean(tree_height - 1, propositions, rand.next_u64()),
            binary_op,
        );

        let negate = rand.next_u32() % 2 == 0;
        if negate {
            StrelTreeNode::mk_not(binary_node)
        } else {
            binary_node
        }
    }
}

impl StrelTreeNode {
    pub fn as_str(&self) -> &str {
        self.formula_str.as_str()
    }
}

impl fmt::Display for StrelTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.formula_str)
    }
}

#[cfg(test)]
mod tests {
    use crate::formulae::operator_enums::{DistanceInterval, TimeInterval};
    use crate::formulae::strel_tree::StrelTreeNode;

    #[test]
    /// Test creation and display of STREL tree nodes.
    fn tree_generating() {
        // formula containing all kinds of supported operators and terminals
        let phi = StrelTreeNode::mk_until(
            StrelTreeNode::mk_not(StrelTreeNode::mk_proposition("p")),
            Some(TimeInterval::bounded(1, 3)),
            StrelTreeNode::mk_somewhere(
                DistanceInterval::bounded(0.0, 2.0),
                StrelTreeNode::mk_and(
                    StrelTreeNode::mk_proposition("q"),
                    StrelTreeNode::mk_constant(true),
                ),
            ),
        );
        assert_eq!(
            phi.to_string(),
            "((~p) U[1,3] (somewhere[0,2] (q & True)))"
        );
        assert_eq!(phi.height, 3);

        let psi = StrelTreeNode::mk_next(
            2,
            StrelTreeNode::mk_reach(
                StrelTreeNode::mk_proposition("p"),
                DistanceInterval::unbounded(),
                StrelTreeNode::mk_proposition("q"),
            ),
        );
        assert_eq!(psi.to_string(), "(X[2] (p R[0,inf] q))");
    }

    #[test]
    /// Structurally equal formulae built independently must share one canonical key.
    fn canonical_key_identity() {
        let a = StrelTreeNode::mk_eventually(
            None,
            StrelTreeNode::mk_or(
                StrelTreeNode::mk_proposition("a"),
                StrelTreeNode::mk_proposition("b"),
            ),
        );
        let b = StrelTreeNode::mk_eventually(
            Some(TimeInterval::new(None, None)),
            StrelTreeNode::mk_or(
                StrelTreeNode::mk_proposition("a"),
                StrelTreeNode::mk_proposition("b"),
            ),
        );
        // `[0, unbounded)` spellings normalize away
        assert_eq!(a, b);
        assert_eq!(a.formula_str, b.formula_str);

        // missing lower bounds normalize to 0
        let c = StrelTreeNode::mk_until(
            StrelTreeNode::mk_proposition("a"),
            Some(TimeInterval::new(None, Some(4))),
            StrelTreeNode::mk_proposition("b"),
        );
        let d = StrelTreeNode::mk_until(
            StrelTreeNode::mk_proposition("a"),
            Some(TimeInterval::bounded(0, 4)),
            StrelTreeNode::mk_proposition("b"),
        );
        assert_eq!(c.formula_str, d.formula_str);
    }

    #[test]
    /// Test collection of atomic predicate names.
    fn proposition_collection() {
        let phi = StrelTreeNode::mk_and(
            StrelTreeNode::mk_globally(None, StrelTreeNode::mk_proposition("safe")),
            StrelTreeNode::mk_somewhere(
                DistanceInterval::bounded(0.0, 1.0),
                StrelTreeNode::mk_or(
                    StrelTreeNode::mk_proposition("alive"),
                    StrelTreeNode::mk_proposition("safe"),
                ),
            ),
        );
        let props = phi.collect_unique_propositions();
        assert_eq!(props.len(), 2);
        assert!(props.contains("safe"));
        assert!(props.contains("alive"));
    }

    #[test]
    /// The random generator is deterministic in the seed.
    fn random_boolean_trees() {
        let props = vec!["p".to_string(), "q".to_string(), "r".to_string()];
        let t1 = StrelTreeNode::new_random_boolean(3, &props, 7);
        let t2 = StrelTreeNode::new_random_boolean(3, &props, 7);
        assert_eq!(t1, t2);
        assert!(t1.collect_unique_propositions().is_subset(
            &props.iter().cloned().collect()
        ));
    }
}
