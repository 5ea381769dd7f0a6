//! The formula-to-automaton compiler.
//!
//! A single post-order pass over the syntax tree. Kernel operators (atomic
//! predicates, negation, conjunction, disjunction, next, untimed eventually,
//! untimed until, reach) get transition descriptors installed directly;
//! derived operators (globally, timed eventually/until, somewhere, everywhere)
//! are rewritten into kernel form, compiled, and recorded as aliases of their
//! rewrite. Escape is recognized and rejected.

use crate::automaton::transition_table::{ExprId, TransitionKind, TransitionTable};
use crate::errors::CompileError;
use crate::formulae::operator_enums::*;
use crate::formulae::strel_tree::{NodeType, StrelTreeNode};

/// Compile `phi` over `max_locs` locations; distances of reach transitions are
/// read under `dist_attr`. Returns the frozen table together with the
/// identifier of the root formula.
pub(crate) fn compile(
    phi: &StrelTreeNode,
    max_locs: usize,
    dist_attr: &str,
) -> Result<(TransitionTable, ExprId), CompileError> {
    if max_locs == 0 {
        return Err(CompileError::InvalidParameter(
            "a monitor needs at least one location".to_string(),
        ));
    }
    let mut compiler = FormulaCompiler {
        table: TransitionTable::new(max_locs, dist_attr),
    };
    let root = compiler.visit(phi)?;
    tracing::debug!(
        "compiled `{}` into {} automaton states",
        phi,
        compiler.table.states().len()
    );
    Ok((compiler.table, root))
}

/// Post-order visitor for creating transitions.
struct FormulaCompiler {
    table: TransitionTable,
}

impl FormulaCompiler {
    fn visit(&mut self, phi: &StrelTreeNode) -> Result<ExprId, CompileError> {
        // skip if phi was already processed through another occurrence
        if let Some(id) = self.table.lookup(phi) {
            if self.table.is_processed(id) {
                return Ok(id);
            }
        }
        match &phi.node_type {
            // constants carry no transition; they are handled analytically
            NodeType::Terminal(Atomic::True | Atomic::False) => Ok(self.table.intern(phi)),
            NodeType::Terminal(Atomic::Prop(name)) => {
                let id = self.table.intern(phi);
                self.table.install(id, TransitionKind::Label(name.clone()));
                Ok(id)
            }
            NodeType::Unary(op, child) => match op {
                UnaryOp::Not => {
                    let child_id = self.visit(child)?;
                    let id = self.table.intern(phi);
                    self.table.install(id, TransitionKind::Negation(child_id));
                    Ok(id)
                }
                UnaryOp::Next(steps) => {
                    if *steps == 0 {
                        return Err(CompileError::InvalidParameter(format!(
                            "`{phi}`: next requires at least one step"
                        )));
                    }
                    let child_id = self.visit(child)?;
                    Ok(self.expand_next(*steps, child, child_id))
                }
                UnaryOp::Eventually(interval) => {
                    check_time_interval(phi, interval)?;
                    let child_id = self.visit(child)?;
                    self.expand_eventually(phi, interval, child, child_id)
                }
                UnaryOp::Globally(interval) => {
                    // G[a,b] arg = ~F[a,b] ~arg
                    check_time_interval(phi, interval)?;
                    self.visit(child)?;
                    let id = self.table.intern(phi);
                    let rewrite = StrelTreeNode::mk_not(StrelTreeNode::mk_eventually(
                        *interval,
                        StrelTreeNode::mk_not(child.as_ref().clone()),
                    ));
                    let target = self.visit(&rewrite)?;
                    self.table.add_alias(id, target);
                    Ok(id)
                }
                UnaryOp::Somewhere(interval) => {
                    // somewhere[d1,d2] arg = True R[d1,d2] arg
                    check_distance_interval(phi, interval)?;
                    self.visit(child)?;
                    let id = self.table.intern(phi);
                    let rewrite = StrelTreeNode::mk_reach(
                        StrelTreeNode::mk_constant(true),
                        *interval,
                        child.as_ref().clone(),
                    );
                    let target = self.visit(&rewrite)?;
                    self.table.add_alias(id, target);
                    Ok(id)
                }
                UnaryOp::Everywhere(interval) => {
                    // everywhere[d1,d2] arg = ~somewhere[d1,d2] ~arg
                    check_distance_interval(phi, interval)?;
                    self.visit(child)?;
                    let id = self.table.intern(phi);
                    let rewrite = StrelTreeNode::mk_not(StrelTreeNode::mk_somewhere(
                        *interval,
                        StrelTreeNode::mk_not(child.as_ref().clone()),
                    ));
                    let target = self.visit(&rewrite)?;
                    self.table.add_alias(id, target);
                    Ok(id)
                }
                UnaryOp::Escape(_) => {
                    self.visit(child)?;
                    Err(CompileError::UnsupportedOperator("escape".to_string()))
                }
            },
            NodeType::Binary(op, left, right) => match op {
                BinaryOp::And => {
                    let left_id = self.visit(left)?;
                    let right_id = self.visit(right)?;
                    let id = self.table.intern(phi);
                    self.table
                        .install(id, TransitionKind::Conjunction(left_id, right_id));
                    Ok(id)
                }
                BinaryOp::Or => {
                    let left_id = self.visit(left)?;
                    let right_id = self.visit(right)?;
                    let id = self.table.intern(phi);
                    self.table
                        .install(id, TransitionKind::Disjunction(left_id, right_id));
                    Ok(id)
                }
                BinaryOp::Until(interval) => {
                    check_time_interval(phi, interval)?;
                    let left_id = self.visit(left)?;
                    let right_id = self.visit(right)?;
                    self.expand_until(phi, interval, left, right, left_id, right_id)
                }
                BinaryOp::Reach(interval) => {
                    check_distance_interval(phi, interval)?;
                    let left_id = self.visit(left)?;
                    let right_id = self.visit(right)?;
                    let id = self.table.intern(phi);
                    self.table.install(
                        id,
                        TransitionKind::Reach {
                            lhs: left_id,
                            rhs: right_id,
                            interval: *interval,
                        },
                    );
                    Ok(id)
                }
            },
        }
    }

    /// Expand `X[k] arg` as a chain `X[k] arg -> X[k-1] arg -> ... -> arg` of
    /// successor transitions.
    fn expand_next(&mut self, steps: u32, arg: &StrelTreeNode, arg_id: ExprId) -> ExprId {
        let mut chain_top = None;
        for i in (2..=steps).rev() {
            let expr = StrelTreeNode::mk_next(i, arg.clone());
            let sub = StrelTreeNode::mk_next(i - 1, arg.clone());
            let sub_id = self.table.intern(&sub);
            let id = self.table.intern(&expr);
            self.table.install(id, TransitionKind::Successor(sub_id));
            chain_top.get_or_insert(id);
        }
        let id = self.table.intern(&StrelTreeNode::mk_next(1, arg.clone()));
        self.table.install(id, TransitionKind::Successor(arg_id));
        chain_top.unwrap_or(id)
    }

    /// Expand an eventually node.
    ///
    /// `F arg` is its own greatest-fixed-point tail; `F[0,t] arg` unrolls into
    /// a chain of shrinking copies; a non-zero lower bound shifts the operator
    /// behind an `X[t]` prefix and records an alias.
    fn expand_eventually(
        &mut self,
        phi: &StrelTreeNode,
        interval: &Option<TimeInterval>,
        arg: &StrelTreeNode,
        arg_id: ExprId,
    ) -> Result<ExprId, CompileError> {
        let id = self.table.intern(phi);
        match interval {
            // F arg = arg | X F arg
            None => {
                self.table
                    .install(id, TransitionKind::Eventually { arg: arg_id, tail: id });
            }
            // `mk_*` constructors normalize untimed intervals away, but trees
            // built by hand may still carry them
            Some(i) if i.is_untimed() => {
                self.table
                    .install(id, TransitionKind::Eventually { arg: arg_id, tail: id });
            }
            Some(i) => match (i.low(), i.end) {
                // zero horizon: F[0,0] arg is arg itself
                (0, Some(0)) => {
                    self.table.add_alias(id, arg_id);
                }
                // F[0,t] arg = arg | X F[0,t-1] arg
                (0, Some(t2)) => {
                    for j in (1..=t2).rev() {
                        let expr = StrelTreeNode::mk_eventually(
                            Some(TimeInterval::bounded(0, j)),
                            arg.clone(),
                        );
                        let sub = if j > 1 {
                            let shrunk = StrelTreeNode::mk_eventually(
                                Some(TimeInterval::bounded(0, j - 1)),
                                arg.clone(),
                            );
                            self.table.intern(&shrunk)
                        } else {
                            arg_id
                        };
                        let expr_id = self.table.intern(&expr);
                        self.table
                            .install(expr_id, TransitionKind::Eventually { arg: arg_id, tail: sub });
                    }
                }
                // F[t1,] arg = X[t1] F arg
                (t1, None) => {
                    let rewrite = StrelTreeNode::mk_next(
                        t1,
                        StrelTreeNode::mk_eventually(None, arg.clone()),
                    );
                    let target = self.visit(&rewrite)?;
                    self.table.add_alias(id, target);
                }
                // F[t1,t2] arg = X[t1] F[0,t2-t1] arg
                (t1, Some(t2)) => {
                    let inner = if t2 > t1 {
                        StrelTreeNode::mk_eventually(
                            Some(TimeInterval::bounded(0, t2 - t1)),
                            arg.clone(),
                        )
                    } else {
                        arg.clone()
                    };
                    let rewrite = StrelTreeNode::mk_next(t1, inner);
                    let target = self.visit(&rewrite)?;
                    self.table.add_alias(id, target);
                }
            },
        }
        Ok(id)
    }

    /// Expand an until node.
    ///
    /// The untimed form is installed directly in its fixed-point shape; timed
    /// forms are rewritten:
    /// `lhs U[t1,] rhs = ~F[0,t1] ~(lhs U rhs)` and
    /// `lhs U[t1,t2] rhs = (F[t1,t2] rhs) & (lhs U[t1,] rhs)`.
    fn expand_until(
        &mut self,
        phi: &StrelTreeNode,
        interval: &Option<TimeInterval>,
        left: &StrelTreeNode,
        right: &StrelTreeNode,
        left_id: ExprId,
        right_id: ExprId,
    ) -> Result<ExprId, CompileError> {
        let id = self.table.intern(phi);
        match interval {
            // lhs U rhs = rhs | (lhs & X (lhs U rhs))
            None => {
                self.table.install(
                    id,
                    TransitionKind::Until {
                        lhs: left_id,
                        rhs: right_id,
                    },
                );
            }
            Some(i) if i.is_untimed() => {
                self.table.install(
                    id,
                    TransitionKind::Until {
                        lhs: left_id,
                        rhs: right_id,
                    },
                );
            }
            Some(i) => {
                let t1 = i.low();
                let rewrite = match i.end {
                    // lhs U[t1,] rhs = ~F[0,t1] ~(lhs U rhs)
                    None => StrelTreeNode::mk_not(StrelTreeNode::mk_eventually(
                        Some(TimeInterval::bounded(0, t1)),
                        StrelTreeNode::mk_not(StrelTreeNode::mk_until(
                            left.clone(),
                            None,
                            right.clone(),
                        )),
                    )),
                    // lhs U[t1,t2] rhs = (F[t1,t2] rhs) & (lhs U[t1,] rhs)
                    Some(_) => StrelTreeNode::mk_and(
                        StrelTreeNode::mk_eventually(Some(*i), right.clone()),
                        StrelTreeNode::mk_until(
                            left.clone(),
                            Some(TimeInterval::unbounded_from(t1)),
                            right.clone(),
                        ),
                    ),
                };
                let target = self.visit(&rewrite)?;
                self.table.add_alias(id, target);
            }
        }
        Ok(id)
    }
}

fn check_time_interval(
    phi: &StrelTreeNode,
    interval: &Option<TimeInterval>,
) -> Result<(), CompileError> {
    if let Some(TimeInterval {
        start: Some(start),
        end: Some(end),
    }) = interval
    {
        if start > end {
            return Err(CompileError::InvalidParameter(format!(
                "`{phi}`: interval start {start} exceeds end {end}"
            )));
        }
    }
    Ok(())
}

fn check_distance_interval(
    phi: &StrelTreeNode,
    interval: &DistanceInterval,
) -> Result<(), CompileError> {
    let (low, high) = (interval.low(), interval.high());
    if low.is_nan() || high.is_nan() {
        return Err(CompileError::InvalidParameter(format!(
            "`{phi}`: distance bounds must not be NaN"
        )));
    }
    if low < 0.0 {
        return Err(CompileError::InvalidParameter(format!(
            "`{phi}`: negative distance bound {low}"
        )));
    }
    if high < low {
        return Err(CompileError::InvalidParameter(format!(
            "`{phi}`: distance start {low} exceeds end {high}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn prop(name: &str) -> StrelTreeNode {
        StrelTreeNode::mk_proposition(name)
    }

    #[test]
    /// A bounded eventually unrolls into a chain of shrinking copies.
    fn bounded_eventually_chain() {
        let phi = StrelTreeNode::mk_eventually(Some(TimeInterval::bounded(0, 3)), prop("p"));
        let (table, root) = compile(&phi, 2, "weight").unwrap();

        for key in ["(F[0,3] p)", "(F[0,2] p)", "(F[0,1] p)", "p"] {
            let node = match key {
                "p" => prop("p"),
                "(F[0,1] p)" => {
                    StrelTreeNode::mk_eventually(Some(TimeInterval::bounded(0, 1)), prop("p"))
                }
                "(F[0,2] p)" => {
                    StrelTreeNode::mk_eventually(Some(TimeInterval::bounded(0, 2)), prop("p"))
                }
                _ => phi.clone(),
            };
            assert!(table.lookup(&node).is_some(), "missing state for {key}");
        }
        // 4 subformulae over 2 locations
        assert_eq!(table.states().len(), 8);
        assert_eq!(table.resolve(root), root);
    }

    #[test]
    /// The multi-step next expands into a successor chain.
    fn next_chain() {
        let phi = StrelTreeNode::mk_next(3, prop("p"));
        let (table, _) = compile(&phi, 1, "weight").unwrap();
        assert!(table.lookup(&StrelTreeNode::mk_next(2, prop("p"))).is_some());
        assert!(table.lookup(&StrelTreeNode::mk_next(1, prop("p"))).is_some());
        // X[3], X[2], X[1], p
        assert_eq!(table.states().len(), 4);
    }

    #[test]
    /// Derived operators are aliased to their kernel rewrites.
    fn derived_operators_alias() {
        let phi = StrelTreeNode::mk_globally(None, prop("p"));
        let (table, root) = compile(&phi, 1, "weight").unwrap();
        let target = table.resolve(root);
        assert_ne!(target, root);
        assert_eq!(table.expr(target).formula_str, "(~(F (~p)))");

        let phi = StrelTreeNode::mk_somewhere(DistanceInterval::bounded(0.0, 1.0), prop("q"));
        let (table, root) = compile(&phi, 1, "weight").unwrap();
        assert_eq!(
            table.expr(table.resolve(root)).formula_str,
            "(True R[0,1] q)"
        );
    }

    #[test]
    /// Aliases never form cycles.
    fn alias_acyclicity() {
        let phi = StrelTreeNode::mk_until(
            StrelTreeNode::mk_globally(None, prop("p")),
            Some(TimeInterval::bounded(1, 3)),
            StrelTreeNode::mk_everywhere(DistanceInterval::bounded(0.0, 2.0), prop("q")),
        );
        let (table, root) = compile(&phi, 2, "weight").unwrap();
        let mut frontier = vec![root];
        frontier.extend(table.states().iter().map(|(id, _)| *id));
        for mut id in frontier {
            let mut seen = HashSet::new();
            while let Some(target) = table.aliased(id) {
                assert!(seen.insert(id), "alias cycle through {:?}", id);
                id = target;
            }
        }
    }

    #[test]
    /// A zero-horizon eventually collapses onto its argument.
    fn zero_horizon_eventually() {
        let phi = StrelTreeNode::mk_eventually(Some(TimeInterval::bounded(0, 0)), prop("p"));
        let (table, root) = compile(&phi, 1, "weight").unwrap();
        let target = table.resolve(root);
        assert_eq!(table.expr(target).formula_str, "p");
    }

    #[test]
    /// Escape is recognized but rejected.
    fn escape_is_rejected() {
        let phi = StrelTreeNode::mk_escape(DistanceInterval::bounded(0.0, 2.0), prop("p"));
        assert_eq!(
            compile(&phi, 2, "weight").unwrap_err(),
            CompileError::UnsupportedOperator("escape".to_string())
        );
        // also when nested
        let nested = StrelTreeNode::mk_and(prop("q"), phi);
        assert!(matches!(
            compile(&nested, 2, "weight"),
            Err(CompileError::UnsupportedOperator(_))
        ));
    }

    #[test]
    /// Structural parameters are validated.
    fn invalid_parameters() {
        let phi = prop("p");
        assert!(matches!(
            compile(&phi, 0, "weight"),
            Err(CompileError::InvalidParameter(_))
        ));

        let phi = StrelTreeNode::mk_next(0, prop("p"));
        assert!(matches!(
            compile(&phi, 1, "weight"),
            Err(CompileError::InvalidParameter(_))
        ));

        let phi = StrelTreeNode::mk_eventually(Some(TimeInterval::bounded(3, 1)), prop("p"));
        assert!(matches!(
            compile(&phi, 1, "weight"),
            Err(CompileError::InvalidParameter(_))
        ));

        let phi = StrelTreeNode::mk_reach(
            prop("p"),
            DistanceInterval::bounded(2.0, 1.0),
            prop("q"),
        );
        assert!(matches!(
            compile(&phi, 1, "weight"),
            Err(CompileError::InvalidParameter(_))
        ));

        let phi = StrelTreeNode::mk_somewhere(DistanceInterval::bounded(-1.0, 1.0), prop("p"));
        assert!(matches!(
            compile(&phi, 1, "weight"),
            Err(CompileError::InvalidParameter(_))
        ));
    }

    #[test]
    /// Shared subformulae are compiled once.
    fn shared_subformulae_compile_once() {
        let shared = StrelTreeNode::mk_and(prop("p"), prop("q"));
        let phi = StrelTreeNode::mk_or(
            StrelTreeNode::mk_next(1, shared.clone()),
            StrelTreeNode::mk_eventually(None, shared.clone()),
        );
        let (table, _) = compile(&phi, 1, "weight").unwrap();
        // p, q, (p & q), X(p & q), F(p & q), the root disjunction
        assert_eq!(table.states().len(), 6);
    }
}
