use crate::_test_monitoring::_test_util::*;
use crate::formulae::operator_enums::{DistanceInterval, TimeInterval};
use crate::formulae::strel_tree::StrelTreeNode;
use crate::monitoring::make_boolean_automaton;
use crate::spatial::signal_graph::SignalGraph;

use rand::prelude::StdRng;
use rand::{RngCore, SeedableRng};

use std::collections::HashMap;

const LOCS: usize = 3;

/// A random trace of unit-weight line graphs over `LOCS` locations.
fn random_line_trace(props: &[&str], steps: usize, seed: u64) -> Vec<PropGraph> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..steps)
        .map(|_| {
            let payloads: Vec<PropMap> = (0..LOCS)
                .map(|_| {
                    props
                        .iter()
                        .map(|name| (name.to_string(), rng.next_u32() % 2 == 0))
                        .collect::<HashMap<_, _>>()
                })
                .collect();
            let mut graph = SignalGraph::with_locations(payloads);
            for loc in 1..LOCS {
                graph.add_edge(loc - 1, loc, &[]);
            }
            graph
        })
        .collect()
}

/// Assert forward/reverse agreement of `phi` on every ego location of a
/// couple of seeded random traces.
fn assert_modes_agree(phi: &StrelTreeNode, seed: u64) {
    let automaton = make_boolean_automaton(phi, bool_labeller(), LOCS, None).unwrap();
    for trace_seed in 0..4u64 {
        let trace = random_line_trace(&["p", "q", "r"], 4, seed ^ (trace_seed << 16));
        for ego in 0..LOCS {
            let forward = automaton.check_run(ego, &trace).unwrap();
            let reverse = automaton.check_run_reverse(ego, &trace).unwrap();
            assert_eq!(
                forward, reverse,
                "modes disagree for `{phi}` at location {ego}"
            );
        }
    }
}

#[test]
/// Forward and reverse evaluation agree on propositional formulae.
fn agreement_propositional() {
    let phi = StrelTreeNode::mk_or(
        StrelTreeNode::mk_and(
            StrelTreeNode::mk_proposition("p"),
            StrelTreeNode::mk_not(StrelTreeNode::mk_proposition("q")),
        ),
        StrelTreeNode::mk_proposition("r"),
    );
    assert_modes_agree(&phi, 11);
}

#[test]
/// Forward and reverse evaluation agree on nested next operators.
fn agreement_next() {
    let phi = StrelTreeNode::mk_next(
        2,
        StrelTreeNode::mk_and(
            StrelTreeNode::mk_proposition("p"),
            StrelTreeNode::mk_next(1, StrelTreeNode::mk_proposition("q")),
        ),
    );
    assert_modes_agree(&phi, 23);
}

#[test]
/// Forward and reverse evaluation agree on bounded eventually.
fn agreement_bounded_eventually() {
    let phi = StrelTreeNode::mk_eventually(
        Some(TimeInterval::bounded(0, 2)),
        StrelTreeNode::mk_or(
            StrelTreeNode::mk_proposition("p"),
            StrelTreeNode::mk_proposition("q"),
        ),
    );
    assert_modes_agree(&phi, 37);
}

#[test]
/// Forward and reverse evaluation agree on the spatial operators.
fn agreement_spatial() {
    let phi = StrelTreeNode::mk_reach(
        StrelTreeNode::mk_proposition("p"),
        DistanceInterval::bounded(0.0, 2.0),
        StrelTreeNode::mk_proposition("q"),
    );
    assert_modes_agree(&phi, 41);

    let phi = StrelTreeNode::mk_somewhere(
        DistanceInterval::bounded(0.0, 1.0),
        StrelTreeNode::mk_proposition("q"),
    );
    assert_modes_agree(&phi, 43);

    let phi = StrelTreeNode::mk_everywhere(
        DistanceInterval::bounded(0.0, 1.0),
        StrelTreeNode::mk_proposition("p"),
    );
    assert_modes_agree(&phi, 47);
}

#[test]
/// Forward and reverse evaluation agree on combined spatio-temporal formulae
/// from the sound fragment.
fn agreement_combined() {
    let phi = StrelTreeNode::mk_eventually(
        Some(TimeInterval::bounded(0, 3)),
        StrelTreeNode::mk_somewhere(
            DistanceInterval::bounded(0.0, 2.0),
            StrelTreeNode::mk_and(
                StrelTreeNode::mk_proposition("p"),
                StrelTreeNode::mk_not(StrelTreeNode::mk_proposition("r")),
            ),
        ),
    );
    assert_modes_agree(&phi, 53);

    let phi = StrelTreeNode::mk_next(
        1,
        StrelTreeNode::mk_everywhere(
            DistanceInterval::bounded(0.0, 1.0),
            StrelTreeNode::mk_or(
                StrelTreeNode::mk_proposition("p"),
                StrelTreeNode::mk_proposition("q"),
            ),
        ),
    );
    assert_modes_agree(&phi, 59);
}

#[test]
/// Forward and reverse evaluation agree on seeded random Boolean formulae
/// under temporal wrappers.
fn agreement_random_boolean() {
    let props = vec!["p".to_string(), "q".to_string(), "r".to_string()];
    for seed in 0..8u64 {
        let base = StrelTreeNode::new_random_boolean(3, &props, seed);
        assert_modes_agree(&base, seed);

        let wrapped = StrelTreeNode::mk_eventually(
            Some(TimeInterval::bounded(0, 2)),
            StrelTreeNode::mk_next(1, base),
        );
        assert_modes_agree(&wrapped, seed);
    }
}
