use crate::_test_monitoring::_test_util::*;
use crate::errors::MonitorError;
use crate::formulae::operator_enums::{DistanceInterval, TimeInterval};
use crate::formulae::strel_tree::StrelTreeNode;
use crate::monitoring::{make_boolean_automaton, monitor_boolean_trace};

fn prop(name: &str) -> StrelTreeNode {
    StrelTreeNode::mk_proposition(name)
}

#[test]
/// An atomic predicate holds exactly where the labelling says so.
fn scenario_atomic_predicate() {
    let graph = line_graph(&[&["p"], &[], &[]]);
    let automaton = make_boolean_automaton(&prop("p"), bool_labeller(), 3, None).unwrap();
    assert!(automaton.check_run(0, std::slice::from_ref(&graph)).unwrap());
    assert!(!automaton.check_run(1, std::slice::from_ref(&graph)).unwrap());
}

#[test]
/// `X p` looks at the second input of the trace.
fn scenario_next() {
    let trace = line_trace(&[
        &[&[], &[], &[]],
        &[&["p"], &[], &[]],
    ]);
    let phi = StrelTreeNode::mk_next(1, prop("p"));
    let automaton = make_boolean_automaton(&phi, bool_labeller(), 3, None).unwrap();
    assert!(automaton.check_run(0, &trace).unwrap());
}

#[test]
/// A bounded eventually sees exactly as far as its horizon.
fn scenario_bounded_eventually() {
    // p at location 0 only on the third input
    let trace = line_trace(&[
        &[&[], &[], &[]],
        &[&[], &[], &[]],
        &[&["p"], &[], &[]],
    ]);

    let within_two = StrelTreeNode::mk_eventually(Some(TimeInterval::bounded(0, 2)), prop("p"));
    let automaton = make_boolean_automaton(&within_two, bool_labeller(), 3, None).unwrap();
    assert!(automaton.check_run(0, &trace).unwrap());

    let within_one = StrelTreeNode::mk_eventually(Some(TimeInterval::bounded(0, 1)), prop("p"));
    let automaton = make_boolean_automaton(&within_one, bool_labeller(), 3, None).unwrap();
    assert!(!automaton.check_run(0, &trace).unwrap());
}

#[test]
/// `p U q` holds when `p` carries the run until `q` fires.
fn scenario_until() {
    let trace = line_trace(&[
        &[&["p"], &[], &[]],
        &[&["p"], &[], &[]],
        &[&["q"], &[], &[]],
    ]);
    let phi = StrelTreeNode::mk_until(prop("p"), None, prop("q"));
    let automaton = make_boolean_automaton(&phi, bool_labeller(), 3, None).unwrap();
    assert!(automaton.check_run(0, &trace).unwrap());

    // without the release, the obligation stays open and the run fails
    let no_release = line_trace(&[
        &[&["p"], &[], &[]],
        &[&["p"], &[], &[]],
        &[&["p"], &[], &[]],
    ]);
    assert!(!automaton.check_run(0, &no_release).unwrap());
}

#[test]
/// `somewhere[0,1] q` finds `q` one hop away but not two.
fn scenario_somewhere() {
    let phi = StrelTreeNode::mk_somewhere(DistanceInterval::bounded(0.0, 1.0), prop("q"));
    let automaton = make_boolean_automaton(&phi, bool_labeller(), 3, None).unwrap();

    let one_hop = line_graph(&[&[], &["q"], &[]]);
    assert!(automaton.check_run(0, &[one_hop]).unwrap());

    let two_hops = line_graph(&[&[], &[], &["q"]]);
    assert!(!automaton.check_run(0, &[two_hops]).unwrap());
}

#[test]
/// `everywhere[0,1] p` requires `p` on the whole neighbourhood.
fn scenario_everywhere() {
    let phi = StrelTreeNode::mk_everywhere(DistanceInterval::bounded(0.0, 1.0), prop("p"));
    let automaton = make_boolean_automaton(&phi, bool_labeller(), 3, None).unwrap();

    let all = line_graph(&[&["p"], &["p"], &["p"]]);
    assert!(automaton.check_run(1, &[all]).unwrap());

    let gap = line_graph(&[&["p"], &["p"], &[]]);
    assert!(!automaton.check_run(1, &[gap]).unwrap());
}

#[test]
/// `p R[0,2] q`: a path within distance 2 whose interior satisfies `p` and
/// whose end satisfies `q`.
fn scenario_reach() {
    let phi = StrelTreeNode::mk_reach(prop("p"), DistanceInterval::bounded(0.0, 2.0), prop("q"));
    let automaton = make_boolean_automaton(&phi, bool_labeller(), 3, None).unwrap();

    // path 0 -> 1 -> 2 of weight 2
    let reachable = line_graph(&[&["p"], &["p"], &["q"]]);
    assert!(automaton.check_run(0, &[reachable]).unwrap());

    // breaking the carrier predicate on the way breaks the path
    let broken = line_graph(&[&["p"], &[], &["q"]]);
    assert!(!automaton.check_run(0, &[broken]).unwrap());
}

#[test]
/// With a zero lower bound, reach always considers the ego location alone.
fn reach_zero_length_path() {
    let phi = StrelTreeNode::mk_reach(prop("p"), DistanceInterval::bounded(0.0, 0.0), prop("q"));
    let automaton = make_boolean_automaton(&phi, bool_labeller(), 3, None).unwrap();

    let q_at_ego = line_graph(&[&["q"], &[], &[]]);
    assert!(automaton.check_run(0, &[q_at_ego]).unwrap());

    let q_elsewhere = line_graph(&[&[], &["q"], &[]]);
    assert!(!automaton.check_run(0, &[q_elsewhere]).unwrap());
}

#[test]
/// An untimed eventually over an all-false trace stays unfulfilled.
fn untimed_eventually_all_false() {
    let phi = StrelTreeNode::mk_eventually(None, prop("p"));
    let automaton = make_boolean_automaton(&phi, bool_labeller(), 2, None).unwrap();
    let trace = line_trace(&[&[&[], &[]], &[&[], &[]], &[&[], &[]]]);
    assert!(!automaton.check_run(0, &trace).unwrap());

    // fulfilling it anywhere along the trace flips the verdict
    let trace = line_trace(&[&[&[], &[]], &[&["p"], &[]], &[&[], &[]]]);
    assert!(automaton.check_run(0, &trace).unwrap());
}

#[test]
/// An untimed globally over an all-true trace is satisfied.
fn untimed_globally_all_true() {
    let phi = StrelTreeNode::mk_globally(None, prop("p"));
    let automaton = make_boolean_automaton(&phi, bool_labeller(), 2, None).unwrap();
    let trace = line_trace(&[&[&["p"], &[]], &[&["p"], &[]], &[&["p"], &[]]]);
    assert!(automaton.check_run(0, &trace).unwrap());

    let trace = line_trace(&[&[&["p"], &[]], &[&[], &[]], &[&["p"], &[]]]);
    assert!(!automaton.check_run(0, &trace).unwrap());
}

#[test]
/// Timed lower bounds shift the evaluation window.
fn shifted_eventually_window() {
    // p at location 0 only on the third input (time step 2)
    let trace = line_trace(&[
        &[&[], &[]],
        &[&[], &[]],
        &[&["p"], &[]],
    ]);

    let phi = StrelTreeNode::mk_eventually(Some(TimeInterval::bounded(2, 2)), prop("p"));
    let automaton = make_boolean_automaton(&phi, bool_labeller(), 2, None).unwrap();
    assert!(automaton.check_run(0, &trace).unwrap());

    let phi = StrelTreeNode::mk_eventually(Some(TimeInterval::bounded(1, 1)), prop("p"));
    let automaton = make_boolean_automaton(&phi, bool_labeller(), 2, None).unwrap();
    assert!(!automaton.check_run(0, &trace).unwrap());
}

#[test]
/// A timed until needs its release inside the window and the carrier before.
fn timed_until_window() {
    let phi = StrelTreeNode::mk_until(
        prop("p"),
        Some(TimeInterval::bounded(1, 2)),
        prop("q"),
    );
    let automaton = make_boolean_automaton(&phi, bool_labeller(), 2, None).unwrap();

    let inside = line_trace(&[
        &[&["p"], &[]],
        &[&["p", "q"], &[]],
        &[&[], &[]],
    ]);
    assert!(automaton.check_run(0, &inside).unwrap());

    // the release before the window does not count
    let too_early = line_trace(&[
        &[&["q"], &[]],
        &[&[], &[]],
        &[&[], &[]],
    ]);
    assert!(!automaton.check_run(0, &too_early).unwrap());
}

#[test]
/// The one-shot helper compiles and evaluates in a single call, and surfaces
/// compile failures.
fn one_shot_monitoring() {
    let graph = line_graph(&[&["p"], &[], &[]]);
    let verdict =
        monitor_boolean_trace(&prop("p"), bool_labeller(), 3, 0, &[graph]).unwrap();
    assert!(verdict);

    let escape = StrelTreeNode::mk_escape(DistanceInterval::bounded(0.0, 1.0), prop("p"));
    let result = monitor_boolean_trace(&escape, bool_labeller(), 3, 0, &[]);
    assert!(matches!(result, Err(MonitorError::Compile(_))));
}
