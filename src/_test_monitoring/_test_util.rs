use crate::automaton::LabellingFn;
use crate::spatial::signal_graph::{SignalGraph, UndirectedSignalGraph};

use std::collections::HashMap;

/// Vertex payload: predicate name to truth value.
pub type PropMap = HashMap<String, bool>;

/// The graph type all monitoring tests run on.
pub type PropGraph = UndirectedSignalGraph<PropMap>;

/// Labelling that reads predicates from the vertex payload; unknown
/// predicates are false.
pub fn bool_labeller() -> LabellingFn<PropGraph, bool> {
    Box::new(|graph: &PropGraph, loc, name| {
        graph.payload(loc).get(name).copied().unwrap_or(false)
    })
}

/// A unit-weight line `0 -- 1 -- ... -- (n-1)` where `labels[loc]` lists the
/// predicates true at `loc`.
pub fn line_graph(labels: &[&[&str]]) -> PropGraph {
    let payloads: Vec<PropMap> = labels
        .iter()
        .map(|props| props.iter().map(|name| (name.to_string(), true)).collect())
        .collect();
    let mut graph = SignalGraph::with_locations(payloads);
    for loc in 1..labels.len() {
        graph.add_edge(loc - 1, loc, &[]);
    }
    graph
}

/// A trace of line graphs over a fixed set of locations: `steps[t][loc]`
/// lists the predicates true at `loc` at time `t`.
pub fn line_trace(steps: &[&[&[&str]]]) -> Vec<PropGraph> {
    steps.iter().map(|labels| line_graph(labels)).collect()
}
