//! A concrete input alphabet: a petgraph-backed location graph with labelled
//! vertices and attribute-carrying edges.

use crate::spatial::{Location, SpatialGraph};

use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, EdgeType, Undirected};

use std::collections::HashMap;

/// Named numeric attributes of one edge.
pub type EdgeAttributes = HashMap<String, f64>;

/// One observed graph of a spatio-temporal signal.
///
/// Vertices are the locations `0..N` (in insertion order) and carry an
/// arbitrary payload `V` that labelling functions can read; edges carry named
/// numeric attributes, typically a distance.
#[derive(Clone, Debug)]
pub struct SignalGraph<V, Ty: EdgeType = Undirected> {
    graph: Graph<V, EdgeAttributes, Ty>,
}

/// A [SignalGraph] with symmetric connectivity.
pub type UndirectedSignalGraph<V> = SignalGraph<V, Undirected>;

/// A [SignalGraph] with one-way connectivity.
pub type DirectedSignalGraph<V> = SignalGraph<V, Directed>;

impl<V, Ty: EdgeType> SignalGraph<V, Ty> {
    /// Create a graph whose locations `0..payloads.len()` carry the given
    /// payloads and no edges.
    pub fn with_locations(payloads: Vec<V>) -> Self {
        let mut graph = Graph::with_capacity(payloads.len(), 0);
        for payload in payloads {
            graph.add_node(payload);
        }
        SignalGraph { graph }
    }

    pub fn location_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The payload of a location. Panics if the location does not exist.
    pub fn payload(&self, loc: Location) -> &V {
        &self.graph[NodeIndex::new(loc)]
    }

    pub fn payload_mut(&mut self, loc: Location) -> &mut V {
        &mut self.graph[NodeIndex::new(loc)]
    }

    /// Connect two locations with the given edge attributes.
    pub fn add_edge(&mut self, from: Location, to: Location, attrs: &[(&str, f64)]) {
        let attrs: EdgeAttributes = attrs
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        self.graph
            .add_edge(NodeIndex::new(from), NodeIndex::new(to), attrs);
    }
}

impl<V, Ty: EdgeType> SpatialGraph for SignalGraph<V, Ty> {
    fn locations(&self) -> Vec<Location> {
        (0..self.graph.node_count()).collect()
    }

    fn distance_edges(&self, from: Location, dist_attr: &str) -> Vec<(Location, Location, f64)> {
        if from >= self.graph.node_count() {
            return Vec::new();
        }
        self.graph
            .edges(NodeIndex::new(from))
            .map(|edge| {
                // for undirected graphs the stored source may be either endpoint
                let other = if edge.source().index() == from {
                    edge.target().index()
                } else {
                    edge.source().index()
                };
                let distance = edge.weight().get(dist_attr).copied().unwrap_or(1.0);
                (from, other, distance)
            })
            .collect()
    }
}
