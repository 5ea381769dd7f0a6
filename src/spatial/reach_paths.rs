//! Enumeration of weight-bounded simple paths, realizing the spatial reach
//! operator.
//!
//! This adapts the classic all-simple-paths algorithm (an explicit-stack DFS
//! over edge iterators) to the distance-interval constraint of reach: a path
//! is emitted when its cumulative distance lands in `[low, high]`, and a
//! prefix is extended only while its cumulative distance stays below `high`.

use crate::spatial::{Location, SpatialGraph};

use std::collections::HashSet;

/// A path as the ordered list of its `(from, to, distance)` edges. The empty
/// path (the source location alone) has no edges.
pub type EdgePath = Vec<(Location, Location, f64)>;

/// Lazily enumerate all simple paths starting at `source` whose cumulative
/// distance lies in `[low, high]`, reading distances under `dist_attr`
/// (missing attributes default to 1.0).
///
/// Properties:
///  - every emitted path is simple (no repeated locations, `source` included),
///  - the empty path is emitted iff `low == 0` (its cumulative distance is 0),
///  - paths are explored depth-first and each is emitted exactly once.
pub fn all_reach_edge_paths<'a, G: SpatialGraph>(
    graph: &'a G,
    source: Location,
    low: f64,
    high: f64,
    dist_attr: &'a str,
) -> ReachEdgePaths<'a, G> {
    ReachEdgePaths {
        graph,
        dist_attr,
        low,
        high,
        targets: graph.locations().into_iter().collect(),
        // a dummy zero-distance edge into the source bootstraps the search, so
        // that the trivial path has a chance of being emitted
        stack: vec![vec![(None, source, 0.0)].into_iter()],
        path_nodes: Vec::new(),
        path_edges: Vec::new(),
        visited: HashSet::new(),
    }
}

/// See [all_reach_edge_paths].
pub struct ReachEdgePaths<'a, G: SpatialGraph> {
    graph: &'a G,
    dist_attr: &'a str,
    low: f64,
    high: f64,
    targets: HashSet<Location>,
    /// One edge iterator per node on the current path (plus the bootstrap
    /// level); the recursion stack of the DFS.
    stack: Vec<std::vec::IntoIter<(Option<Location>, Location, f64)>>,
    /// Nodes of the current path with the cumulative distance at which each
    /// was entered.
    path_nodes: Vec<(Location, f64)>,
    /// Edges of the current path, carrying their raw distances.
    path_edges: EdgePath,
    visited: HashSet<Location>,
}

impl<G: SpatialGraph> Iterator for ReachEdgePaths<'_, G> {
    type Item = EdgePath;

    fn next(&mut self) -> Option<EdgePath> {
        loop {
            let top = self.stack.last_mut()?;

            // try to extend the current path by an edge to an unvisited node
            let Some((prev, node, distance)) = top.find(|(_, to, _)| !self.visited.contains(to))
            else {
                // all edges of the last node on the current path are explored
                self.stack.pop();
                if let Some((node, _)) = self.path_nodes.pop() {
                    self.visited.remove(&node);
                    self.path_edges.pop();
                }
                continue;
            };

            let cumulative = match prev {
                None => 0.0,
                Some(_) => self.path_nodes.last().map_or(0.0, |(_, d)| *d) + distance,
            };

            let emitted = if self.low <= cumulative && cumulative <= self.high {
                match prev {
                    // the bootstrap edge stands for the trivial path
                    None => Some(Vec::new()),
                    Some(prev) => {
                        let mut path = self.path_edges.clone();
                        path.push((prev, node, distance));
                        Some(path)
                    }
                }
            } else {
                None
            };

            // only expand the search through `node` while the upper bound
            // allows it and some other location remains unvisited
            let expandable = cumulative <= self.high
                && self
                    .targets
                    .iter()
                    .any(|target| *target != node && !self.visited.contains(target));
            if expandable {
                if let Some(prev) = prev {
                    self.path_edges.push((prev, node, distance));
                }
                self.path_nodes.push((node, cumulative));
                self.visited.insert(node);
                let edges: Vec<(Option<Location>, Location, f64)> = self
                    .graph
                    .distance_edges(node, self.dist_attr)
                    .into_iter()
                    .map(|(from, to, distance)| (Some(from), to, distance))
                    .collect();
                self.stack.push(edges.into_iter());
            }

            if let Some(path) = emitted {
                return Some(path);
            }
        }
    }
}
