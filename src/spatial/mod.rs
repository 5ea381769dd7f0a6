//! Spatial models: the location graphs that form the input alphabet of the monitor.

pub mod reach_paths;
pub mod signal_graph;

/// A spatial location; locations of a model with `N` locations are `0..N`.
pub type Location = usize;

/// Read-only view of one input graph of a trace.
///
/// Every edge carries named numeric attributes; the monitor reads distances
/// under a configurable attribute name, with edges missing the attribute
/// defaulting to a distance of 1.0.
pub trait SpatialGraph {
    /// All locations present in the graph.
    fn locations(&self) -> Vec<Location>;

    /// Edges leaving `from` (for undirected graphs: all incident edges), as
    /// `(from, to, distance)` triples with the distance read under
    /// `dist_attr`.
    fn distance_edges(&self, from: Location, dist_attr: &str) -> Vec<(Location, Location, f64)>;
}
