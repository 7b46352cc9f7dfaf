//! Paths and shortest-path search.
//!
//! A [`ShortestPathRequest`] describes what to look for: endpoints, depth
//! and weight limits, how many paths to return, the filters a step must pass
//! and how steps are priced. A [`ShortestPathAlgorithm`] answers it against
//! a [`GraphStore`]. Two algorithms ship and are registered by name in
//! [`default_path_plugins`]:
//!
//! | Name | Strategy |
//! | ---- | -------- |
//! | `BidirectionalLevelSynchronousBfs` | Layers grown alternately from both ends, joined where they meet |
//! | `LevelSynchronousBfs` | Layers grown from the source only |
//!
//! Both return simple paths (no vertex twice) ordered by ascending weight,
//! ties in discovery order. Costs are assumed non-negative: weight limits
//! prune partial paths and the search stops early once no unexplored path
//! could beat the results in hand.

mod bfs;
mod bidirectional;
mod element;
mod helper;
mod search;

use std::fmt;

use tessera_common::types::{PropertyId, VertexId};
use tessera_common::utils::Result;

use crate::graph::{Direction, Edge, GraphStore, Vertex};
use crate::plugin::PluginRegistry;

pub use bfs::LevelSynchronousBfs;
pub use bidirectional::BidirectionalLevelSynchronousBfs;
pub use element::{Path, PathElement};
pub use helper::{EdgeFilter, EdgePropertyFilter, PathHelper, VertexFilter};

type BoxedPropertyFilter = Box<dyn Fn(PropertyId) -> bool + Send + Sync>;
type BoxedEdgeFilter = Box<dyn Fn(&Edge) -> bool + Send + Sync>;
type BoxedVertexFilter = Box<dyn Fn(&Vertex) -> bool + Send + Sync>;
type BoxedEdgeCost = Box<dyn Fn(&Edge, Direction) -> f64 + Send + Sync>;
type BoxedVertexCost = Box<dyn Fn(&Vertex) -> f64 + Send + Sync>;

/// Parameters of one shortest-path search.
///
/// # Example
///
/// ```
/// use tessera_common::types::VertexId;
/// use tessera_core::path::ShortestPathRequest;
///
/// let request = ShortestPathRequest::new(VertexId::new(1), VertexId::new(9))
///     .with_max_depth(4)
///     .with_max_results(3)
///     .with_edge_cost(|edge, _| edge.weight().unwrap_or(1.0) * 2.0);
/// assert_eq!(request.max_depth(), 4);
/// ```
pub struct ShortestPathRequest {
    source: VertexId,
    destination: VertexId,
    max_depth: usize,
    max_results: usize,
    max_path_weight: f64,
    direction: Direction,
    frontier_limit: Option<usize>,
    edge_property_filter: Option<BoxedPropertyFilter>,
    vertex_filter: Option<BoxedVertexFilter>,
    edge_filter: Option<BoxedEdgeFilter>,
    edge_cost: Option<BoxedEdgeCost>,
    vertex_cost: Option<BoxedVertexCost>,
}

impl ShortestPathRequest {
    /// Default hop limit.
    pub const DEFAULT_MAX_DEPTH: usize = 8;

    /// Partial paths kept per search side when no limit is set.
    pub const DEFAULT_FRONTIER_LIMIT: usize = 100_000;

    /// A request for the single cheapest path from `source` to `destination`.
    #[must_use]
    pub fn new(source: VertexId, destination: VertexId) -> Self {
        Self {
            source,
            destination,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_results: 1,
            max_path_weight: f64::INFINITY,
            direction: Direction::Both,
            frontier_limit: None,
            edge_property_filter: None,
            vertex_filter: None,
            edge_filter: None,
            edge_cost: None,
            vertex_cost: None,
        }
    }

    /// Limits the number of edges per path. Zero finds nothing.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns up to `max_results` paths. Zero finds nothing.
    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Discards paths heavier than `max_path_weight`.
    #[must_use]
    pub fn with_max_path_weight(mut self, max_path_weight: f64) -> Self {
        self.max_path_weight = max_path_weight;
        self
    }

    /// Restricts how edges may be followed.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Caps the partial paths kept per search side.
    #[must_use]
    pub fn with_frontier_limit(mut self, limit: usize) -> Self {
        self.frontier_limit = Some(limit);
        self
    }

    /// Sets the cap only if none was set explicitly.
    pub fn set_default_frontier_limit(&mut self, limit: usize) {
        self.frontier_limit.get_or_insert(limit);
    }

    /// Only follow edges grouped under accepted edge-property ids.
    #[must_use]
    pub fn with_edge_property_filter(mut self, filter: impl Fn(PropertyId) -> bool + Send + Sync + 'static) -> Self {
        self.edge_property_filter = Some(Box::new(filter));
        self
    }

    /// Only pass through accepted vertices. The endpoints are always accepted.
    #[must_use]
    pub fn with_vertex_filter(mut self, filter: impl Fn(&Vertex) -> bool + Send + Sync + 'static) -> Self {
        self.vertex_filter = Some(Box::new(filter));
        self
    }

    /// Only follow accepted edges.
    #[must_use]
    pub fn with_edge_filter(mut self, filter: impl Fn(&Edge) -> bool + Send + Sync + 'static) -> Self {
        self.edge_filter = Some(Box::new(filter));
        self
    }

    /// Prices following an edge in a direction.
    #[must_use]
    pub fn with_edge_cost(mut self, cost: impl Fn(&Edge, Direction) -> f64 + Send + Sync + 'static) -> Self {
        self.edge_cost = Some(Box::new(cost));
        self
    }

    /// Prices entering a vertex. The start vertex is never charged.
    #[must_use]
    pub fn with_vertex_cost(mut self, cost: impl Fn(&Vertex) -> f64 + Send + Sync + 'static) -> Self {
        self.vertex_cost = Some(Box::new(cost));
        self
    }

    /// Where paths start.
    #[must_use]
    pub const fn source(&self) -> VertexId {
        self.source
    }

    /// Where paths end.
    #[must_use]
    pub const fn destination(&self) -> VertexId {
        self.destination
    }

    /// Edge limit per path.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Result limit.
    #[must_use]
    pub const fn max_results(&self) -> usize {
        self.max_results
    }

    /// Weight limit per path.
    #[must_use]
    pub const fn max_path_weight(&self) -> f64 {
        self.max_path_weight
    }

    /// Direction restriction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Frontier cap in effect.
    #[must_use]
    pub fn frontier_limit(&self) -> usize {
        self.frontier_limit.unwrap_or(Self::DEFAULT_FRONTIER_LIMIT)
    }

    /// Cost of following `edge` in `direction`: the custom cost, else the
    /// edge's explicit weight, else 1.
    #[must_use]
    pub fn edge_cost(&self, edge: &Edge, direction: Direction) -> f64 {
        match &self.edge_cost {
            Some(cost) => cost(edge, direction),
            None => edge.weight().unwrap_or(1.0),
        }
    }

    /// Cost of entering `vertex`: the custom cost, else 0.
    #[must_use]
    pub fn vertex_cost(&self, vertex: &Vertex) -> f64 {
        self.vertex_cost.as_ref().map_or(0.0, |cost| cost(vertex))
    }

    fn edge_property_filter(&self) -> Option<EdgePropertyFilter<'_>> {
        self.edge_property_filter
            .as_deref()
            .map(|f| f as EdgePropertyFilter<'_>)
    }

    fn edge_filter(&self) -> Option<EdgeFilter<'_>> {
        self.edge_filter.as_deref().map(|f| f as EdgeFilter<'_>)
    }

    /// Whether a path may pass through `vertex`.
    fn admits_vertex(&self, vertex: &Vertex) -> bool {
        vertex.id() == self.source
            || vertex.id() == self.destination
            || self.vertex_filter.as_ref().is_none_or(|accept| accept(vertex))
    }

    fn has_vertex_filter(&self) -> bool {
        self.vertex_filter.is_some()
    }
}

impl fmt::Debug for ShortestPathRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortestPathRequest")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("max_depth", &self.max_depth)
            .field("max_results", &self.max_results)
            .field("max_path_weight", &self.max_path_weight)
            .field("direction", &self.direction)
            .field("frontier_limit", &self.frontier_limit)
            .finish_non_exhaustive()
    }
}

/// A pluggable shortest-path strategy.
pub trait ShortestPathAlgorithm: Send + Sync {
    /// Plugin name.
    fn name(&self) -> &'static str;

    /// Finds up to `request.max_results()` paths, cheapest first.
    ///
    /// No path, an unresolved endpoint, a zero depth and a zero result
    /// limit all yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's gate cannot be entered.
    fn calculate(&self, store: &GraphStore, request: &ShortestPathRequest) -> Result<Vec<Path>>;
}

/// A registry preloaded with both built-in algorithms.
#[must_use]
pub fn default_path_plugins() -> PluginRegistry<dyn ShortestPathAlgorithm> {
    let registry: PluginRegistry<dyn ShortestPathAlgorithm> = PluginRegistry::new();
    registry.register(BidirectionalLevelSynchronousBfs::NAME, || {
        Box::new(BidirectionalLevelSynchronousBfs)
    });
    registry.register(LevelSynchronousBfs::NAME, || Box::new(LevelSynchronousBfs));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = ShortestPathRequest::new(VertexId::new(1), VertexId::new(2));
        assert_eq!(request.max_depth(), 8);
        assert_eq!(request.max_results(), 1);
        assert_eq!(request.max_path_weight(), f64::INFINITY);
        assert_eq!(request.direction(), Direction::Both);
        assert_eq!(request.frontier_limit(), ShortestPathRequest::DEFAULT_FRONTIER_LIMIT);
    }

    #[test]
    fn test_default_frontier_limit_does_not_override() {
        let mut explicit = ShortestPathRequest::new(VertexId::new(1), VertexId::new(2)).with_frontier_limit(10);
        explicit.set_default_frontier_limit(500);
        assert_eq!(explicit.frontier_limit(), 10);

        let mut implicit = ShortestPathRequest::new(VertexId::new(1), VertexId::new(2));
        implicit.set_default_frontier_limit(500);
        assert_eq!(implicit.frontier_limit(), 500);
    }

    #[test]
    fn test_endpoints_pass_vertex_filter() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap();
        let b = store.create_vertex().unwrap();
        let c = store.create_vertex().unwrap();
        let request = ShortestPathRequest::new(a.id(), b.id()).with_vertex_filter(|_| false);

        assert!(request.admits_vertex(&a));
        assert!(request.admits_vertex(&b));
        assert!(!request.admits_vertex(&c));
        assert!(request.has_vertex_filter());
    }

    #[test]
    fn test_default_plugins() {
        let plugins = default_path_plugins();
        assert_eq!(
            plugins.names(),
            vec!["BidirectionalLevelSynchronousBfs", "LevelSynchronousBfs"]
        );
        let algorithm = plugins.try_find_plugin("LevelSynchronousBfs").unwrap();
        assert_eq!(algorithm.name(), "LevelSynchronousBfs");
    }
}
