//! Path building blocks.

use std::fmt;
use std::sync::Arc;

use tessera_common::types::{PropertyId, VertexId};

use crate::graph::{Direction, Edge, Vertex};

/// One traversed edge within a [`Path`].
///
/// `direction` says how the edge was followed: `Outgoing` goes from its
/// source to its target, `Incoming` from its target to its source.
#[derive(Clone)]
pub struct PathElement {
    edge: Arc<Edge>,
    direction: Direction,
    weight: f64,
}

impl PathElement {
    /// Follows `edge` in `direction` with zero weight.
    #[must_use]
    pub fn new(edge: Arc<Edge>, direction: Direction) -> Self {
        Self {
            edge,
            direction,
            weight: 0.0,
        }
    }

    /// The traversed edge.
    #[must_use]
    pub fn edge(&self) -> &Arc<Edge> {
        &self.edge
    }

    /// How the edge was followed.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// The edge-property id the edge is grouped under.
    #[must_use]
    pub fn edge_property_id(&self) -> PropertyId {
        self.edge.edge_property_id()
    }

    /// Cost of this step.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Replaces the cost of this step.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Vertex the step leaves.
    #[must_use]
    pub fn from_vertex_id(&self) -> VertexId {
        match self.direction {
            Direction::Incoming => self.edge.target_id(),
            _ => self.edge.source_id(),
        }
    }

    /// Vertex the step enters.
    #[must_use]
    pub fn to_vertex_id(&self) -> VertexId {
        match self.direction {
            Direction::Incoming => self.edge.source_id(),
            _ => self.edge.target_id(),
        }
    }

    /// The entered vertex, if it is still alive.
    #[must_use]
    pub fn next_vertex(&self) -> Option<Arc<Vertex>> {
        self.edge.reached_by(self.direction)
    }

    /// The same step walked the other way, keeping its weight.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            edge: Arc::clone(&self.edge),
            direction: self.direction.reverse(),
            weight: self.weight,
        }
    }
}

impl fmt::Debug for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -[{}]-> {} ({})",
            self.from_vertex_id(),
            self.edge.id(),
            self.to_vertex_id(),
            self.weight
        )
    }
}

/// A walk from a start vertex through a sequence of edges.
///
/// Consecutive elements are connected: each element leaves the vertex the
/// previous one entered.
#[derive(Debug, Clone)]
pub struct Path {
    start: VertexId,
    elements: Vec<PathElement>,
    total_weight: f64,
}

impl Path {
    /// The empty path sitting at `start`.
    #[must_use]
    pub fn new(start: VertexId) -> Self {
        Self {
            start,
            elements: Vec::new(),
            total_weight: 0.0,
        }
    }

    /// A path over `elements`, weighted by the sum of their weights.
    #[must_use]
    pub fn from_elements(start: VertexId, elements: Vec<PathElement>) -> Self {
        let total_weight = elements.iter().map(PathElement::weight).sum();
        Self {
            start,
            elements,
            total_weight,
        }
    }

    /// Appends a step.
    pub fn push(&mut self, element: PathElement) {
        self.total_weight += element.weight;
        self.elements.push(element);
    }

    /// First vertex.
    #[must_use]
    pub const fn start_vertex(&self) -> VertexId {
        self.start
    }

    /// Last vertex.
    #[must_use]
    pub fn end_vertex(&self) -> VertexId {
        self.elements
            .last()
            .map_or(self.start, PathElement::to_vertex_id)
    }

    /// Last step, if any.
    #[must_use]
    pub fn last_element(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    /// The steps in order.
    #[must_use]
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` for a zero-length path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Sum of the step weights.
    #[must_use]
    pub const fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Every visited vertex, start first.
    #[must_use]
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        std::iter::once(self.start)
            .chain(self.elements.iter().map(PathElement::to_vertex_id))
            .collect()
    }

    /// Walks the path backwards in place.
    pub fn reverse(&mut self) {
        self.start = self.end_vertex();
        self.elements.reverse();
        for element in &mut self.elements {
            element.direction = element.direction.reverse();
        }
    }

    /// The path walked backwards.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut path = self.clone();
        path.reverse();
        path
    }

    /// Re-weights every step as `edge_cost(edge, direction)` plus the
    /// `vertex_cost` of the vertex it enters, and returns the new total.
    ///
    /// Steps whose entered vertex no longer exists get the edge cost only.
    pub fn recompute_weight(
        &mut self,
        edge_cost: &dyn Fn(&Edge, Direction) -> f64,
        vertex_cost: &dyn Fn(&Vertex) -> f64,
    ) -> f64 {
        let mut total = 0.0;
        for element in &mut self.elements {
            let entered = element.next_vertex().map_or(0.0, |v| vertex_cost(&v));
            element.weight = edge_cost(&element.edge, element.direction) + entered;
            total += element.weight;
        }
        self.total_weight = total;
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;

    /// a -> b <- c
    fn fixture() -> (GraphStore, Vec<Arc<Vertex>>, Arc<Edge>, Arc<Edge>) {
        let store = GraphStore::new();
        let vs: Vec<_> = (0..3).map(|_| store.create_vertex().unwrap()).collect();
        let ab = store.create_edge(vs[0].id(), vs[1].id(), PropertyId::new(1)).unwrap();
        let cb = store.create_edge(vs[2].id(), vs[1].id(), PropertyId::new(1)).unwrap();
        (store, vs, ab, cb)
    }

    #[test]
    fn test_element_endpoints() {
        let (_store, vs, ab, cb) = fixture();
        let forward = PathElement::new(ab, Direction::Outgoing);
        assert_eq!(forward.from_vertex_id(), vs[0].id());
        assert_eq!(forward.to_vertex_id(), vs[1].id());
        assert_eq!(forward.next_vertex().unwrap().id(), vs[1].id());

        let against = PathElement::new(cb, Direction::Incoming);
        assert_eq!(against.from_vertex_id(), vs[1].id());
        assert_eq!(against.to_vertex_id(), vs[2].id());
        assert_eq!(against.reversed().to_vertex_id(), vs[1].id());
    }

    #[test]
    fn test_path_walk_and_reverse() {
        let (_store, vs, ab, cb) = fixture();
        let mut path = Path::new(vs[0].id());
        let mut first = PathElement::new(ab, Direction::Outgoing);
        first.set_weight(2.0);
        path.push(first);
        let mut second = PathElement::new(cb, Direction::Incoming);
        second.set_weight(0.5);
        path.push(second);

        assert_eq!(path.len(), 2);
        assert_eq!(path.total_weight(), 2.5);
        assert_eq!(path.end_vertex(), vs[2].id());
        assert_eq!(path.vertex_ids(), vec![vs[0].id(), vs[1].id(), vs[2].id()]);

        let back = path.reversed();
        assert_eq!(back.start_vertex(), vs[2].id());
        assert_eq!(back.vertex_ids(), vec![vs[2].id(), vs[1].id(), vs[0].id()]);
        assert_eq!(back.total_weight(), 2.5);
    }

    #[test]
    fn test_recompute_weight() {
        let (_store, vs, ab, _cb) = fixture();
        ab.set_weight(Some(4.0));
        let mut path = Path::from_elements(vs[0].id(), vec![PathElement::new(ab, Direction::Outgoing)]);
        assert_eq!(path.total_weight(), 0.0);

        let total = path.recompute_weight(&|e, _| e.weight().unwrap_or(1.0), &|_| 0.25);
        assert_eq!(total, 4.25);
        assert_eq!(path.elements()[0].weight(), 4.25);
    }

    #[test]
    fn test_empty_path() {
        let path = Path::new(VertexId::new(7));
        assert!(path.is_empty());
        assert_eq!(path.end_vertex(), VertexId::new(7));
        assert!(path.last_element().is_none());
    }
}
