//! Directed edges.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tessera_common::types::{EdgeId, PropertyId, VertexId};

use super::{Direction, ElementHeader, ElementSnapshot, GraphElement, Vertex};

/// A directed edge between two vertices.
///
/// The endpoints are held weakly: the store's vertex map owns vertices, and
/// once an endpoint is removed [`Edge::source`] or [`Edge::target`] returns
/// `None`. The endpoint ids stay readable for persistence and logging.
pub struct Edge {
    id: EdgeId,
    header: ElementHeader,
    edge_property_id: PropertyId,
    source_id: VertexId,
    target_id: VertexId,
    source: Weak<Vertex>,
    target: Weak<Vertex>,
    weight: RwLock<Option<f64>>,
}

impl Edge {
    pub(crate) fn new(
        id: EdgeId,
        edge_property_id: PropertyId,
        source: &Arc<Vertex>,
        target: &Arc<Vertex>,
        snapshot: ElementSnapshot,
    ) -> Self {
        Self {
            id,
            header: ElementHeader::restore(
                id.into(),
                snapshot.created,
                snapshot.modified,
                snapshot.properties,
            ),
            edge_property_id,
            source_id: source.id(),
            target_id: target.id(),
            source: Arc::downgrade(source),
            target: Arc::downgrade(target),
            weight: RwLock::new(None),
        }
    }

    /// The edge id.
    #[must_use]
    pub const fn id(&self) -> EdgeId {
        self.id
    }

    /// The edge-property id this edge is grouped under at both endpoints.
    #[must_use]
    pub const fn edge_property_id(&self) -> PropertyId {
        self.edge_property_id
    }

    /// Id of the source vertex.
    #[must_use]
    pub const fn source_id(&self) -> VertexId {
        self.source_id
    }

    /// Id of the target vertex.
    #[must_use]
    pub const fn target_id(&self) -> VertexId {
        self.target_id
    }

    /// The source vertex, if it is still live.
    #[must_use]
    pub fn source(&self) -> Option<Arc<Vertex>> {
        self.source.upgrade()
    }

    /// The target vertex, if it is still live.
    #[must_use]
    pub fn target(&self) -> Option<Arc<Vertex>> {
        self.target.upgrade()
    }

    /// The vertex reached when following this edge in `direction` from the other end.
    ///
    /// `Outgoing` yields the target, `Incoming` the source. `Both` has no
    /// single answer and yields `None`.
    #[must_use]
    pub fn reached_by(&self, direction: Direction) -> Option<Arc<Vertex>> {
        match direction {
            Direction::Outgoing => self.target(),
            Direction::Incoming => self.source(),
            Direction::Both => None,
        }
    }

    /// Explicitly stored weight, if any.
    #[must_use]
    pub fn weight(&self) -> Option<f64> {
        *self.weight.read()
    }

    /// Stores or clears an explicit weight.
    pub fn set_weight(&self, weight: Option<f64>) {
        *self.weight.write() = weight;
    }
}

impl GraphElement for Edge {
    fn header(&self) -> &ElementHeader {
        &self.header
    }
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Edge")
            .field("id", &self.id)
            .field("edge_property_id", &self.edge_property_id)
            .field("source", &self.source_id)
            .field("target", &self.target_id)
            .finish()
    }
}
