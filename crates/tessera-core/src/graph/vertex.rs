//! Vertices and their adjacency.

use std::sync::Arc;

use parking_lot::RwLock;
use tessera_common::collections::{TesseraMap, tessera_map};
use tessera_common::types::{EdgeId, PropertyId, VertexId};

use super::{Edge, ElementHeader, ElementSnapshot, GraphElement};

/// An immutable, published list of edges sharing one edge-property id.
pub type EdgeList = Arc<[Arc<Edge>]>;

type Adjacency = TesseraMap<PropertyId, EdgeList>;

/// A vertex with its outgoing and incoming edges.
///
/// Each adjacency map groups edges by edge-property id. The lists are never
/// mutated in place: adding or removing an edge publishes a new list, so a
/// reader holding an [`EdgeList`] always sees a consistent sequence.
///
/// Every edge in the outgoing map has this vertex as its source and every
/// edge in the incoming map has it as its target. The [`GraphStore`] keeps
/// both sides in step.
///
/// [`GraphStore`]: super::GraphStore
pub struct Vertex {
    id: VertexId,
    header: ElementHeader,
    outgoing: RwLock<Adjacency>,
    incoming: RwLock<Adjacency>,
}

impl Vertex {
    pub(crate) fn new(id: VertexId, snapshot: ElementSnapshot) -> Self {
        Self {
            id,
            header: ElementHeader::restore(
                id.into(),
                snapshot.created,
                snapshot.modified,
                snapshot.properties,
            ),
            outgoing: RwLock::new(tessera_map()),
            incoming: RwLock::new(tessera_map()),
        }
    }

    /// The vertex id.
    #[must_use]
    pub const fn id(&self) -> VertexId {
        self.id
    }

    /// Outgoing edge lists ordered by edge-property id.
    #[must_use]
    pub fn outgoing_edges(&self) -> Vec<(PropertyId, EdgeList)> {
        sorted_lists(&self.outgoing.read())
    }

    /// Incoming edge lists ordered by edge-property id.
    #[must_use]
    pub fn incoming_edges(&self) -> Vec<(PropertyId, EdgeList)> {
        sorted_lists(&self.incoming.read())
    }

    /// Outgoing edges with one edge-property id.
    #[must_use]
    pub fn outgoing_edges_for(&self, edge_property_id: PropertyId) -> Option<EdgeList> {
        self.outgoing.read().get(&edge_property_id).cloned()
    }

    /// Incoming edges with one edge-property id.
    #[must_use]
    pub fn incoming_edges_for(&self, edge_property_id: PropertyId) -> Option<EdgeList> {
        self.incoming.read().get(&edge_property_id).cloned()
    }

    /// Number of outgoing edges.
    #[must_use]
    pub fn out_degree(&self) -> usize {
        self.outgoing.read().values().map(|l| l.len()).sum()
    }

    /// Number of incoming edges.
    #[must_use]
    pub fn in_degree(&self) -> usize {
        self.incoming.read().values().map(|l| l.len()).sum()
    }

    pub(crate) fn attach_outgoing(&self, edge: Arc<Edge>) {
        publish_with(&mut self.outgoing.write(), edge);
    }

    pub(crate) fn attach_incoming(&self, edge: Arc<Edge>) {
        publish_with(&mut self.incoming.write(), edge);
    }

    pub(crate) fn detach_outgoing(&self, edge: &Edge) -> bool {
        publish_without(&mut self.outgoing.write(), edge.edge_property_id(), edge.id())
    }

    pub(crate) fn detach_incoming(&self, edge: &Edge) -> bool {
        publish_without(&mut self.incoming.write(), edge.edge_property_id(), edge.id())
    }

    /// Empties both adjacency maps, returning every edge that was attached.
    pub(crate) fn take_all_edges(&self) -> Vec<Arc<Edge>> {
        let outgoing = std::mem::take(&mut *self.outgoing.write());
        let incoming = std::mem::take(&mut *self.incoming.write());
        let mut edges: Vec<Arc<Edge>> = outgoing
            .into_values()
            .chain(incoming.into_values())
            .flat_map(|list| list.iter().cloned().collect::<Vec<_>>())
            .collect();
        edges.sort_by_key(|e| e.id());
        // A self-loop appears in both maps.
        edges.dedup_by_key(|e| e.id());
        edges
    }
}

impl GraphElement for Vertex {
    fn header(&self) -> &ElementHeader {
        &self.header
    }
}

impl std::fmt::Debug for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vertex")
            .field("id", &self.id)
            .field("out_degree", &self.out_degree())
            .field("in_degree", &self.in_degree())
            .finish()
    }
}

fn sorted_lists(map: &Adjacency) -> Vec<(PropertyId, EdgeList)> {
    let mut lists: Vec<_> = map.iter().map(|(id, l)| (*id, Arc::clone(l))).collect();
    lists.sort_unstable_by_key(|(id, _)| *id);
    lists
}

fn publish_with(map: &mut Adjacency, edge: Arc<Edge>) {
    let key = edge.edge_property_id();
    let list: EdgeList = match map.get(&key) {
        Some(existing) => existing.iter().cloned().chain(std::iter::once(edge)).collect(),
        None => Arc::from(vec![edge]),
    };
    map.insert(key, list);
}

fn publish_without(map: &mut Adjacency, key: PropertyId, edge_id: EdgeId) -> bool {
    let Some(existing) = map.get(&key) else {
        return false;
    };
    if !existing.iter().any(|e| e.id() == edge_id) {
        return false;
    }
    let remaining: Vec<Arc<Edge>> = existing
        .iter()
        .filter(|e| e.id() != edge_id)
        .cloned()
        .collect();
    if remaining.is_empty() {
        map.remove(&key);
    } else {
        map.insert(key, Arc::from(remaining));
    }
    true
}
