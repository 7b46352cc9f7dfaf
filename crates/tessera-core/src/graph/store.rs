//! The gated vertex and edge store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tessera_common::collections::{TesseraMap, tessera_map};
use tessera_common::types::{EdgeId, ElementId, PropertyId, Value, VertexId};
use tessera_common::utils::{Error, Result};

use super::{Edge, Element, ElementSnapshot, GraphElement, GraphElementSource, Vertex};
use crate::resource::{LockPolicy, ThreadSafeResource};

#[derive(Default)]
struct StoreState {
    vertices: TesseraMap<VertexId, Arc<Vertex>>,
    edges: TesseraMap<EdgeId, Arc<Edge>>,
}

/// Owner of every live vertex and edge.
///
/// Vertices and edges draw ids from one counter, so an [`ElementId`] names
/// exactly one element. Structural changes (creation and removal) take the
/// store's write gate. Lookups take its read gate and return cheap `Arc`
/// handles that stay valid after the guard is released.
///
/// # Example
///
/// ```
/// use tessera_core::graph::GraphStore;
/// use tessera_common::types::PropertyId;
///
/// let store = GraphStore::new();
/// let alix = store.create_vertex().unwrap();
/// let gus = store.create_vertex().unwrap();
/// store.create_edge(alix.id(), gus.id(), PropertyId::new(0)).unwrap();
///
/// assert_eq!(store.vertex_count().unwrap(), 2);
/// assert_eq!(alix.out_degree(), 1);
/// ```
pub struct GraphStore {
    state: ThreadSafeResource<StoreState>,
    next_id: AtomicU64,
}

impl GraphStore {
    /// Creates an empty store with the default lock policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(LockPolicy::default())
    }

    /// Creates an empty store whose gate uses `policy`.
    #[must_use]
    pub fn with_policy(policy: LockPolicy) -> Self {
        Self {
            state: ThreadSafeResource::with_policy("GraphStore", StoreState::default(), policy),
            next_id: AtomicU64::new(0),
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next created element will receive.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }

    /// Raises the id counter so that it never hands out `id` or anything below.
    pub fn reserve_ids_through(&self, id: u64) {
        self.next_id.fetch_max(id.saturating_add(1), Ordering::Relaxed);
    }

    /// Creates a vertex without properties.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's write gate is unavailable.
    pub fn create_vertex(&self) -> Result<Arc<Vertex>> {
        self.create_vertex_with_props(std::iter::empty())
    }

    /// Creates a vertex with the given properties.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's write gate is unavailable.
    pub fn create_vertex_with_props(
        &self,
        properties: impl IntoIterator<Item = (PropertyId, Value)>,
    ) -> Result<Arc<Vertex>> {
        let mut state = self.state.begin_write()?;
        let id = VertexId::new(self.allocate_id());
        let vertex = Arc::new(Vertex::new(
            id,
            ElementSnapshot::now(properties.into_iter().collect()),
        ));
        state.vertices.insert(id, Arc::clone(&vertex));
        Ok(vertex)
    }

    /// Recreates a vertex with a known id, as read back from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the id is already taken by a
    /// vertex or an edge.
    pub fn restore_vertex(&self, id: VertexId, snapshot: ElementSnapshot) -> Result<Arc<Vertex>> {
        let mut state = self.state.begin_write()?;
        if state.vertices.contains_key(&id) || state.edges.contains_key(&EdgeId::new(id.as_u64())) {
            return Err(Error::InvalidArgument(format!("element id {id} already in use")));
        }
        self.reserve_ids_through(id.as_u64());
        let vertex = Arc::new(Vertex::new(id, snapshot));
        state.vertices.insert(id, Arc::clone(&vertex));
        Ok(vertex)
    }

    /// Creates an edge from `source` to `target`, grouped under `edge_property_id`.
    ///
    /// The edge is attached to the source's outgoing and the target's
    /// incoming adjacency before the write gate is released.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either endpoint does not exist.
    pub fn create_edge(
        &self,
        source: VertexId,
        target: VertexId,
        edge_property_id: PropertyId,
    ) -> Result<Arc<Edge>> {
        self.create_edge_with_props(source, target, edge_property_id, std::iter::empty())
    }

    /// Creates an edge with the given properties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either endpoint does not exist.
    pub fn create_edge_with_props(
        &self,
        source: VertexId,
        target: VertexId,
        edge_property_id: PropertyId,
        properties: impl IntoIterator<Item = (PropertyId, Value)>,
    ) -> Result<Arc<Edge>> {
        let mut state = self.state.begin_write()?;
        let id = EdgeId::new(self.allocate_id());
        let snapshot = ElementSnapshot::now(properties.into_iter().collect());
        Self::insert_edge(&mut state, id, source, target, edge_property_id, snapshot)
    }

    /// Recreates an edge with a known id, as read back from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the id is taken or an endpoint
    /// does not exist.
    pub fn restore_edge(
        &self,
        id: EdgeId,
        source: VertexId,
        target: VertexId,
        edge_property_id: PropertyId,
        snapshot: ElementSnapshot,
    ) -> Result<Arc<Edge>> {
        let mut state = self.state.begin_write()?;
        if state.edges.contains_key(&id) || state.vertices.contains_key(&VertexId::new(id.as_u64())) {
            return Err(Error::InvalidArgument(format!("element id {id} already in use")));
        }
        self.reserve_ids_through(id.as_u64());
        Self::insert_edge(&mut state, id, source, target, edge_property_id, snapshot)
    }

    fn insert_edge(
        state: &mut StoreState,
        id: EdgeId,
        source: VertexId,
        target: VertexId,
        edge_property_id: PropertyId,
        snapshot: ElementSnapshot,
    ) -> Result<Arc<Edge>> {
        let missing = |v: VertexId| Error::InvalidArgument(format!("vertex {v} does not exist"));
        let src = state.vertices.get(&source).ok_or_else(|| missing(source))?;
        let dst = state.vertices.get(&target).ok_or_else(|| missing(target))?;

        let edge = Arc::new(Edge::new(id, edge_property_id, src, dst, snapshot));
        src.attach_outgoing(Arc::clone(&edge));
        dst.attach_incoming(Arc::clone(&edge));
        state.edges.insert(id, Arc::clone(&edge));
        Ok(edge)
    }

    /// Looks up a vertex.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's read gate is unavailable.
    pub fn get_vertex(&self, id: VertexId) -> Result<Option<Arc<Vertex>>> {
        Ok(self.state.begin_read()?.vertices.get(&id).cloned())
    }

    /// Looks up an edge.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's read gate is unavailable.
    pub fn get_edge(&self, id: EdgeId) -> Result<Option<Arc<Edge>>> {
        Ok(self.state.begin_read()?.edges.get(&id).cloned())
    }

    /// Removes a vertex and every edge incident to it.
    ///
    /// Returns the removed vertex together with the detached edges so the
    /// caller can purge them from indices.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's write gate is unavailable.
    pub fn remove_vertex(&self, id: VertexId) -> Result<Option<(Arc<Vertex>, Vec<Arc<Edge>>)>> {
        let mut state = self.state.begin_write()?;
        let Some(vertex) = state.vertices.remove(&id) else {
            return Ok(None);
        };

        let edges = vertex.take_all_edges();
        for edge in &edges {
            state.edges.remove(&edge.id());
            // The far endpoint still lists this edge.
            if edge.source_id() != id
                && let Some(src) = state.vertices.get(&edge.source_id())
            {
                src.detach_outgoing(edge);
            }
            if edge.target_id() != id
                && let Some(dst) = state.vertices.get(&edge.target_id())
            {
                dst.detach_incoming(edge);
            }
        }
        Ok(Some((vertex, edges)))
    }

    /// Removes one edge from the store and from both endpoints.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's write gate is unavailable.
    pub fn remove_edge(&self, id: EdgeId) -> Result<Option<Arc<Edge>>> {
        let mut state = self.state.begin_write()?;
        let Some(edge) = state.edges.remove(&id) else {
            return Ok(None);
        };
        if let Some(src) = state.vertices.get(&edge.source_id()) {
            src.detach_outgoing(&edge);
        }
        if let Some(dst) = state.vertices.get(&edge.target_id()) {
            dst.detach_incoming(&edge);
        }
        Ok(Some(edge))
    }

    /// Sets a property on a vertex or edge.
    ///
    /// Returns the previous value, or `None` if the property was unset. Returns
    /// `Ok(None)` as well when the element does not exist; use
    /// [`GraphElementSource::try_get_element`] first to tell the cases apart.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's read gate is unavailable.
    pub fn set_property(&self, id: ElementId, property: PropertyId, value: Value) -> Result<Option<Value>> {
        Ok(self
            .try_get_element(id)?
            .and_then(|element| element.header().set_property(property, value)))
    }

    /// Removes a property from a vertex or edge.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's read gate is unavailable.
    pub fn remove_property(&self, id: ElementId, property: PropertyId) -> Result<Option<Value>> {
        Ok(self
            .try_get_element(id)?
            .and_then(|element| element.header().remove_property(property)))
    }

    /// Number of live vertices.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's read gate is unavailable.
    pub fn vertex_count(&self) -> Result<usize> {
        Ok(self.state.begin_read()?.vertices.len())
    }

    /// Number of live edges.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's read gate is unavailable.
    pub fn edge_count(&self) -> Result<usize> {
        Ok(self.state.begin_read()?.edges.len())
    }

    /// All vertices ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's read gate is unavailable.
    pub fn vertices(&self) -> Result<Vec<Arc<Vertex>>> {
        let mut all: Vec<_> = self.state.begin_read()?.vertices.values().cloned().collect();
        all.sort_unstable_by_key(|v| v.id());
        Ok(all)
    }

    /// All edges ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's read gate is unavailable.
    pub fn edges(&self) -> Result<Vec<Arc<Edge>>> {
        let mut all: Vec<_> = self.state.begin_read()?.edges.values().cloned().collect();
        all.sort_unstable_by_key(|e| e.id());
        Ok(all)
    }

    /// All vertices and all edges, each ordered by id, read under one gate
    /// acquisition so every listed edge has both endpoints listed.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's read gate is unavailable.
    pub fn contents(&self) -> Result<(Vec<Arc<Vertex>>, Vec<Arc<Edge>>)> {
        let state = self.state.begin_read()?;
        let mut vertices: Vec<_> = state.vertices.values().cloned().collect();
        let mut edges: Vec<_> = state.edges.values().cloned().collect();
        drop(state);
        vertices.sort_unstable_by_key(|v| v.id());
        edges.sort_unstable_by_key(|e| e.id());
        Ok((vertices, edges))
    }

    /// Drops every vertex and edge. The id counter is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store's write gate is unavailable.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.begin_write()?;
        for vertex in state.vertices.values() {
            vertex.take_all_edges();
        }
        state.vertices = tessera_map();
        state.edges = tessera_map();
        Ok(())
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphElementSource for GraphStore {
    fn try_get_element(&self, id: ElementId) -> Result<Option<Element>> {
        let state = self.state.begin_read()?;
        if let Some(v) = state.vertices.get(&VertexId::new(id.as_u64())) {
            return Ok(Some(Element::Vertex(Arc::clone(v))));
        }
        Ok(state
            .edges
            .get(&EdgeId::new(id.as_u64()))
            .map(|e| Element::Edge(Arc::clone(e))))
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("gate", &self.state)
            .field("next_id", &self.next_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyMap;
    use tessera_common::types::Timestamp;

    const KNOWS: PropertyId = PropertyId::new(1);
    const NAME: PropertyId = PropertyId::new(10);

    #[test]
    fn test_shared_id_sequence() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap();
        let b = store.create_vertex().unwrap();
        let e = store.create_edge(a.id(), b.id(), KNOWS).unwrap();
        let c = store.create_vertex().unwrap();

        assert_eq!(a.id().as_u64(), 0);
        assert_eq!(b.id().as_u64(), 1);
        assert_eq!(e.id().as_u64(), 2);
        assert_eq!(c.id().as_u64(), 3);
        assert_eq!(store.next_id(), 4);
    }

    #[test]
    fn test_edge_structural_symmetry() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap();
        let b = store.create_vertex().unwrap();
        let e = store.create_edge(a.id(), b.id(), KNOWS).unwrap();

        let out = a.outgoing_edges_for(KNOWS).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source_id(), a.id());
        let inc = b.incoming_edges_for(KNOWS).unwrap();
        assert_eq!(inc[0].target_id(), b.id());
        assert_eq!(e.source().unwrap().id(), a.id());
        assert_eq!(e.target().unwrap().id(), b.id());
        assert_eq!(a.in_degree(), 0);
    }

    #[test]
    fn test_create_edge_missing_endpoint() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap();
        let err = store.create_edge(a.id(), VertexId::new(99), KNOWS).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(a.out_degree(), 0);
        assert_eq!(store.edge_count().unwrap(), 0);
    }

    #[test]
    fn test_remove_vertex_detaches_edges() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap();
        let b = store.create_vertex().unwrap();
        let c = store.create_vertex().unwrap();
        store.create_edge(a.id(), b.id(), KNOWS).unwrap();
        store.create_edge(b.id(), c.id(), KNOWS).unwrap();
        store.create_edge(b.id(), b.id(), KNOWS).unwrap();

        let (removed, edges) = store.remove_vertex(b.id()).unwrap().unwrap();
        assert_eq!(removed.id(), b.id());
        assert_eq!(edges.len(), 3);
        assert_eq!(store.edge_count().unwrap(), 0);
        assert_eq!(a.out_degree(), 0);
        assert_eq!(c.in_degree(), 0);
        assert!(store.get_vertex(b.id()).unwrap().is_none());
        assert!(store.remove_vertex(b.id()).unwrap().is_none());
    }

    #[test]
    fn test_remove_edge() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap();
        let b = store.create_vertex().unwrap();
        let e1 = store.create_edge(a.id(), b.id(), KNOWS).unwrap();
        let e2 = store.create_edge(a.id(), b.id(), KNOWS).unwrap();

        assert!(store.remove_edge(e1.id()).unwrap().is_some());
        let out = a.outgoing_edges_for(KNOWS).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id(), e2.id());

        store.remove_edge(e2.id()).unwrap();
        assert!(a.outgoing_edges_for(KNOWS).is_none());
        assert!(b.incoming_edges().is_empty());
    }

    #[test]
    fn test_edge_outlives_endpoint_weakly() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap();
        let b = store.create_vertex().unwrap();
        let e = store.create_edge(a.id(), b.id(), KNOWS).unwrap();
        let b_id = b.id();
        drop(b);

        store.remove_vertex(b_id).unwrap();
        assert!(e.target().is_none());
        assert_eq!(e.target_id(), b_id);
    }

    #[test]
    fn test_properties_through_store() {
        let store = GraphStore::new();
        let v = store
            .create_vertex_with_props([(NAME, Value::from("Alix"))])
            .unwrap();

        assert_eq!(v.property(NAME), Some(Value::from("Alix")));
        let old = store
            .set_property(v.element_id(), NAME, Value::from("Gus"))
            .unwrap();
        assert_eq!(old, Some(Value::from("Alix")));
        assert_eq!(
            store.remove_property(v.element_id(), NAME).unwrap(),
            Some(Value::from("Gus"))
        );
        assert!(v.properties().is_empty());
    }

    #[test]
    fn test_try_get_element() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap();
        let b = store.create_vertex().unwrap();
        let e = store.create_edge(a.id(), b.id(), KNOWS).unwrap();

        let found = store.try_get_element(ElementId::from(e.id())).unwrap().unwrap();
        assert!(found.as_edge().is_some());
        let found = store.try_get_element(ElementId::from(a.id())).unwrap().unwrap();
        assert!(found.is_vertex());
        assert!(store.try_get_element(ElementId::new(77)).unwrap().is_none());
    }

    #[test]
    fn test_restore_with_explicit_ids() {
        let store = GraphStore::new();
        let snap = ElementSnapshot {
            created: Timestamp::from_secs(3),
            modified: Timestamp::from_secs(4),
            properties: PropertyMap::new(),
        };
        store.restore_vertex(VertexId::new(10), snap.clone()).unwrap();
        store.restore_vertex(VertexId::new(11), snap.clone()).unwrap();
        store
            .restore_edge(EdgeId::new(12), VertexId::new(10), VertexId::new(11), KNOWS, snap.clone())
            .unwrap();

        assert!(store.restore_vertex(VertexId::new(12), snap).is_err());
        assert_eq!(store.create_vertex().unwrap().id().as_u64(), 13);
    }

    #[test]
    fn test_contents_lists_both_kinds_in_id_order() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap();
        let b = store.create_vertex().unwrap();
        let ab = store.create_edge(a.id(), b.id(), KNOWS).unwrap();
        let c = store.create_vertex().unwrap();
        let cb = store.create_edge(c.id(), b.id(), KNOWS).unwrap();
        store.remove_vertex(a.id()).unwrap();

        let (vertices, edges) = store.contents().unwrap();
        let vertex_ids: Vec<_> = vertices.iter().map(|v| v.id()).collect();
        let edge_ids: Vec<_> = edges.iter().map(|e| e.id()).collect();
        assert_eq!(vertex_ids, vec![b.id(), c.id()]);
        assert_eq!(edge_ids, vec![cb.id()]);
        assert!(!edge_ids.contains(&ab.id()));
    }

    #[test]
    fn test_clear() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap();
        store.create_edge(a.id(), a.id(), KNOWS).unwrap();
        store.clear().unwrap();
        assert_eq!(store.vertex_count().unwrap(), 0);
        assert_eq!(a.out_degree(), 0);
    }
}
