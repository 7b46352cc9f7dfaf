//! The database facade and its snapshot format.
//!
//! Start here with [`TesseraDB`]. It ties the element store, the index
//! factory and the plugin registries together and keeps indices consistent
//! when elements go away.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use tessera_common::types::{EdgeId, ElementId, PropertyId, Value, VertexId};
use tessera_common::utils::{Error, Result};
use tessera_core::graph::{Edge, Element, ElementSnapshot, GraphElement, GraphStore, Vertex};
use tessera_core::index::{Index, IndexFactory, IndexParameters, default_index_plugins};
use tessera_core::path::{Path as GraphPath, ShortestPathAlgorithm, ShortestPathRequest, default_path_plugins};
use tessera_core::plugin::PluginRegistry;
use tessera_core::storage::{SerializationReader, SerializationWriter};

use crate::config::Config;

/// Current snapshot layout.
const SNAPSHOT_VERSION: u8 = 1;

/// Your handle to a Tessera database.
///
/// Create one with [`new_in_memory()`](Self::new_in_memory), or with
/// [`open()`](Self::open) to start from a snapshot file. All state lives in
/// memory; [`save()`](Self::save) and [`flush()`](Self::flush) write it out.
///
/// # Examples
///
/// ```
/// use tessera_common::types::PropertyId;
/// use tessera_core::path::{BidirectionalLevelSynchronousBfs, ShortestPathRequest};
/// use tessera_engine::TesseraDB;
///
/// let db = TesseraDB::new_in_memory();
/// let road = PropertyId::new(1);
/// let a = db.create_vertex()?.id();
/// let b = db.create_vertex()?.id();
/// db.create_edge(a, b, road)?;
///
/// let paths = db.shortest_paths(
///     BidirectionalLevelSynchronousBfs::NAME,
///     ShortestPathRequest::new(a, b),
/// )?;
/// assert_eq!(paths[0].vertex_ids(), vec![a, b]);
/// # Ok::<(), tessera_common::utils::Error>(())
/// ```
pub struct TesseraDB {
    /// Database configuration.
    config: Config,
    /// Every live vertex and edge.
    store: Arc<GraphStore>,
    /// Named indices.
    indices: Arc<IndexFactory>,
    /// Shortest-path algorithms by name.
    path_plugins: PluginRegistry<dyn ShortestPathAlgorithm>,
    /// Serializes writers of the snapshot file.
    persist: Mutex<()>,
    /// Removed elements some index still holds after a collided purge.
    pending_purge: Mutex<Vec<Element>>,
}

impl TesseraDB {
    /// Creates an empty in-memory database with the default configuration.
    #[must_use]
    pub fn new_in_memory() -> Self {
        Self::build(Config::in_memory())
    }

    /// Opens the snapshot at `path`, or starts empty if the file does not
    /// exist yet. [`flush()`](Self::flush) writes back to the same file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(Config::persistent(path.as_ref()))
    }

    /// Creates a database with custom configuration.
    ///
    /// When `config.path` names an existing snapshot file it is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the configuration does not
    /// validate, or an error if the snapshot cannot be loaded.
    pub fn with_config(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;

        let db = Self::build(config);
        if let Some(path) = db.config.path.as_deref()
            && path.exists()
        {
            let data = fs::read(path)?;
            db.load_snapshot(&data)?;
            tracing::info!(
                path = %path.display(),
                vertices = db.store.vertex_count()?,
                indices = db.indices.len(),
                "snapshot loaded"
            );
        }
        Ok(db)
    }

    fn build(config: Config) -> Self {
        let store = Arc::new(GraphStore::with_policy(config.lock_policy));
        let indices = Arc::new(IndexFactory::with_plugins(
            Arc::new(default_index_plugins()),
            config.lock_policy,
        ));
        Self {
            config,
            store,
            indices,
            path_plugins: default_path_plugins(),
            persist: Mutex::new(()),
            pending_purge: Mutex::new(Vec::new()),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the element store.
    #[must_use]
    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    /// Returns the index factory.
    #[must_use]
    pub fn indices(&self) -> &Arc<IndexFactory> {
        &self.indices
    }

    /// Returns the registry of shortest-path algorithms. Further algorithms
    /// can be registered on it.
    #[must_use]
    pub fn path_plugins(&self) -> &PluginRegistry<dyn ShortestPathAlgorithm> {
        &self.path_plugins
    }

    // =========================================================================
    // Elements
    // =========================================================================

    /// Creates a vertex without properties.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store is busy.
    pub fn create_vertex(&self) -> Result<Arc<Vertex>> {
        self.store.create_vertex()
    }

    /// Creates a vertex with properties.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store is busy.
    pub fn create_vertex_with_props(
        &self,
        properties: impl IntoIterator<Item = (PropertyId, Value)>,
    ) -> Result<Arc<Vertex>> {
        self.store.create_vertex_with_props(properties)
    }

    /// Creates an edge from `source` to `target` grouped under `edge_property_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if an endpoint does not exist, or a
    /// collision.
    pub fn create_edge(&self, source: VertexId, target: VertexId, edge_property_id: PropertyId) -> Result<Arc<Edge>> {
        self.store.create_edge(source, target, edge_property_id)
    }

    /// Creates an edge with properties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if an endpoint does not exist, or a
    /// collision.
    pub fn create_edge_with_props(
        &self,
        source: VertexId,
        target: VertexId,
        edge_property_id: PropertyId,
        properties: impl IntoIterator<Item = (PropertyId, Value)>,
    ) -> Result<Arc<Edge>> {
        self.store
            .create_edge_with_props(source, target, edge_property_id, properties)
    }

    /// Looks up a vertex.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store is busy.
    pub fn get_vertex(&self, id: VertexId) -> Result<Option<Arc<Vertex>>> {
        self.store.get_vertex(id)
    }

    /// Looks up an edge.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store is busy.
    pub fn get_edge(&self, id: EdgeId) -> Result<Option<Arc<Edge>>> {
        self.store.get_edge(id)
    }

    /// Sets a property on a vertex or edge, returning the previous value.
    ///
    /// Indices are not updated; callers index the values they care about.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store is busy.
    pub fn set_property(&self, id: ElementId, property: PropertyId, value: Value) -> Result<Option<Value>> {
        self.store.set_property(id, property, value)
    }

    /// Removes a vertex and its incident edges, then purges all of them from
    /// every index. Returns whether the vertex existed.
    ///
    /// The store removal stands even when a purge collides. Elements an
    /// index could not release are kept and purged again by the next
    /// removal or by [`retry_purge()`](Self::retry_purge).
    ///
    /// # Errors
    ///
    /// Returns a collision on the store or on an index.
    pub fn remove_vertex(&self, id: VertexId) -> Result<bool> {
        let Some((vertex, edges)) = self.store.remove_vertex(id)? else {
            self.retry_purge()?;
            return Ok(false);
        };
        let detached = edges.len();
        let mut removed = Vec::with_capacity(detached + 1);
        removed.push(Element::Vertex(vertex));
        removed.extend(edges.into_iter().map(Element::Edge));
        self.purge(removed)?;
        tracing::debug!(vertex = %id, edges = detached, "vertex removed");
        Ok(true)
    }

    /// Removes an edge and purges it from every index. Returns whether the
    /// edge existed.
    ///
    /// A collided purge is kept for retry as in
    /// [`remove_vertex()`](Self::remove_vertex).
    ///
    /// # Errors
    ///
    /// Returns a collision on the store or on an index.
    pub fn remove_edge(&self, id: EdgeId) -> Result<bool> {
        let Some(edge) = self.store.remove_edge(id)? else {
            self.retry_purge()?;
            return Ok(false);
        };
        self.purge(vec![Element::Edge(edge)])?;
        Ok(true)
    }

    /// Purges again every removed element an earlier collision left behind
    /// in some index.
    ///
    /// # Errors
    ///
    /// Returns the first collision; elements still held stay queued.
    pub fn retry_purge(&self) -> Result<()> {
        self.purge(Vec::new())
    }

    /// Number of removed elements waiting for an index purge.
    #[must_use]
    pub fn pending_purge_count(&self) -> usize {
        self.pending_purge.lock().len()
    }

    fn purge(&self, removed: Vec<Element>) -> Result<()> {
        let mut pending = self.pending_purge.lock();
        pending.extend(removed);
        let mut first_error = None;
        pending.retain(|element| match self.indices.remove_from_all(element) {
            Ok(()) => false,
            Err(err) => {
                first_error.get_or_insert(err);
                true
            }
        });
        if !pending.is_empty() {
            tracing::warn!(pending = pending.len(), "index purge deferred");
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Number of live vertices.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store is busy.
    pub fn vertex_count(&self) -> Result<usize> {
        self.store.vertex_count()
    }

    /// Number of live edges.
    ///
    /// # Errors
    ///
    /// Returns a collision if the store is busy.
    pub fn edge_count(&self) -> Result<usize> {
        self.store.edge_count()
    }

    /// Drops every index, vertex and edge.
    ///
    /// # Errors
    ///
    /// Returns a collision on the factory or the store.
    pub fn clear(&self) -> Result<()> {
        self.indices.delete_all_indices()?;
        self.pending_purge.lock().clear();
        self.store.clear()
    }

    // =========================================================================
    // Indices
    // =========================================================================

    /// Creates an index of `type_name` with default parameters.
    ///
    /// # Errors
    ///
    /// See [`IndexFactory::try_create_index`].
    pub fn create_index(&self, name: &str, type_name: &str) -> Result<Arc<dyn Index>> {
        self.indices
            .try_create_index(name, type_name, &IndexParameters::new())
    }

    /// Creates an index of `type_name` with explicit parameters.
    ///
    /// # Errors
    ///
    /// See [`IndexFactory::try_create_index`].
    pub fn create_index_with(
        &self,
        name: &str,
        type_name: &str,
        parameters: &IndexParameters,
    ) -> Result<Arc<dyn Index>> {
        self.indices.try_create_index(name, type_name, parameters)
    }

    /// Creates an index of the configured default type.
    ///
    /// # Errors
    ///
    /// See [`IndexFactory::try_create_index`].
    pub fn create_default_index(&self, name: &str) -> Result<Arc<dyn Index>> {
        self.create_index(name, &self.config.default_index_type)
    }

    /// Looks up an index by name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<Arc<dyn Index>> {
        self.indices.try_get_index(name)
    }

    /// Deletes an index. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns a collision on the factory.
    pub fn drop_index(&self, name: &str) -> Result<bool> {
        self.indices.try_delete_index(name)
    }

    // =========================================================================
    // Paths
    // =========================================================================

    /// Runs the shortest-path algorithm registered as `algorithm`.
    ///
    /// A request without its own frontier limit gets the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPlugin`] for an unregistered algorithm, or a
    /// collision on the store.
    pub fn shortest_paths(&self, algorithm: &str, mut request: ShortestPathRequest) -> Result<Vec<GraphPath>> {
        let plugin = self
            .path_plugins
            .try_find_plugin(algorithm)
            .ok_or_else(|| Error::UnknownPlugin(algorithm.to_string()))?;
        request.set_default_frontier_limit(self.config.path_frontier_limit);
        let paths = plugin.calculate(&self.store, &request)?;
        tracing::debug!(
            algorithm,
            source = %request.source(),
            destination = %request.destination(),
            found = paths.len(),
            "shortest paths computed"
        );
        Ok(paths)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Exports the graph and every index to a binary snapshot.
    ///
    /// The graph block is bincode-encoded; the index block uses the index
    /// persistence format. Restore with [`import_snapshot()`](Self::import_snapshot).
    ///
    /// Vertices and edges are read together, so every exported edge has both
    /// endpoints. Indices are read afterwards; an index entry for an element
    /// removed or added in between is dropped on import.
    ///
    /// # Errors
    ///
    /// Returns a collision or a serialization error.
    pub fn export_snapshot(&self) -> Result<Vec<u8>> {
        let (vertices, edges) = self.store.contents()?;
        let next_id = self.store.next_id();

        let vertices: Vec<SnapshotVertex> = vertices
            .iter()
            .map(|v| SnapshotVertex {
                id: v.id(),
                element: v.header().snapshot(),
            })
            .collect();

        let edges: Vec<SnapshotEdge> = edges
            .iter()
            .map(|e| SnapshotEdge {
                id: e.id(),
                source: e.source_id(),
                target: e.target_id(),
                edge_property_id: e.edge_property_id(),
                weight: e.weight(),
                element: e.header().snapshot(),
            })
            .collect();

        let mut index_block = SerializationWriter::new();
        self.indices.serialize_all(&mut index_block)?;

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            next_id,
            vertices,
            edges,
            indices: index_block.into_bytes(),
        };

        let config = bincode::config::standard();
        bincode::serde::encode_to_vec(&snapshot, config)
            .map_err(|e| Error::Serialization(format!("snapshot export failed: {e}")))
    }

    /// Creates a new in-memory database from a binary snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is malformed or of another version.
    pub fn import_snapshot(data: &[u8]) -> Result<Self> {
        let db = Self::new_in_memory();
        db.load_snapshot(data)?;
        Ok(db)
    }

    fn load_snapshot(&self, data: &[u8]) -> Result<()> {
        let config = bincode::config::standard();
        let (snapshot, _): (Snapshot, _) = bincode::serde::decode_from_slice(data, config)
            .map_err(|e| Error::Serialization(format!("snapshot import failed: {e}")))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported snapshot version: {}",
                snapshot.version
            )));
        }

        for vertex in snapshot.vertices {
            self.store.restore_vertex(vertex.id, vertex.element)?;
        }
        for edge in snapshot.edges {
            let restored = self.store.restore_edge(
                edge.id,
                edge.source,
                edge.target,
                edge.edge_property_id,
                edge.element,
            )?;
            restored.set_weight(edge.weight);
        }
        if let Some(last) = snapshot.next_id.checked_sub(1) {
            self.store.reserve_ids_through(last);
        }

        let mut reader = SerializationReader::new(&snapshot.indices);
        let opened = self.indices.deserialize_all(&mut reader, self.store.as_ref())?;
        tracing::debug!(indices = opened, "snapshot indices opened");
        Ok(())
    }

    /// Writes a snapshot to `path`, replacing the file if it exists.
    ///
    /// The snapshot is written next to the target and renamed into place,
    /// so a reader never sees a partial file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error, a collision or a serialization error.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let _guard = self.persist.lock();
        let data = self.export_snapshot()?;

        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        fs::write(&staging, &data)?;
        fs::rename(&staging, path)?;
        tracing::info!(path = %path.display(), bytes = data.len(), "snapshot saved");
        Ok(())
    }

    /// Saves to the configured snapshot file. Returns `false` without doing
    /// anything for a purely in-memory database.
    ///
    /// # Errors
    ///
    /// See [`save()`](Self::save).
    pub fn flush(&self) -> Result<bool> {
        match self.config.path.as_deref() {
            Some(path) => self.save(path).map(|()| true),
            None => Ok(false),
        }
    }
}

impl Default for TesseraDB {
    fn default() -> Self {
        Self::new_in_memory()
    }
}

impl std::fmt::Debug for TesseraDB {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TesseraDB")
            .field("config", &self.config)
            .field("indices", &self.indices.index_names())
            .field("path_plugins", &self.path_plugins.names())
            .finish_non_exhaustive()
    }
}

/// Binary snapshot format for database export/import.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u8,
    next_id: u64,
    vertices: Vec<SnapshotVertex>,
    edges: Vec<SnapshotEdge>,
    indices: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotVertex {
    id: VertexId,
    element: ElementSnapshot,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEdge {
    id: EdgeId,
    source: VertexId,
    target: VertexId,
    edge_property_id: PropertyId,
    weight: Option<f64>,
    element: ElementSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::path::LevelSynchronousBfs;

    const NAME: PropertyId = PropertyId::new(0);
    const ROAD: PropertyId = PropertyId::new(1);

    #[test]
    fn test_invalid_config_rejected() {
        let err = TesseraDB::with_config(Config::default().with_path_frontier_limit(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_remove_vertex_purges_indices() {
        let db = TesseraDB::new_in_memory();
        let alix = db.create_vertex_with_props([(NAME, Value::from("Alix"))]).unwrap();
        let gus = db.create_vertex().unwrap();
        let edge = db.create_edge(alix.id(), gus.id(), ROAD).unwrap();

        let vertices = db.create_default_index("vertices").unwrap();
        vertices.add_or_update(&Value::from("Alix"), Element::Vertex(Arc::clone(&alix))).unwrap();
        vertices.add_or_update(&Value::from("Gus"), Element::Vertex(Arc::clone(&gus))).unwrap();
        let edges = db.create_index("edges", "RangeIndex").unwrap();
        edges.add_or_update(&Value::Int64(3), Element::Edge(edge)).unwrap();

        assert!(db.remove_vertex(alix.id()).unwrap());
        assert!(!db.remove_vertex(alix.id()).unwrap());

        assert_eq!(vertices.try_get_value(&Value::from("Alix")).unwrap(), None);
        assert_eq!(vertices.count_of_keys().unwrap(), 1);
        assert_eq!(edges.count_of_keys().unwrap(), 0);
        assert_eq!(db.edge_count().unwrap(), 0);
    }

    #[test]
    fn test_remove_edge_purges_indices() {
        let db = TesseraDB::new_in_memory();
        let a = db.create_vertex().unwrap().id();
        let b = db.create_vertex().unwrap().id();
        let edge = db.create_edge(a, b, ROAD).unwrap();
        let index = db.create_index("edges", "SingleValueIndex").unwrap();
        index.add_or_update(&Value::Int64(1), Element::Edge(Arc::clone(&edge))).unwrap();

        assert!(db.remove_edge(edge.id()).unwrap());
        assert!(index.key_values().unwrap().is_empty());
        assert_eq!(db.vertex_count().unwrap(), 2);
    }

    #[test]
    fn test_shortest_paths_by_name() {
        let db = TesseraDB::with_config(Config::default().with_path_frontier_limit(1)).unwrap();
        let hub = db.create_vertex().unwrap().id();
        let goal = db.create_vertex().unwrap().id();
        for _ in 0..3 {
            let mid = db.create_vertex().unwrap().id();
            db.create_edge(hub, mid, ROAD).unwrap();
            db.create_edge(mid, goal, ROAD).unwrap();
        }

        // The configured limit of one partial path cuts the first layer.
        let limited = db
            .shortest_paths(LevelSynchronousBfs::NAME, ShortestPathRequest::new(hub, goal))
            .unwrap();
        assert!(limited.is_empty());

        // An explicit request limit wins over the configured one.
        let request = ShortestPathRequest::new(hub, goal)
            .with_max_results(5)
            .with_frontier_limit(10);
        let paths = db.shortest_paths(LevelSynchronousBfs::NAME, request).unwrap();
        assert_eq!(paths.len(), 3);

        let err = db
            .shortest_paths("Dijkstra", ShortestPathRequest::new(hub, goal))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownPlugin(name) if name == "Dijkstra"));
    }

    #[test]
    fn test_snapshot_version_checked() {
        let snapshot = Snapshot {
            version: 9,
            next_id: 0,
            vertices: Vec::new(),
            edges: Vec::new(),
            indices: Vec::new(),
        };
        let data = bincode::serde::encode_to_vec(&snapshot, bincode::config::standard()).unwrap();
        let err = TesseraDB::import_snapshot(&data).unwrap_err();
        assert!(err.to_string().contains("unsupported snapshot version"));
    }

    #[test]
    fn test_flush_without_path() {
        let db = TesseraDB::new_in_memory();
        assert!(!db.flush().unwrap());
    }
}
