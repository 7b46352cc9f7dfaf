//! Registry of named, live indices.
//!
//! Readers load the current map without taking any lock. Mutations enter the
//! factory's write gate, build a modified copy of the map and publish it with
//! a single atomic swap, so a reader that fetched the previous map keeps a
//! consistent view for as long as it holds it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tessera_common::collections::{TesseraMap, tessera_map};
use tessera_common::utils::{Error, Result};

use super::{Index, IndexParameters, default_index_plugins};
use crate::graph::{Element, GraphElementSource};
use crate::plugin::PluginRegistry;
use crate::resource::{LockPolicy, ThreadSafeResource};
use crate::storage::{SerializationReader, SerializationWriter};

type IndexMap = TesseraMap<String, Arc<dyn Index>>;

/// Creates, looks up, deletes and persists indices by name.
///
/// # Example
///
/// ```
/// use tessera_core::index::{IndexFactory, IndexParameters};
///
/// let factory = IndexFactory::new();
/// factory
///     .try_create_index("age", "RangeIndex", &IndexParameters::new())
///     .unwrap();
///
/// assert!(factory.try_get_index("age").unwrap().as_range().is_some());
/// assert!(factory.try_get_index("name").is_none());
/// ```
pub struct IndexFactory {
    indices: ArcSwap<IndexMap>,
    writer: ThreadSafeResource<()>,
    plugins: Arc<PluginRegistry<dyn Index>>,
    policy: LockPolicy,
}

impl IndexFactory {
    /// A factory knowing the built-in index types.
    #[must_use]
    pub fn new() -> Self {
        Self::with_plugins(Arc::new(default_index_plugins()), LockPolicy::default())
    }

    /// A factory resolving type names through `plugins`, with every gate it
    /// creates using `policy`.
    #[must_use]
    pub fn with_plugins(plugins: Arc<PluginRegistry<dyn Index>>, policy: LockPolicy) -> Self {
        Self {
            indices: ArcSwap::from_pointee(tessera_map()),
            writer: ThreadSafeResource::with_policy("IndexFactory", (), policy),
            plugins,
            policy,
        }
    }

    /// The registry used to resolve type names.
    #[must_use]
    pub fn plugins(&self) -> &Arc<PluginRegistry<dyn Index>> {
        &self.plugins
    }

    fn instantiate(&self, type_name: &str) -> Option<Box<dyn Index>> {
        let mut index = self.plugins.try_find_plugin(type_name)?;
        index.set_lock_policy(self.policy);
        Some(index)
    }

    /// Publishes a copy of the map with `name` bound to `index`.
    fn publish(&self, name: &str, index: Arc<dyn Index>) -> Result<()> {
        let _gate = self.writer.begin_write()?;
        let current = self.indices.load();
        if current.contains_key(name) {
            return Err(Error::IndexExists(name.to_string()));
        }
        let mut next = IndexMap::clone(&current);
        next.insert(name.to_string(), index);
        self.indices.store(Arc::new(next));
        Ok(())
    }

    /// Creates and registers a new index.
    ///
    /// # Errors
    ///
    /// - [`Error::IndexExists`] if `name` is taken.
    /// - [`Error::UnknownPlugin`] if no index type is registered as `type_name`.
    /// - Whatever [`Index::initialize`] rejects.
    /// - A collision on the factory's gate.
    pub fn try_create_index(
        &self,
        name: &str,
        type_name: &str,
        parameters: &IndexParameters,
    ) -> Result<Arc<dyn Index>> {
        if self.indices.load().contains_key(name) {
            return Err(Error::IndexExists(name.to_string()));
        }
        let mut index = self
            .instantiate(type_name)
            .ok_or_else(|| Error::UnknownPlugin(type_name.to_string()))?;
        index.initialize(parameters)?;

        let index: Arc<dyn Index> = Arc::from(index);
        self.publish(name, Arc::clone(&index))?;
        tracing::info!(index = name, index_type = type_name, "index created");
        Ok(index)
    }

    /// Unregisters an index. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns a collision on the factory's gate.
    pub fn try_delete_index(&self, name: &str) -> Result<bool> {
        let _gate = self.writer.begin_write()?;
        let current = self.indices.load();
        if !current.contains_key(name) {
            return Ok(false);
        }
        let mut next = IndexMap::clone(&current);
        next.remove(name);
        self.indices.store(Arc::new(next));
        tracing::info!(index = name, "index deleted");
        Ok(true)
    }

    /// Looks up an index by name.
    #[must_use]
    pub fn try_get_index(&self, name: &str) -> Option<Arc<dyn Index>> {
        self.indices.load().get(name).cloned()
    }

    /// Unregisters every index at once.
    ///
    /// # Errors
    ///
    /// Returns a collision on the factory's gate.
    pub fn delete_all_indices(&self) -> Result<()> {
        let _gate = self.writer.begin_write()?;
        let dropped = self.indices.swap(Arc::new(tessera_map())).len();
        tracing::debug!(dropped, "all indices deleted");
        Ok(())
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indices.load().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.load().len()
    }

    /// Returns `true` if no index is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuilds a persisted index and registers it under `name`.
    ///
    /// An unknown `type_name` is logged and yields `Ok(None)`; the caller's
    /// reader is left where it was.
    ///
    /// # Errors
    ///
    /// - [`Error::IndexExists`] if `name` is taken.
    /// - Malformed persisted bytes.
    /// - A collision on the factory's gate or on `source`.
    pub fn open_index(
        &self,
        name: &str,
        type_name: &str,
        reader: &mut SerializationReader<'_>,
        source: &dyn GraphElementSource,
    ) -> Result<Option<Arc<dyn Index>>> {
        let Some(mut index) = self.instantiate(type_name) else {
            tracing::error!(index = name, index_type = type_name, "unknown index type, index not opened");
            return Ok(None);
        };
        index.deserialize(reader, source)?;

        let index: Arc<dyn Index> = Arc::from(index);
        self.publish(name, Arc::clone(&index))?;
        tracing::debug!(index = name, index_type = type_name, "index opened");
        Ok(Some(index))
    }

    /// Writes every registered index as `[count][per index: name, type
    /// name, length-prefixed index bytes]`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a collision on an index gate or a serialization error.
    pub fn serialize_all(&self, writer: &mut SerializationWriter) -> Result<()> {
        let current = self.indices.load_full();
        let mut entries: Vec<(&String, &Arc<dyn Index>)> = current.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

        writer.write_count(entries.len())?;
        for (name, index) in entries {
            let mut block = SerializationWriter::new();
            index.serialize(&mut block)?;
            writer.write_string(name)?;
            writer.write_string(index.type_name())?;
            writer.write_bytes(block.as_bytes())?;
        }
        Ok(())
    }

    /// Reads what [`IndexFactory::serialize_all`] wrote and registers each
    /// index. Blocks of unknown type are skipped. Returns how many indices
    /// were opened.
    ///
    /// # Errors
    ///
    /// Returns malformed-input errors, [`Error::IndexExists`] for a name
    /// already registered, or a collision.
    pub fn deserialize_all(
        &self,
        reader: &mut SerializationReader<'_>,
        source: &dyn GraphElementSource,
    ) -> Result<usize> {
        let count = reader.read_count()?;
        let mut opened = 0;
        for _ in 0..count {
            let name = reader.read_string()?;
            let type_name = reader.read_string()?;
            let block = reader.read_bytes()?;
            let mut block_reader = SerializationReader::new(block);
            if self
                .open_index(&name, &type_name, &mut block_reader, source)?
                .is_some()
            {
                opened += 1;
            }
        }
        Ok(opened)
    }

    /// Removes `element` from every registered index.
    ///
    /// Every index is attempted even when an earlier one fails, so a
    /// collision leaves only the colliding indices to purge again.
    /// Purging an element an index no longer holds is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first collision met, after all indices were attempted.
    pub fn remove_from_all(&self, element: &Element) -> Result<()> {
        let current = self.indices.load_full();
        let mut first_error = None;
        for (name, index) in current.iter() {
            if let Err(err) = index.remove_value(element) {
                tracing::warn!(index = %name, error = %err, "index purge failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Default for IndexFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IndexFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexFactory")
            .field("indices", &self.index_names())
            .field("policy", &self.policy)
            .finish()
    }
}
