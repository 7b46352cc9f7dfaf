//! Hash index for exact-match lookups.
//!
//! The default index type. Any orderable [`Value`] can be a key and several
//! elements can share one.

use tessera_common::types::{IndexKey, Value};
use tessera_common::utils::Result;

use super::multi_value::MultiValueStore;
use super::{Index, IndexParameters};
use crate::graph::{Element, GraphElementSource};
use crate::resource::LockPolicy;
use crate::storage::{SerializationReader, SerializationWriter};

/// Exact-match index from value to a set of elements.
///
/// Parameters:
///
/// - `capacity` (integer): number of keys to reserve room for.
///
/// # Example
///
/// ```
/// use tessera_core::graph::{Element, GraphStore};
/// use tessera_core::index::{DictionaryIndex, Index};
/// use tessera_common::types::Value;
///
/// let store = GraphStore::new();
/// let alix = Element::Vertex(store.create_vertex().unwrap());
///
/// let index = DictionaryIndex::new();
/// index.add_or_update(&Value::from("Alix"), alix.clone()).unwrap();
///
/// assert_eq!(index.try_get_value(&Value::from("Alix")).unwrap(), Some(vec![alix]));
/// assert_eq!(index.try_get_value(&Value::from("Gus")).unwrap(), None);
/// ```
pub struct DictionaryIndex {
    store: MultiValueStore,
    parameters: IndexParameters,
}

impl DictionaryIndex {
    /// Plugin type name.
    pub const TYPE_NAME: &'static str = "DictionaryIndex";

    const PARAMETERS: &'static [&'static str] = &["capacity"];

    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: MultiValueStore::new(Self::TYPE_NAME),
            parameters: IndexParameters::new(),
        }
    }
}

impl Default for DictionaryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Index for DictionaryIndex {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn set_lock_policy(&mut self, policy: LockPolicy) {
        self.store.set_policy(policy);
    }

    fn initialize(&mut self, parameters: &IndexParameters) -> Result<()> {
        parameters.expect_only(Self::TYPE_NAME, Self::PARAMETERS)?;
        let capacity = parameters.get_usize("capacity")?.unwrap_or(0);
        self.store.reset(capacity);
        self.parameters = parameters.clone();
        Ok(())
    }

    fn parameters(&self) -> IndexParameters {
        self.parameters.clone()
    }

    fn count_of_keys(&self) -> Result<usize> {
        self.store.count_of_keys()
    }

    fn count_of_values(&self) -> Result<usize> {
        self.store.count_of_values()
    }

    fn add_or_update(&self, key: &Value, element: Element) -> Result<()> {
        match IndexKey::from_value(key) {
            Some(key) => self.store.add(key, element),
            None => {
                tracing::trace!(index = Self::TYPE_NAME, key_type = key.type_name(), "key ignored");
                Ok(())
            }
        }
    }

    fn try_remove_key(&self, key: &Value) -> Result<bool> {
        match IndexKey::from_value(key) {
            Some(key) => self.store.remove_key(&key),
            None => Ok(false),
        }
    }

    fn remove_value(&self, element: &Element) -> Result<()> {
        self.store.remove_value(element)
    }

    fn wipe(&self) -> Result<()> {
        self.store.wipe()
    }

    fn keys(&self) -> Result<Vec<IndexKey>> {
        self.store.keys()
    }

    fn key_values(&self) -> Result<Vec<(IndexKey, Vec<Element>)>> {
        self.store.key_values()
    }

    fn try_get_value(&self, key: &Value) -> Result<Option<Vec<Element>>> {
        match IndexKey::from_value(key) {
            Some(key) => self.store.get(&key),
            None => Ok(None),
        }
    }

    fn serialize(&self, writer: &mut SerializationWriter) -> Result<()> {
        writer.write_object(&self.parameters)?;
        self.store.serialize_buckets(writer)
    }

    fn deserialize(
        &mut self,
        reader: &mut SerializationReader<'_>,
        source: &dyn GraphElementSource,
    ) -> Result<()> {
        let parameters: IndexParameters = reader.read_object()?;
        self.initialize(&parameters)?;
        self.store.deserialize_buckets(reader, source)
    }
}
