//! Unique-key index.

use tessera_common::collections::{TesseraMap, tessera_map_with_capacity};
use tessera_common::types::{IndexKey, Value};
use tessera_common::utils::Result;

use super::{Index, IndexParameters, read_bucket, write_bucket};
use crate::graph::{Element, GraphElementSource};
use crate::resource::{LockPolicy, ThreadSafeResource};
use crate::storage::{SerializationReader, SerializationWriter};

/// Index mapping each key to at most one element.
///
/// `add_or_update` on an existing key replaces its element, so the last
/// write wins. Use it for properties known to be unique.
///
/// Parameters:
///
/// - `capacity` (integer): number of keys to reserve room for.
pub struct SingleValueIndex {
    entries: ThreadSafeResource<TesseraMap<IndexKey, Element>>,
    parameters: IndexParameters,
}

impl SingleValueIndex {
    /// Plugin type name.
    pub const TYPE_NAME: &'static str = "SingleValueIndex";

    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: ThreadSafeResource::new(Self::TYPE_NAME, tessera_map_with_capacity(0)),
            parameters: IndexParameters::new(),
        }
    }
}

impl Default for SingleValueIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Index for SingleValueIndex {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn set_lock_policy(&mut self, policy: LockPolicy) {
        self.entries.set_policy(policy);
    }

    fn initialize(&mut self, parameters: &IndexParameters) -> Result<()> {
        parameters.expect_only(Self::TYPE_NAME, &["capacity"])?;
        let capacity = parameters.get_usize("capacity")?.unwrap_or(0);
        *self.entries.get_mut() = tessera_map_with_capacity(capacity);
        self.parameters = parameters.clone();
        Ok(())
    }

    fn parameters(&self) -> IndexParameters {
        self.parameters.clone()
    }

    fn count_of_keys(&self) -> Result<usize> {
        Ok(self.entries.begin_read()?.len())
    }

    fn count_of_values(&self) -> Result<usize> {
        self.count_of_keys()
    }

    fn add_or_update(&self, key: &Value, element: Element) -> Result<()> {
        let Some(key) = IndexKey::from_value(key) else {
            tracing::trace!(index = Self::TYPE_NAME, key_type = key.type_name(), "key ignored");
            return Ok(());
        };
        self.entries.begin_write()?.insert(key, element);
        Ok(())
    }

    fn try_remove_key(&self, key: &Value) -> Result<bool> {
        let Some(key) = IndexKey::from_value(key) else {
            return Ok(false);
        };
        Ok(self.entries.begin_write()?.remove(&key).is_some())
    }

    fn remove_value(&self, element: &Element) -> Result<()> {
        self.entries.begin_write()?.retain(|_, e| e != element);
        Ok(())
    }

    fn wipe(&self) -> Result<()> {
        self.entries.begin_write()?.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<IndexKey>> {
        Ok(self.entries.begin_read()?.keys().cloned().collect())
    }

    fn key_values(&self) -> Result<Vec<(IndexKey, Vec<Element>)>> {
        Ok(self
            .entries
            .begin_read()?
            .iter()
            .map(|(k, e)| (k.clone(), vec![e.clone()]))
            .collect())
    }

    fn try_get_value(&self, key: &Value) -> Result<Option<Vec<Element>>> {
        let Some(key) = IndexKey::from_value(key) else {
            return Ok(None);
        };
        Ok(self.entries.begin_read()?.get(&key).map(|e| vec![e.clone()]))
    }

    fn serialize(&self, writer: &mut SerializationWriter) -> Result<()> {
        writer.write_object(&self.parameters)?;
        let entries = self.entries.begin_read()?;
        writer.write_count(entries.len())?;
        for (key, element) in entries.iter() {
            write_bucket(writer, key, std::iter::once(element))?;
        }
        Ok(())
    }

    fn deserialize(
        &mut self,
        reader: &mut SerializationReader<'_>,
        source: &dyn GraphElementSource,
    ) -> Result<()> {
        let parameters: IndexParameters = reader.read_object()?;
        self.initialize(&parameters)?;
        let count = reader.read_count()?;
        let entries = self.entries.get_mut();
        for _ in 0..count {
            let (key, elements) = read_bucket(reader, source, Self::TYPE_NAME)?;
            if let Some(last) = elements.into_iter().last() {
                entries.insert(key, last);
            }
        }
        Ok(())
    }
}
