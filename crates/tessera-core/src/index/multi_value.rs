//! Bucketed key-to-elements storage shared by the multi-value indices.
//!
//! [`DictionaryIndex`](super::DictionaryIndex), [`RangeIndex`](super::RangeIndex)
//! and [`RegExIndex`](super::RegExIndex) all store the same shape: a hash map
//! from [`IndexKey`] to an insertion-ordered set of elements. They differ in
//! which keys they accept and in the queries layered on top.
//!
//! A bucket is removed the moment its last element goes, so no key ever maps
//! to an empty set.

use tessera_common::collections::{TesseraIndexSet, TesseraMap, tessera_index_set, tessera_map_with_capacity};
use tessera_common::types::IndexKey;
use tessera_common::utils::Result;

use super::{read_bucket, write_bucket};
use crate::graph::{Element, GraphElementSource};
use crate::resource::{LockPolicy, ReadGuard, ThreadSafeResource};
use crate::storage::{SerializationReader, SerializationWriter};

pub(crate) type Bucket = TesseraIndexSet<Element>;
pub(crate) type BucketMap = TesseraMap<IndexKey, Bucket>;

pub(crate) struct MultiValueStore {
    type_name: &'static str,
    buckets: ThreadSafeResource<BucketMap>,
}

impl MultiValueStore {
    pub(crate) fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            buckets: ThreadSafeResource::new(type_name, tessera_map_with_capacity(0)),
        }
    }

    pub(crate) fn set_policy(&mut self, policy: LockPolicy) {
        self.buckets.set_policy(policy);
    }

    /// Drops the current content and reserves room for `capacity` keys.
    pub(crate) fn reset(&mut self, capacity: usize) {
        *self.buckets.get_mut() = tessera_map_with_capacity(capacity);
    }

    pub(crate) fn read(&self) -> Result<ReadGuard<'_, BucketMap>> {
        self.buckets.begin_read()
    }

    pub(crate) fn count_of_keys(&self) -> Result<usize> {
        Ok(self.buckets.begin_read()?.len())
    }

    pub(crate) fn count_of_values(&self) -> Result<usize> {
        Ok(self.buckets.begin_read()?.values().map(|b| b.len()).sum())
    }

    pub(crate) fn add(&self, key: IndexKey, element: Element) -> Result<()> {
        let mut buckets = self.buckets.begin_write()?;
        buckets.entry(key).or_insert_with(tessera_index_set).insert(element);
        Ok(())
    }

    pub(crate) fn remove_key(&self, key: &IndexKey) -> Result<bool> {
        Ok(self.buckets.begin_write()?.remove(key).is_some())
    }

    pub(crate) fn remove_value(&self, element: &Element) -> Result<()> {
        let mut buckets = self.buckets.begin_write()?;
        buckets.retain(|_, bucket| {
            bucket.shift_remove(element);
            !bucket.is_empty()
        });
        Ok(())
    }

    pub(crate) fn wipe(&self) -> Result<()> {
        self.buckets.begin_write()?.clear();
        Ok(())
    }

    pub(crate) fn keys(&self) -> Result<Vec<IndexKey>> {
        Ok(self.buckets.begin_read()?.keys().cloned().collect())
    }

    pub(crate) fn key_values(&self) -> Result<Vec<(IndexKey, Vec<Element>)>> {
        Ok(self
            .buckets
            .begin_read()?
            .iter()
            .map(|(k, bucket)| (k.clone(), bucket.iter().cloned().collect()))
            .collect())
    }

    pub(crate) fn get(&self, key: &IndexKey) -> Result<Option<Vec<Element>>> {
        Ok(self
            .buckets
            .begin_read()?
            .get(key)
            .map(|bucket| bucket.iter().cloned().collect()))
    }

    /// Writes key count and buckets. The parameter block is the caller's job.
    pub(crate) fn serialize_buckets(&self, writer: &mut SerializationWriter) -> Result<()> {
        let buckets = self.buckets.begin_read()?;
        writer.write_count(buckets.len())?;
        for (key, bucket) in buckets.iter() {
            write_bucket(writer, key, bucket.iter())?;
        }
        Ok(())
    }

    /// Replaces the content with buckets read back from `reader`.
    pub(crate) fn deserialize_buckets(
        &mut self,
        reader: &mut SerializationReader<'_>,
        source: &dyn GraphElementSource,
    ) -> Result<()> {
        let count = reader.read_count()?;
        let mut restored: BucketMap = tessera_map_with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            let (key, elements) = read_bucket(reader, source, self.type_name)?;
            if elements.is_empty() {
                continue;
            }
            restored
                .entry(key)
                .or_insert_with(tessera_index_set)
                .extend(elements);
        }
        *self.buckets.get_mut() = restored;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;

    fn elements(n: usize) -> (GraphStore, Vec<Element>) {
        let store = GraphStore::new();
        let all = (0..n)
            .map(|_| Element::Vertex(store.create_vertex().unwrap()))
            .collect();
        (store, all)
    }

    #[test]
    fn test_bucket_append_and_dedup() {
        let (_store, els) = elements(2);
        let index = MultiValueStore::new("Test");
        index.add(IndexKey::from("k"), els[0].clone()).unwrap();
        index.add(IndexKey::from("k"), els[1].clone()).unwrap();
        index.add(IndexKey::from("k"), els[0].clone()).unwrap();

        assert_eq!(index.count_of_keys().unwrap(), 1);
        assert_eq!(index.count_of_values().unwrap(), 2);
        assert_eq!(index.get(&IndexKey::from("k")).unwrap().unwrap(), els);
    }

    #[test]
    fn test_remove_value_drops_empty_buckets() {
        let (_store, els) = elements(2);
        let index = MultiValueStore::new("Test");
        index.add(IndexKey::from(1i64), els[0].clone()).unwrap();
        index.add(IndexKey::from(2i64), els[0].clone()).unwrap();
        index.add(IndexKey::from(2i64), els[1].clone()).unwrap();

        index.remove_value(&els[0]).unwrap();
        assert_eq!(index.keys().unwrap(), vec![IndexKey::from(2i64)]);
        assert!(index.get(&IndexKey::from(1i64)).unwrap().is_none());
    }

    #[test]
    fn test_dangling_ids_are_skipped() {
        let (store, els) = elements(2);
        let index = MultiValueStore::new("Test");
        index.add(IndexKey::from("a"), els[0].clone()).unwrap();
        index.add(IndexKey::from("b"), els[1].clone()).unwrap();

        let mut writer = SerializationWriter::new();
        index.serialize_buckets(&mut writer).unwrap();

        let gone = els[1].as_vertex().map(|v| v.id()).unwrap();
        store.remove_vertex(gone).unwrap();
        drop(els);

        let bytes = writer.into_bytes();
        let mut restored = MultiValueStore::new("Test");
        restored
            .deserialize_buckets(&mut SerializationReader::new(&bytes), &store)
            .unwrap();
        assert_eq!(restored.keys().unwrap(), vec![IndexKey::from("a")]);
        assert_eq!(restored.count_of_values().unwrap(), 1);
    }
}
