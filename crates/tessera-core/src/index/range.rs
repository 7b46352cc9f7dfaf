//! Range index: exact lookups plus ordered predicates.
//!
//! Storage is the same hash-bucket map as [`DictionaryIndex`](super::DictionaryIndex).
//! Range predicates scan every key, so a query costs O(keys) regardless of
//! how many match. Above `parallel_threshold` keys the scan fans out across
//! rayon's pool.
//!
//! Results are ordered by key, then by insertion order within a key, and an
//! element reachable through several matching keys appears once.

use std::ops::Bound;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tessera_common::collections::{TesseraIndexSet, tessera_index_set};
use tessera_common::types::{IndexKey, Value};
use tessera_common::utils::Result;

use super::multi_value::{Bucket, BucketMap, MultiValueStore};
use super::{Index, IndexParameters, RangeQuery};
use crate::graph::{Element, GraphElementSource};
use crate::resource::LockPolicy;
use crate::storage::{SerializationReader, SerializationWriter};

/// Ordered-query index over comparable keys.
///
/// Parameters:
///
/// - `capacity` (integer): number of keys to reserve room for.
/// - `parallel_threshold` (integer): key count from which scans run in
///   parallel. Defaults to [`RangeIndex::DEFAULT_PARALLEL_THRESHOLD`].
pub struct RangeIndex {
    store: MultiValueStore,
    parameters: IndexParameters,
    parallel_threshold: usize,
}

impl RangeIndex {
    /// Plugin type name.
    pub const TYPE_NAME: &'static str = "RangeIndex";

    /// Default key count from which range scans go parallel.
    pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

    const PARAMETERS: &'static [&'static str] = &["capacity", "parallel_threshold"];

    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: MultiValueStore::new(Self::TYPE_NAME),
            parameters: IndexParameters::new(),
            parallel_threshold: Self::DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Collects every element whose key lies within the bounds.
    fn scan(&self, lower: Bound<&IndexKey>, upper: Bound<&IndexKey>) -> Result<Option<Vec<Element>>> {
        let in_range = |key: &IndexKey| {
            let above = match lower {
                Bound::Included(lo) => key >= lo,
                Bound::Excluded(lo) => key > lo,
                Bound::Unbounded => true,
            };
            above
                && match upper {
                    Bound::Included(hi) => key <= hi,
                    Bound::Excluded(hi) => key < hi,
                    Bound::Unbounded => true,
                }
        };

        let buckets = self.store.read()?;
        let mut matching = self.filter_buckets(&buckets, &in_range);
        if matching.is_empty() {
            return Ok(None);
        }
        matching.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

        let mut seen: TesseraIndexSet<Element> = tessera_index_set();
        for (_, bucket) in matching {
            seen.extend(bucket.iter().cloned());
        }
        Ok(Some(seen.into_iter().collect()))
    }

    #[cfg(feature = "parallel")]
    fn filter_buckets<'a>(
        &self,
        buckets: &'a BucketMap,
        in_range: &(dyn Fn(&IndexKey) -> bool + Sync),
    ) -> Vec<(&'a IndexKey, &'a Bucket)> {
        if buckets.len() >= self.parallel_threshold {
            buckets.par_iter().filter(|(k, _)| in_range(k)).collect()
        } else {
            buckets.iter().filter(|(k, _)| in_range(k)).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn filter_buckets<'a>(
        &self,
        buckets: &'a BucketMap,
        in_range: &(dyn Fn(&IndexKey) -> bool + Sync),
    ) -> Vec<(&'a IndexKey, &'a Bucket)> {
        buckets.iter().filter(|(k, _)| in_range(k)).collect()
    }
}

impl Default for RangeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeQuery for RangeIndex {
    fn lower_than(&self, key: &Value, include_key: bool) -> Result<Option<Vec<Element>>> {
        let Some(key) = IndexKey::from_value(key) else {
            return Ok(None);
        };
        let upper = if include_key {
            Bound::Included(&key)
        } else {
            Bound::Excluded(&key)
        };
        self.scan(Bound::Unbounded, upper)
    }

    fn greater_than(&self, key: &Value, include_key: bool) -> Result<Option<Vec<Element>>> {
        let Some(key) = IndexKey::from_value(key) else {
            return Ok(None);
        };
        let lower = if include_key {
            Bound::Included(&key)
        } else {
            Bound::Excluded(&key)
        };
        self.scan(lower, Bound::Unbounded)
    }

    fn between(
        &self,
        lower: &Value,
        upper: &Value,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<Option<Vec<Element>>> {
        let (Some(lo), Some(hi)) = (IndexKey::from_value(lower), IndexKey::from_value(upper)) else {
            return Ok(None);
        };
        let lower = if include_lower {
            Bound::Included(&lo)
        } else {
            Bound::Excluded(&lo)
        };
        let upper = if include_upper {
            Bound::Included(&hi)
        } else {
            Bound::Excluded(&hi)
        };
        self.scan(lower, upper)
    }
}

impl Index for RangeIndex {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn set_lock_policy(&mut self, policy: LockPolicy) {
        self.store.set_policy(policy);
    }

    fn initialize(&mut self, parameters: &IndexParameters) -> Result<()> {
        parameters.expect_only(Self::TYPE_NAME, Self::PARAMETERS)?;
        let capacity = parameters.get_usize("capacity")?.unwrap_or(0);
        self.parallel_threshold = parameters
            .get_usize("parallel_threshold")?
            .unwrap_or(Self::DEFAULT_PARALLEL_THRESHOLD);
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

    fn as_range(&self) -> Option<&dyn RangeQuery> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;

    fn ages() -> (GraphStore, RangeIndex, Vec<Element>) {
        let store = GraphStore::new();
        let index = RangeIndex::new();
        let mut els = Vec::new();
        for age in [25i64, 30, 35, 40] {
            let e = Element::Vertex(store.create_vertex().unwrap());
            index.add_or_update(&Value::Int64(age), e.clone()).unwrap();
            els.push(e);
        }
        (store, index, els)
    }

    #[test]
    fn test_lower_than() {
        let (_store, index, els) = ages();
        assert_eq!(
            index.lower_than(&Value::Int64(35), false).unwrap(),
            Some(vec![els[0].clone(), els[1].clone()])
        );
        assert_eq!(
            index.lower_than(&Value::Int64(35), true).unwrap(),
            Some(els[..3].to_vec())
        );
        assert_eq!(index.lower_than(&Value::Int64(25), false).unwrap(), None);
    }

    #[test]
    fn test_greater_than() {
        let (_store, index, els) = ages();
        assert_eq!(
            index.greater_than(&Value::Float64(30.5), false).unwrap(),
            Some(els[2..].to_vec())
        );
        assert_eq!(index.greater_than(&Value::Int64(40), false).unwrap(), None);
        assert_eq!(
            index.greater_than(&Value::Int64(40), true).unwrap(),
            Some(vec![els[3].clone()])
        );
    }

    #[test]
    fn test_between() {
        let (_store, index, els) = ages();
        assert_eq!(
            index
                .between(&Value::Int64(30), &Value::Int64(40), true, false)
                .unwrap(),
            Some(vec![els[1].clone(), els[2].clone()])
        );
        assert_eq!(
            index
                .between(&Value::Int64(40), &Value::Int64(30), true, true)
                .unwrap(),
            None
        );
        assert_eq!(
            index
                .between(&Value::Null, &Value::Int64(30), true, true)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_int_and_float_bounds_agree_past_f64_precision() {
        let store = GraphStore::new();
        let index = RangeIndex::new();
        let two_53 = 1i64 << 53;
        let e = Element::Vertex(store.create_vertex().unwrap());
        index.add_or_update(&Value::Int64(two_53 + 1), e.clone()).unwrap();

        let by_int = index.greater_than(&Value::Int64(two_53), false).unwrap();
        let by_float = index.greater_than(&Value::Float64(two_53 as f64), false).unwrap();
        assert_eq!(by_int, Some(vec![e.clone()]));
        assert_eq!(by_float, by_int);
        assert_eq!(index.try_get_value(&Value::Float64(two_53 as f64)).unwrap(), None);
    }

    #[test]
    fn test_element_under_two_keys_reported_once() {
        let (store, index, _els) = ages();
        let e = Element::Vertex(store.create_vertex().unwrap());
        index.add_or_update(&Value::Int64(1), e.clone()).unwrap();
        index.add_or_update(&Value::Int64(2), e.clone()).unwrap();

        let found = index.lower_than(&Value::Int64(10), true).unwrap().unwrap();
        assert_eq!(found, vec![e]);
    }

    #[test]
    fn test_parallel_scan_matches_sequential() {
        let store = GraphStore::new();
        let mut index = RangeIndex::new();
        index
            .initialize(&IndexParameters::new().with("parallel_threshold", 1i64))
            .unwrap();
        for n in 0..200i64 {
            let e = Element::Vertex(store.create_vertex().unwrap());
            index.add_or_update(&Value::Int64(n), e).unwrap();
        }

        let found = index
            .between(&Value::Int64(50), &Value::Int64(149), true, true)
            .unwrap()
            .unwrap();
        assert_eq!(found.len(), 100);
        let first = found[0].as_vertex().unwrap().id().as_u64();
        assert_eq!(first, 50);
    }

    #[test]
    fn test_exposed_through_dyn_index() {
        let (_store, index, _els) = ages();
        let dynamic: &dyn Index = &index;
        let range = dynamic.as_range().unwrap();
        assert!(range.greater_than(&Value::Int64(0), false).unwrap().is_some());
    }
}
