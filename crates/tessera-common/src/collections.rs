//! Collection type aliases for Tessera.
//!
//! Use these instead of direct HashMap/HashSet so hashing stays consistent
//! across the workspace.
//!
//! | Type | Use Case |
//! |------|----------|
//! | [`TesseraMap`] | Single-threaded hash map |
//! | [`TesseraSet`] | Single-threaded hash set |
//! | [`TesseraConcurrentMap`] | Multi-threaded hash map |
//! | [`TesseraIndexMap`] | Insertion-order preserving map |
//! | [`TesseraIndexSet`] | Insertion-order preserving set |
//!
//! ```rust
//! use tessera_common::collections::{tessera_map, TesseraMap};
//!
//! let mut map: TesseraMap<String, i32> = tessera_map();
//! map.insert("key".to_string(), 42);
//! ```

use rustc_hash::FxBuildHasher;

/// HashMap with FxHash (fast, non-cryptographic).
pub type TesseraMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// HashSet with FxHash.
pub type TesseraSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

/// Concurrent HashMap with fine-grained sharded locking.
pub type TesseraConcurrentMap<K, V> = dashmap::DashMap<K, V, FxBuildHasher>;

/// Map preserving insertion order.
///
/// Index buckets use this so that enumeration follows insertion order.
pub type TesseraIndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

/// Set preserving insertion order.
pub type TesseraIndexSet<T> = indexmap::IndexSet<T, FxBuildHasher>;

/// Create a new empty [`TesseraMap`].
#[inline]
#[must_use]
pub fn tessera_map<K, V>() -> TesseraMap<K, V> {
    TesseraMap::with_hasher(FxBuildHasher)
}

/// Create a new [`TesseraMap`] with the specified capacity.
#[inline]
#[must_use]
pub fn tessera_map_with_capacity<K, V>(capacity: usize) -> TesseraMap<K, V> {
    TesseraMap::with_capacity_and_hasher(capacity, FxBuildHasher)
}

/// Create a new empty [`TesseraSet`].
#[inline]
#[must_use]
pub fn tessera_set<T>() -> TesseraSet<T> {
    TesseraSet::with_hasher(FxBuildHasher)
}

/// Create a new empty [`TesseraConcurrentMap`].
#[inline]
#[must_use]
pub fn tessera_concurrent_map<K, V>() -> TesseraConcurrentMap<K, V>
where
    K: Eq + std::hash::Hash,
{
    TesseraConcurrentMap::with_hasher(FxBuildHasher)
}

/// Create a new empty [`TesseraIndexMap`].
#[inline]
#[must_use]
pub fn tessera_index_map<K, V>() -> TesseraIndexMap<K, V> {
    TesseraIndexMap::with_hasher(FxBuildHasher)
}

/// Create a new empty [`TesseraIndexSet`].
#[inline]
#[must_use]
pub fn tessera_index_set<T>() -> TesseraIndexSet<T> {
    TesseraIndexSet::with_hasher(FxBuildHasher)
}
