//! Indices from property values to graph elements.
//!
//! Pick the index for your access pattern:
//!
//! | Index | Best for | Complexity |
//! | ----- | -------- | ---------- |
//! | [`DictionaryIndex`] | Exact-match lookups, the default | O(1) average |
//! | [`SingleValueIndex`] | Unique properties such as primary keys | O(1) average |
//! | [`RangeIndex`] | `lower_than` / `greater_than` / `between` | O(keys) scan |
//! | [`RegExIndex`] | Pattern search over text with highlights | O(keys) scan |
//! | [`SpatialIndex`] | Points and boxes, R-tree | O(log n) typical |
//!
//! The first four implement [`Index`] and are created by name through the
//! [`IndexFactory`]. Every index guards its map with a
//! [`ThreadSafeResource`](crate::resource::ThreadSafeResource): queries take
//! the read side, mutations the write side, and a gate that cannot be
//! entered surfaces as a collision error.
//!
//! Keys are [`Value`]s. Values without an ordering (null, bytes, lists) are
//! silently ignored by `add_or_update` and never match a lookup.

mod dictionary;
mod factory;
mod fulltext;
mod multi_value;
mod range;
mod single_value;
pub mod spatial;

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tessera_common::types::{IndexKey, Value};
use tessera_common::utils::{Error, Result};

use crate::graph::{Element, GraphElementSource};
use crate::plugin::PluginRegistry;
use crate::resource::LockPolicy;
use crate::storage::{SerializationReader, SerializationWriter};

pub use dictionary::DictionaryIndex;
pub use factory::IndexFactory;
pub use fulltext::{FulltextSearchEntry, FulltextSearchResult, RegExIndex};
pub use range::RangeIndex;
pub use single_value::SingleValueIndex;
pub use spatial::SpatialIndex;

/// Named settings passed to [`Index::initialize`].
///
/// Each index type documents the keys it understands; any other key makes
/// `initialize` fail. The parameters are also the first block of an index's
/// persisted form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexParameters {
    entries: BTreeMap<String, Value>,
}

impl IndexParameters {
    /// No parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Sets a parameter in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Reads a raw parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns `true` if no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fails if any key is not in `allowed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] naming the first unknown key.
    pub fn expect_only(&self, index_type: &str, allowed: &[&str]) -> Result<()> {
        match self.entries.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(unknown) => Err(Error::InvalidArgument(format!(
                "{index_type} does not accept parameter '{unknown}'"
            ))),
            None => Ok(()),
        }
    }

    /// Reads a non-negative integer parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the value is not a non-negative integer.
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Int64(n)) if *n >= 0 => usize::try_from(*n)
                .map(Some)
                .map_err(|_| Error::InvalidArgument(format!("parameter '{key}' out of range"))),
            Some(other) => Err(Error::InvalidArgument(format!(
                "parameter '{key}' must be a non-negative integer, got {other}"
            ))),
        }
    }

    /// Reads a boolean parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the value is not a boolean.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(Error::InvalidArgument(format!(
                "parameter '{key}' must be a boolean, got {other}"
            ))),
        }
    }
}

/// The contract every named index fulfils.
///
/// Lookups that miss return `Ok(None)`. `Err` is reserved for collisions
/// on the index's gate and for persistence failures.
pub trait Index: Send + Sync {
    /// Plugin type name this index is registered under.
    fn type_name(&self) -> &'static str;

    /// Replaces the retry budget of the index's gate.
    fn set_lock_policy(&mut self, policy: LockPolicy);

    /// Applies parameters before first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for unknown keys or bad values.
    fn initialize(&mut self, parameters: &IndexParameters) -> Result<()>;

    /// The parameters currently in effect.
    fn parameters(&self) -> IndexParameters;

    /// Number of distinct keys.
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    fn count_of_keys(&self) -> Result<usize>;

    /// Total number of key-to-element mappings.
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    fn count_of_values(&self) -> Result<usize>;

    /// Maps `key` to `element`. Keys without an ordering are ignored.
    ///
    /// # Errors
    ///
    /// Returns a collision if the write gate is unavailable.
    fn add_or_update(&self, key: &Value, element: Element) -> Result<()>;

    /// Drops a whole key. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns a collision if the write gate is unavailable.
    fn try_remove_key(&self, key: &Value) -> Result<bool>;

    /// Removes `element` under every key, dropping keys left empty.
    ///
    /// # Errors
    ///
    /// Returns a collision if the write gate is unavailable.
    fn remove_value(&self, element: &Element) -> Result<()>;

    /// Removes everything.
    ///
    /// # Errors
    ///
    /// Returns a collision if the write gate is unavailable.
    fn wipe(&self) -> Result<()>;

    /// Detached list of keys.
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    fn keys(&self) -> Result<Vec<IndexKey>>;

    /// Detached list of keys with their elements.
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    fn key_values(&self) -> Result<Vec<(IndexKey, Vec<Element>)>>;

    /// Exact lookup.
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    fn try_get_value(&self, key: &Value) -> Result<Option<Vec<Element>>>;

    /// Writes `[parameters][key count][per key: key, element count, element ids]`.
    ///
    /// # Errors
    ///
    /// Returns a collision or a serialization error.
    fn serialize(&self, writer: &mut SerializationWriter) -> Result<()>;

    /// Replaces the content with what [`Index::serialize`] wrote.
    ///
    /// Element ids that `source` cannot resolve are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns a serialization error on malformed input, or a collision
    /// from `source`.
    fn deserialize(
        &mut self,
        reader: &mut SerializationReader<'_>,
        source: &dyn GraphElementSource,
    ) -> Result<()>;

    /// The ordered-query surface, for indices that have one.
    fn as_range(&self) -> Option<&dyn RangeQuery> {
        None
    }

    /// The pattern-search surface, for indices that have one.
    fn as_fulltext(&self) -> Option<&dyn FulltextQuery> {
        None
    }
}

/// Ordered predicates over comparable keys.
///
/// Each query returns `Ok(None)` when nothing matches, including when the
/// bound itself has no ordering.
pub trait RangeQuery: Send + Sync {
    /// Elements whose key is below `key` (or equal, with `include_key`).
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    fn lower_than(&self, key: &Value, include_key: bool) -> Result<Option<Vec<Element>>>;

    /// Elements whose key is above `key` (or equal, with `include_key`).
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    fn greater_than(&self, key: &Value, include_key: bool) -> Result<Option<Vec<Element>>>;

    /// Elements whose key lies between the limits.
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    fn between(
        &self,
        lower: &Value,
        upper: &Value,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<Option<Vec<Element>>>;
}

/// Caller-supplied match test for [`FulltextQuery::try_query_with`].
pub type FulltextPredicate<'a> = &'a (dyn Fn(&Regex, &str) -> bool + Sync);

/// Pattern search over text keys.
pub trait FulltextQuery: Send + Sync {
    /// Scores and highlights every element whose key matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an invalid pattern, or a collision.
    fn try_query(&self, pattern: &str) -> Result<Option<FulltextSearchResult>>;

    /// Returns the distinct elements whose key satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an invalid pattern, or a collision.
    fn try_query_with(
        &self,
        pattern: &str,
        predicate: FulltextPredicate<'_>,
    ) -> Result<Option<Vec<Element>>>;
}

/// A registry preloaded with every built-in index type.
#[must_use]
pub fn default_index_plugins() -> PluginRegistry<dyn Index> {
    let registry: PluginRegistry<dyn Index> = PluginRegistry::new();
    registry.register(DictionaryIndex::TYPE_NAME, || Box::new(DictionaryIndex::new()));
    registry.register(RangeIndex::TYPE_NAME, || Box::new(RangeIndex::new()));
    registry.register(RegExIndex::TYPE_NAME, || Box::new(RegExIndex::new()));
    registry.register(SingleValueIndex::TYPE_NAME, || Box::new(SingleValueIndex::new()));
    registry
}

/// Writes one key and its element ids in the shared index layout.
pub(crate) fn write_bucket<'a>(
    writer: &mut SerializationWriter,
    key: &IndexKey,
    elements: impl ExactSizeIterator<Item = &'a Element>,
) -> Result<()> {
    writer.write_object(key)?;
    writer.write_count(elements.len())?;
    for element in elements {
        writer.write_u64(element.id().as_u64());
    }
    Ok(())
}

/// Reads one key and resolves its element ids, skipping dangling ones.
pub(crate) fn read_bucket(
    reader: &mut SerializationReader<'_>,
    source: &dyn GraphElementSource,
    index_type: &str,
) -> Result<(IndexKey, Vec<Element>)> {
    let key: IndexKey = reader.read_object()?;
    let count = reader.read_count()?;
    let mut elements = Vec::with_capacity(count.min(reader.remaining() / 8));
    for _ in 0..count {
        let id = reader.read_u64()?.into();
        match source.try_get_element(id)? {
            Some(element) => elements.push(element),
            None => tracing::error!(
                index = index_type,
                element = %id,
                key = %key,
                "persisted element id does not resolve, entry dropped"
            ),
        }
    }
    Ok((key, elements))
}
