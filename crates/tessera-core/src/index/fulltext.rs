//! Regular-expression search over text keys.
//!
//! [`RegExIndex`] stores string keys in the shared bucket map. A query
//! compiles its pattern once and runs it over every key. For each match the
//! index extracts a highlight, the whitespace-delimited token around the
//! match, and credits it to every element stored under that key. One element
//! reachable through several matching keys gets a single entry holding the
//! union of its highlights and the total number of highlight occurrences.

use regex::{Regex, RegexBuilder};
use tessera_common::collections::{TesseraIndexMap, TesseraIndexSet, tessera_index_map, tessera_index_set};
use tessera_common::types::{IndexKey, Value};
use tessera_common::utils::{Error, Result};

use super::multi_value::MultiValueStore;
use super::{FulltextPredicate, FulltextQuery, Index, IndexParameters};
use crate::graph::{Element, GraphElementSource};
use crate::resource::LockPolicy;
use crate::storage::{SerializationReader, SerializationWriter};

/// One element matched by a fulltext query.
#[derive(Debug, Clone)]
pub struct FulltextSearchEntry {
    /// The matching element.
    pub element: Element,
    /// Distinct highlight strings, in discovery order.
    pub highlights: TesseraIndexSet<String>,
    /// Number of highlight occurrences across all of the element's keys.
    pub score: usize,
}

/// Scored result of [`FulltextQuery::try_query`].
#[derive(Debug, Clone)]
pub struct FulltextSearchResult {
    entries: Vec<FulltextSearchEntry>,
    maximum_score: usize,
}

impl FulltextSearchResult {
    /// Entries in discovery order.
    #[must_use]
    pub fn entries(&self) -> &[FulltextSearchEntry] {
        &self.entries
    }

    /// Highest score of any entry.
    #[must_use]
    pub const fn maximum_score(&self) -> usize {
        self.maximum_score
    }

    /// Number of matching elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: an empty search yields no result at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries by descending score; equal scores keep discovery order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&FulltextSearchEntry> {
        let mut ranked: Vec<_> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    /// Consumes the result, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<FulltextSearchEntry> {
        self.entries
    }
}

/// Fulltext index over string keys.
///
/// Non-string keys are ignored. Patterns are case-insensitive unless the
/// index was initialized with `case_sensitive = true`.
///
/// Parameters:
///
/// - `capacity` (integer): number of keys to reserve room for.
/// - `case_sensitive` (boolean): match case exactly. Defaults to `false`.
///
/// # Example
///
/// ```
/// use tessera_core::graph::{Element, GraphStore};
/// use tessera_core::index::{Index, RegExIndex};
/// use tessera_common::types::Value;
///
/// let store = GraphStore::new();
/// let index = RegExIndex::new();
/// let fox = Element::Vertex(store.create_vertex().unwrap());
/// index.add_or_update(&Value::from("the Quick fox"), fox).unwrap();
///
/// let result = index.as_fulltext().unwrap().try_query("quick").unwrap().unwrap();
/// assert_eq!(result.entries()[0].highlights.first().map(String::as_str), Some("Quick"));
/// ```
pub struct RegExIndex {
    store: MultiValueStore,
    parameters: IndexParameters,
    case_sensitive: bool,
}

impl RegExIndex {
    /// Plugin type name.
    pub const TYPE_NAME: &'static str = "RegExIndex";

    const PARAMETERS: &'static [&'static str] = &["capacity", "case_sensitive"];

    /// Creates an empty, case-insensitive index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: MultiValueStore::new(Self::TYPE_NAME),
            parameters: IndexParameters::new(),
            case_sensitive: false,
        }
    }

    fn compile(&self, pattern: &str) -> Result<Regex> {
        RegexBuilder::new(pattern)
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|e| Error::InvalidArgument(format!("invalid search pattern: {e}")))
    }

    fn text_key(key: &Value) -> Option<IndexKey> {
        match key {
            Value::String(_) => IndexKey::from_value(key),
            _ => None,
        }
    }
}

impl Default for RegExIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte range of the whitespace-delimited token around `start..end` in `text`.
fn highlight_bounds(text: &str, start: usize, end: usize) -> (usize, usize) {
    let left = text[..start]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let right = text[end..]
        .char_indices()
        .find(|(_, c)| c.is_whitespace())
        .map_or(text.len(), |(i, _)| end + i);
    (left, right)
}

impl FulltextQuery for RegExIndex {
    fn try_query(&self, pattern: &str) -> Result<Option<FulltextSearchResult>> {
        let regex = self.compile(pattern)?;
        let buckets = self.store.read()?;
        if buckets.is_empty() {
            return Ok(None);
        }

        let mut hits: TesseraIndexMap<Element, (TesseraIndexSet<String>, usize)> = tessera_index_map();
        for (key, bucket) in buckets.iter() {
            let Some(text) = key.as_str() else {
                continue;
            };
            for m in regex.find_iter(text).filter(|m| !m.is_empty()) {
                let (left, right) = highlight_bounds(text, m.start(), m.end());
                let highlight = &text[left..right];
                for element in bucket {
                    let (highlights, count) = hits
                        .entry(element.clone())
                        .or_insert_with(|| (tessera_index_set(), 0));
                    if !highlights.contains(highlight) {
                        highlights.insert(highlight.to_string());
                    }
                    *count += 1;
                }
            }
        }
        drop(buckets);

        if hits.is_empty() {
            return Ok(None);
        }
        let entries: Vec<FulltextSearchEntry> = hits
            .into_iter()
            .map(|(element, (highlights, score))| FulltextSearchEntry {
                element,
                highlights,
                score,
            })
            .collect();
        let maximum_score = entries.iter().map(|e| e.score).max().unwrap_or(0);
        Ok(Some(FulltextSearchResult {
            entries,
            maximum_score,
        }))
    }

    fn try_query_with(
        &self,
        pattern: &str,
        predicate: FulltextPredicate<'_>,
    ) -> Result<Option<Vec<Element>>> {
        let regex = self.compile(pattern)?;
        let buckets = self.store.read()?;
        let mut found: TesseraIndexSet<Element> = tessera_index_set();
        for (key, bucket) in buckets.iter() {
            if let Some(text) = key.as_str()
                && predicate(&regex, text)
            {
                found.extend(bucket.iter().cloned());
            }
        }
        if found.is_empty() {
            Ok(None)
        } else {
            Ok(Some(found.into_iter().collect()))
        }
    }
}

impl Index for RegExIndex {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn set_lock_policy(&mut self, policy: LockPolicy) {
        self.store.set_policy(policy);
    }

    fn initialize(&mut self, parameters: &IndexParameters) -> Result<()> {
        parameters.expect_only(Self::TYPE_NAME, Self::PARAMETERS)?;
        let capacity = parameters.get_usize("capacity")?.unwrap_or(0);
        self.case_sensitive = parameters.get_bool("case_sensitive")?.unwrap_or(false);
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
        match Self::text_key(key) {
            Some(key) => self.store.add(key, element),
            None => {
                tracing::trace!(index = Self::TYPE_NAME, key_type = key.type_name(), "key ignored");
                Ok(())
            }
        }
    }

    fn try_remove_key(&self, key: &Value) -> Result<bool> {
        match Self::text_key(key) {
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
        match Self::text_key(key) {
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

    fn as_fulltext(&self) -> Option<&dyn FulltextQuery> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;

    fn indexed(texts: &[&str]) -> (GraphStore, RegExIndex, Vec<Element>) {
        let store = GraphStore::new();
        let index = RegExIndex::new();
        let els = texts
            .iter()
            .map(|t| {
                let e = Element::Vertex(store.create_vertex().unwrap());
                index.add_or_update(&Value::from(*t), e.clone()).unwrap();
                e
            })
            .collect();
        (store, index, els)
    }

    #[test]
    fn test_quick_highlight_scoring() {
        let (_store, index, els) = indexed(&["the quick fox", "a quick cat"]);
        let result = index.try_query("quick").unwrap().unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.maximum_score(), 1);
        for entry in result.entries() {
            assert!(els.contains(&entry.element));
            assert_eq!(entry.highlights.len(), 1);
            assert_eq!(entry.highlights.first().map(String::as_str), Some("quick"));
            assert_eq!(entry.score, 1);
        }
    }

    #[test]
    fn test_highlight_is_surrounding_token() {
        let (_store, index, _els) = indexed(&["unquickened pace"]);
        let result = index.try_query("quick").unwrap().unwrap();
        let entry = &result.entries()[0];
        assert!(entry.highlights.contains("unquickened"));
    }

    #[test]
    fn test_highlight_bounds() {
        let text = "alpha beta\tgamma";
        assert_eq!(highlight_bounds(text, 7, 9), (6, 10));
        assert_eq!(highlight_bounds(text, 0, 2), (0, 5));
        assert_eq!(highlight_bounds(text, 12, 14), (11, 16));
        assert_eq!(highlight_bounds("solid", 1, 3), (0, 5));
    }

    #[test]
    fn test_union_across_keys_and_score() {
        let store = GraphStore::new();
        let index = RegExIndex::new();
        let e = Element::Vertex(store.create_vertex().unwrap());
        index.add_or_update(&Value::from("red fox, red hen"), e.clone()).unwrap();
        index.add_or_update(&Value::from("reddish"), e.clone()).unwrap();

        let result = index.try_query("red").unwrap().unwrap();
        assert_eq!(result.len(), 1);
        let entry = &result.entries()[0];
        assert_eq!(entry.score, 3);
        assert_eq!(entry.highlights.len(), 2);
        assert!(entry.highlights.contains("red"));
        assert!(entry.highlights.contains("reddish"));
        assert_eq!(result.maximum_score(), 3);
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let (_store, index, _els) = indexed(&["Tessera Graph"]);
        assert!(index.try_query("GRAPH").unwrap().is_some());

        let mut strict = RegExIndex::new();
        strict
            .initialize(&IndexParameters::new().with("case_sensitive", true))
            .unwrap();
        let store = GraphStore::new();
        strict
            .add_or_update(&Value::from("Tessera Graph"), Element::Vertex(store.create_vertex().unwrap()))
            .unwrap();
        assert!(strict.try_query("GRAPH").unwrap().is_none());
        assert!(strict.try_query("Graph").unwrap().is_some());
    }

    #[test]
    fn test_empty_index_and_no_match() {
        let index = RegExIndex::new();
        assert!(index.try_query("anything").unwrap().is_none());

        let (_store, index, _els) = indexed(&["alpha"]);
        assert!(index.try_query("omega").unwrap().is_none());
    }

    #[test]
    fn test_invalid_pattern() {
        let (_store, index, _els) = indexed(&["alpha"]);
        assert!(matches!(index.try_query("(unclosed"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_ranked() {
        let (_store, index, els) = indexed(&["one fish", "fish fish fish", "two fish fish"]);
        let result = index.try_query("fish").unwrap().unwrap();
        let ranked = result.ranked();
        assert_eq!(ranked[0].element, els[1]);
        assert_eq!(ranked[0].score, 3);
        assert_eq!(ranked[1].element, els[2]);
        assert_eq!(ranked[2].score, 1);
    }

    #[test]
    fn test_query_with_predicate() {
        let (_store, index, els) = indexed(&["alpha one", "beta one", "gamma two"]);
        let starts_with = |re: &Regex, key: &str| re.find(key).is_some_and(|m| m.start() == 0);

        let found = index.try_query_with("alpha|beta", &starts_with).unwrap().unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&els[0]) && found.contains(&els[1]));
        assert!(index.try_query_with("one", &starts_with).unwrap().is_none());
    }

    #[test]
    fn test_non_string_keys_ignored() {
        let store = GraphStore::new();
        let index = RegExIndex::new();
        index
            .add_or_update(&Value::Int64(42), Element::Vertex(store.create_vertex().unwrap()))
            .unwrap();
        assert_eq!(index.count_of_keys().unwrap(), 0);
    }
}
