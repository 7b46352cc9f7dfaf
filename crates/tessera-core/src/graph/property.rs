//! Per-element property maps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tessera_common::types::{PropertyId, Value};

/// Property-id to value mapping owned by one vertex or edge.
///
/// Iteration is ordered by property id. Schemaless elements simply have an
/// empty map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap {
    entries: BTreeMap<PropertyId, Value>,
}

impl PropertyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a property.
    #[must_use]
    pub fn get(&self, id: PropertyId) -> Option<&Value> {
        self.entries.get(&id)
    }

    /// Sets a property, returning the previous value.
    pub fn insert(&mut self, id: PropertyId, value: Value) -> Option<Value> {
        self.entries.insert(id, value)
    }

    /// Removes a property, returning its value.
    pub fn remove(&mut self, id: PropertyId) -> Option<Value> {
        self.entries.remove(&id)
    }

    /// Returns `true` if the property is set.
    #[must_use]
    pub fn contains(&self, id: PropertyId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of properties set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates properties in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &Value)> {
        self.entries.iter().map(|(id, v)| (*id, v))
    }
}

impl FromIterator<(PropertyId, Value)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (PropertyId, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replace_remove() {
        let mut props = PropertyMap::new();
        assert!(props.is_empty());

        assert_eq!(props.insert(PropertyId::new(2), Value::from(1i64)), None);
        assert_eq!(
            props.insert(PropertyId::new(2), Value::from(5i64)),
            Some(Value::Int64(1))
        );
        props.insert(PropertyId::new(1), Value::from("a"));

        let ids: Vec<_> = props.iter().map(|(id, _)| id.as_u32()).collect();
        assert_eq!(ids, vec![1, 2]);

        assert_eq!(props.remove(PropertyId::new(2)), Some(Value::Int64(5)));
        assert!(!props.contains(PropertyId::new(2)));
        assert_eq!(props.len(), 1);
    }
}
