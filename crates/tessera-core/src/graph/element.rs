//! State shared by every graph element.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tessera_common::types::{ElementId, PropertyId, Timestamp, Value};

use super::PropertyMap;

struct MutableState {
    properties: PropertyMap,
    modified: Timestamp,
}

/// Id, timestamps and properties of a vertex or edge.
///
/// The id and creation time never change. Properties and the modification
/// time are only changed under the header's exclusive lock.
pub struct ElementHeader {
    id: ElementId,
    created: Timestamp,
    state: RwLock<MutableState>,
}

impl ElementHeader {
    pub(crate) fn restore(
        id: ElementId,
        created: Timestamp,
        modified: Timestamp,
        properties: PropertyMap,
    ) -> Self {
        Self {
            id,
            created,
            state: RwLock::new(MutableState {
                properties,
                modified,
            }),
        }
    }

    /// Kind-agnostic identifier.
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Creation time.
    #[must_use]
    pub const fn created(&self) -> Timestamp {
        self.created
    }

    /// Time of the last property change, or the creation time.
    #[must_use]
    pub fn modified(&self) -> Timestamp {
        self.state.read().modified
    }

    /// Reads one property.
    #[must_use]
    pub fn property(&self, id: PropertyId) -> Option<Value> {
        self.state.read().properties.get(id).cloned()
    }

    /// Detached copy of all properties.
    #[must_use]
    pub fn properties(&self) -> PropertyMap {
        self.state.read().properties.clone()
    }

    /// Sets a property and bumps the modification time.
    pub fn set_property(&self, id: PropertyId, value: Value) -> Option<Value> {
        let mut state = self.state.write();
        state.modified = Timestamp::now().max(self.created);
        state.properties.insert(id, value)
    }

    /// Removes a property, bumping the modification time if it was set.
    pub fn remove_property(&self, id: PropertyId) -> Option<Value> {
        let mut state = self.state.write();
        let old = state.properties.remove(id);
        if old.is_some() {
            state.modified = Timestamp::now().max(self.created);
        }
        old
    }

    /// Captures the mutable parts for persistence.
    #[must_use]
    pub fn snapshot(&self) -> ElementSnapshot {
        let state = self.state.read();
        ElementSnapshot {
            created: self.created,
            modified: state.modified,
            properties: state.properties.clone(),
        }
    }
}

/// Persisted form of an [`ElementHeader`] without its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Creation time.
    pub created: Timestamp,
    /// Last modification time.
    pub modified: Timestamp,
    /// Property values.
    pub properties: PropertyMap,
}

impl ElementSnapshot {
    /// A freshly created element with the given properties.
    #[must_use]
    pub fn now(properties: PropertyMap) -> Self {
        let now = Timestamp::now();
        Self {
            created: now,
            modified: now,
            properties,
        }
    }
}
