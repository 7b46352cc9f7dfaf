//! Identifier types for graph elements and properties.
//!
//! Vertices and edges draw their ids from one shared sequence, so the raw
//! `u64` behind a [`VertexId`] or [`EdgeId`] is unique across both kinds.
//! [`ElementId`] is that raw, kind-agnostic id as persisted by indices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a vertex in the graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct VertexId(pub u64);

impl VertexId {
    /// Creates a new VertexId from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexId({})", self.0)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VertexId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Unique identifier for an edge in the graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct EdgeId(pub u64);

impl EdgeId {
    /// Creates a new EdgeId from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EdgeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Kind-agnostic identifier of a vertex or edge.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Creates a new ElementId from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<VertexId> for ElementId {
    fn from(id: VertexId) -> Self {
        Self(id.0)
    }
}

impl From<EdgeId> for ElementId {
    fn from(id: EdgeId) -> Self {
        Self(id.0)
    }
}

impl From<u64> for ElementId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Integer identifier of a property, or of the edge-property an edge
/// belongs to (the key under which a vertex groups its edges).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct PropertyId(pub u32);

impl PropertyId {
    /// Creates a new PropertyId from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyId({})", self.0)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PropertyId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id_ordering() {
        let id1 = VertexId::new(1);
        let id2 = VertexId::new(2);
        assert!(id1 < id2);
        assert_eq!(id2.as_u64(), 2);
    }

    #[test]
    fn test_element_id_from_typed_ids() {
        let v: ElementId = VertexId::new(7).into();
        let e: ElementId = EdgeId::new(9).into();
        assert_eq!(v, ElementId::new(7));
        assert_eq!(e.as_u64(), 9);
    }

    #[test]
    fn test_debug_formatting() {
        assert_eq!(format!("{:?}", VertexId::new(3)), "VertexId(3)");
        assert_eq!(format!("{:?}", EdgeId::new(4)), "EdgeId(4)");
        assert_eq!(format!("{:?}", PropertyId::new(5)), "PropertyId(5)");
        assert_eq!(format!("{}", ElementId::new(6)), "6");
    }
}
