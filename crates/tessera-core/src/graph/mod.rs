//! The labeled property graph that indices and path searches operate over.
//!
//! A [`Vertex`] owns its adjacency: per edge-property id, an immutable slice
//! of outgoing and incoming [`Edge`]s that is replaced wholesale on change.
//! Edges only hold weak references back to their endpoints, so the
//! [`GraphStore`] vertex map is the single owner of every vertex.
//!
//! | Type | Role |
//! |------|------|
//! | [`Vertex`], [`Edge`] | Graph elements |
//! | [`Element`] | Either kind, as stored in an index bucket |
//! | [`PropertyMap`] | Property-id to value mapping of one element |
//! | [`GraphStore`] | Gated vertex/edge maps and id allocation |

mod edge;
mod element;
mod property;
mod store;
mod vertex;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tessera_common::types::{ElementId, PropertyId, Timestamp, Value};
use tessera_common::utils::Result;

pub use edge::Edge;
pub use element::{ElementHeader, ElementSnapshot};
pub use property::PropertyMap;
pub use store::GraphStore;
pub use vertex::{EdgeList, Vertex};

/// Which way an edge is followed relative to the vertex at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From the edge's source to its target.
    Outgoing,
    /// From the edge's target back to its source.
    Incoming,
    /// Either way.
    Both,
}

impl Direction {
    /// Returns the opposite direction; `Both` stays `Both`.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Outgoing => Self::Incoming,
            Self::Incoming => Self::Outgoing,
            Self::Both => Self::Both,
        }
    }

    /// Whether a step taken in `step` is allowed under this restriction.
    #[must_use]
    pub const fn admits(self, step: Direction) -> bool {
        matches!(
            (self, step),
            (Self::Both, _) | (Self::Outgoing, Self::Outgoing) | (Self::Incoming, Self::Incoming)
        )
    }
}

/// Behaviour shared by vertices and edges.
pub trait GraphElement {
    /// The element's header.
    fn header(&self) -> &ElementHeader;

    /// Kind-agnostic identifier.
    fn element_id(&self) -> ElementId {
        self.header().id()
    }

    /// Creation time.
    fn created(&self) -> Timestamp {
        self.header().created()
    }

    /// Time of the last property change.
    fn modified(&self) -> Timestamp {
        self.header().modified()
    }

    /// Reads one property.
    fn property(&self, id: PropertyId) -> Option<Value> {
        self.header().property(id)
    }

    /// Detached copy of every property.
    fn properties(&self) -> PropertyMap {
        self.header().properties()
    }
}

/// A vertex or an edge.
///
/// Equality and hashing use the element id only, so two handles to the same
/// element always compare equal.
#[derive(Clone)]
pub enum Element {
    /// A vertex.
    Vertex(Arc<Vertex>),
    /// An edge.
    Edge(Arc<Edge>),
}

impl Element {
    /// Kind-agnostic identifier.
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.header().id()
    }

    /// Returns the vertex, if this is one.
    #[must_use]
    pub fn as_vertex(&self) -> Option<&Arc<Vertex>> {
        match self {
            Self::Vertex(v) => Some(v),
            Self::Edge(_) => None,
        }
    }

    /// Returns the edge, if this is one.
    #[must_use]
    pub fn as_edge(&self) -> Option<&Arc<Edge>> {
        match self {
            Self::Edge(e) => Some(e),
            Self::Vertex(_) => None,
        }
    }

    /// Returns `true` for vertices.
    #[must_use]
    pub const fn is_vertex(&self) -> bool {
        matches!(self, Self::Vertex(_))
    }
}

impl GraphElement for Element {
    fn header(&self) -> &ElementHeader {
        match self {
            Self::Vertex(v) => v.header(),
            Self::Edge(e) => e.header(),
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex(v) => write!(f, "Vertex({})", v.id()),
            Self::Edge(e) => write!(f, "Edge({})", e.id()),
        }
    }
}

impl From<Arc<Vertex>> for Element {
    fn from(v: Arc<Vertex>) -> Self {
        Self::Vertex(v)
    }
}

impl From<Arc<Edge>> for Element {
    fn from(e: Arc<Edge>) -> Self {
        Self::Edge(e)
    }
}

/// Resolves persisted element ids back to live elements.
pub trait GraphElementSource: Send + Sync {
    /// Looks up a vertex or edge by id.
    ///
    /// # Errors
    ///
    /// Returns a collision if the underlying store cannot be read.
    fn try_get_element(&self, id: ElementId) -> Result<Option<Element>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_admits() {
        assert!(Direction::Both.admits(Direction::Incoming));
        assert!(Direction::Outgoing.admits(Direction::Outgoing));
        assert!(!Direction::Outgoing.admits(Direction::Incoming));
        assert_eq!(Direction::Incoming.reverse(), Direction::Outgoing);
        assert_eq!(Direction::Both.reverse(), Direction::Both);
    }

    #[test]
    fn test_element_identity() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap();
        let b = store.create_vertex().unwrap();
        let e = store.create_edge(a.id(), b.id(), PropertyId::new(0)).unwrap();

        let va = Element::from(Arc::clone(&a));
        assert_eq!(va, Element::Vertex(a));
        assert_ne!(va, Element::Vertex(b));
        assert!(Element::from(e).as_edge().is_some());
        assert!(va.is_vertex());
    }
}
