//! Edge enumeration for traversals.

use tessera_common::types::PropertyId;

use super::PathElement;
use crate::graph::{Direction, Edge, Vertex};

/// Accepts or rejects a whole edge-property group.
pub type EdgePropertyFilter<'a> = &'a dyn Fn(PropertyId) -> bool;

/// Accepts or rejects a single edge.
pub type EdgeFilter<'a> = &'a dyn Fn(&Edge) -> bool;

/// Accepts or rejects the vertex a step would enter.
pub type VertexFilter<'a> = &'a dyn Fn(&Vertex) -> bool;

/// The single enumeration point for steps leaving a vertex.
pub struct PathHelper;

impl PathHelper {
    /// Every step that can be taken from `vertex`.
    ///
    /// Outgoing edges come first, then incoming ones, each side ordered by
    /// edge-property id. A group is skipped when `edge_property_filter`
    /// rejects its id, an edge when `edge_filter` rejects it, and a step
    /// when `vertex_filter` rejects the vertex it enters. A missing filter
    /// accepts everything. Steps come out with zero weight.
    ///
    /// The sequence is lazy and holds no state beyond the iterator itself;
    /// calling again enumerates afresh.
    pub fn get_all_relevant_path_elements<'a>(
        vertex: &'a Vertex,
        edge_property_filter: Option<EdgePropertyFilter<'a>>,
        edge_filter: Option<EdgeFilter<'a>>,
        vertex_filter: Option<VertexFilter<'a>>,
    ) -> impl Iterator<Item = PathElement> + 'a {
        [Direction::Outgoing, Direction::Incoming]
            .into_iter()
            .flat_map(move |direction| {
                let lists = match direction {
                    Direction::Incoming => vertex.incoming_edges(),
                    _ => vertex.outgoing_edges(),
                };
                lists
                    .into_iter()
                    .filter(move |(property, _)| edge_property_filter.is_none_or(|accept| accept(*property)))
                    .flat_map(|(_, list)| (0..list.len()).map(move |i| list[i].clone()))
                    .filter_map(move |edge| {
                        if edge_filter.is_some_and(|accept| !accept(&edge)) {
                            return None;
                        }
                        let entered = edge.reached_by(direction)?;
                        if vertex_filter.is_some_and(|accept| !accept(&entered)) {
                            return None;
                        }
                        Some(PathElement::new(edge, direction))
                    })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;
    use tessera_common::types::VertexId;

    const KNOWS: PropertyId = PropertyId::new(1);
    const LIKES: PropertyId = PropertyId::new(2);

    /// hub -KNOWS-> a, hub -LIKES-> b, c -KNOWS-> hub
    fn star() -> (GraphStore, Vec<VertexId>) {
        let store = GraphStore::new();
        let ids: Vec<_> = (0..4).map(|_| store.create_vertex().unwrap().id()).collect();
        store.create_edge(ids[0], ids[1], KNOWS).unwrap();
        store.create_edge(ids[0], ids[2], LIKES).unwrap();
        store.create_edge(ids[3], ids[0], KNOWS).unwrap();
        (store, ids)
    }

    #[test]
    fn test_outgoing_before_incoming() {
        let (store, ids) = star();
        let hub = store.get_vertex(ids[0]).unwrap().unwrap();
        let steps: Vec<_> = PathHelper::get_all_relevant_path_elements(&hub, None, None, None)
            .map(|e| (e.direction(), e.to_vertex_id()))
            .collect();
        assert_eq!(
            steps,
            vec![
                (Direction::Outgoing, ids[1]),
                (Direction::Outgoing, ids[2]),
                (Direction::Incoming, ids[3]),
            ]
        );
    }

    #[test]
    fn test_filters() {
        let (store, ids) = star();
        let hub = store.get_vertex(ids[0]).unwrap().unwrap();

        let only_knows = |p: PropertyId| p == KNOWS;
        let count = PathHelper::get_all_relevant_path_elements(&hub, Some(&only_knows), None, None).count();
        assert_eq!(count, 2);

        let outgoing_only = |e: &Edge| e.source_id() == ids[0];
        let count = PathHelper::get_all_relevant_path_elements(&hub, None, Some(&outgoing_only), None).count();
        assert_eq!(count, 2);

        let not_b = |v: &Vertex| v.id() != ids[2];
        let reached: Vec<_> = PathHelper::get_all_relevant_path_elements(&hub, None, None, Some(&not_b))
            .map(|e| e.to_vertex_id())
            .collect();
        assert_eq!(reached, vec![ids[1], ids[3]]);
    }

    #[test]
    fn test_restartable() {
        let (store, ids) = star();
        let hub = store.get_vertex(ids[0]).unwrap().unwrap();
        let first = PathHelper::get_all_relevant_path_elements(&hub, None, None, None).count();
        store.create_edge(ids[0], ids[3], LIKES).unwrap();
        let second = PathHelper::get_all_relevant_path_elements(&hub, None, None, None).count();
        assert_eq!((first, second), (3, 4));
    }
}
