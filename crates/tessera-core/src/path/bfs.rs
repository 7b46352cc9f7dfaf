//! Single-sided layered search.

use tessera_common::utils::Result;

use super::search::{Partial, Side, expand, finish, min_weight, settled, trivially_empty};
use super::{Path, ShortestPathAlgorithm, ShortestPathRequest};
use crate::graph::GraphStore;

/// Level-synchronous breadth-first search from the source only.
///
/// Takes the same requests as
/// [`BidirectionalLevelSynchronousBfs`](super::BidirectionalLevelSynchronousBfs)
/// and returns the same paths. Cheaper on shallow searches and on graphs
/// where the destination side fans out much more than the source side.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelSynchronousBfs;

impl LevelSynchronousBfs {
    /// Plugin name.
    pub const NAME: &'static str = "LevelSynchronousBfs";
}

impl ShortestPathAlgorithm for LevelSynchronousBfs {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn calculate(&self, store: &GraphStore, request: &ShortestPathRequest) -> Result<Vec<Path>> {
        if trivially_empty(request) {
            return Ok(Vec::new());
        }
        let (Some(source), Some(destination)) = (
            store.get_vertex(request.source())?,
            store.get_vertex(request.destination())?,
        ) else {
            return Ok(Vec::new());
        };
        if source.id() == destination.id() {
            return Ok(vec![Path::new(source.id())]);
        }

        let (source_id, destination_id) = (source.id(), destination.id());
        let k = request.max_results();
        let mut layer = vec![Partial::root(source)];
        let mut found = Vec::new();

        for depth in 1..=request.max_depth() {
            let (next, truncated) = expand(request, &layer, Side::Forward, destination_id);
            let (arrived, frontier): (Vec<Partial>, Vec<Partial>) =
                next.into_iter().partition(|p| p.end_id() == destination_id);
            found.extend(
                arrived
                    .into_iter()
                    .map(|p| Path::from_elements(source_id, p.elements)),
            );
            tracing::trace!(depth, frontier = frontier.len(), found = found.len(), "search step");

            if truncated || frontier.is_empty() || settled(&mut found, k, min_weight(&frontier)) {
                break;
            }
            layer = frontier;
        }

        Ok(finish(found, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_common::types::PropertyId;

    #[test]
    fn test_prefers_lighter_detour() {
        // 0 -> 3 directly with weight 10, or 0 -> 1 -> 2 -> 3 with weight 1 each.
        let store = GraphStore::new();
        let ids: Vec<_> = (0..4).map(|_| store.create_vertex().unwrap().id()).collect();
        let p = PropertyId::new(1);
        store.create_edge(ids[0], ids[3], p).unwrap().set_weight(Some(10.0));
        for pair in ids.windows(2) {
            store.create_edge(pair[0], pair[1], p).unwrap();
        }

        let request = ShortestPathRequest::new(ids[0], ids[3]);
        let paths = LevelSynchronousBfs.calculate(&store, &request).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].total_weight(), 3.0);
        assert_eq!(paths[0].vertex_ids(), ids);
    }

    #[test]
    fn test_zero_limits() {
        let store = GraphStore::new();
        let a = store.create_vertex().unwrap().id();
        let b = store.create_vertex().unwrap().id();
        store.create_edge(a, b, PropertyId::new(1)).unwrap();

        let no_depth = ShortestPathRequest::new(a, b).with_max_depth(0);
        assert!(LevelSynchronousBfs.calculate(&store, &no_depth).unwrap().is_empty());
        let no_results = ShortestPathRequest::new(a, b).with_max_results(0);
        assert!(LevelSynchronousBfs.calculate(&store, &no_results).unwrap().is_empty());
    }
}
