//! Meet-in-the-middle shortest paths.
//!
//! Layer `i` on a side holds the simple partial paths of exactly `i` edges
//! grown from that side's endpoint. Step `d` grows the forward side on odd
//! `d` and the backward side on even `d`, then joins forward layer
//! `ceil(d/2)` with backward layer `floor(d/2)`. A path of `d` edges splits
//! into exactly those halves at exactly one vertex, so every path within
//! the depth limit is produced once, at step `d`.

use tessera_common::collections::{TesseraMap, tessera_map};
use tessera_common::types::VertexId;
use tessera_common::utils::Result;

use super::search::{Partial, Side, expand, finish, join, min_weight, settled, trivially_empty};
use super::{Path, ShortestPathAlgorithm, ShortestPathRequest};
use crate::graph::GraphStore;

/// Bidirectional level-synchronous breadth-first search.
///
/// Explores roughly `b^(d/2)` partial paths per side where a single-sided
/// search would explore `b^d`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BidirectionalLevelSynchronousBfs;

impl BidirectionalLevelSynchronousBfs {
    /// Plugin name.
    pub const NAME: &'static str = "BidirectionalLevelSynchronousBfs";
}

/// Joins two layers on their shared end vertices.
fn join_layers(
    source: VertexId,
    forward: &[Partial],
    backward: &[Partial],
    max_path_weight: f64,
    found: &mut Vec<Path>,
) {
    let mut by_end: TesseraMap<VertexId, Vec<usize>> = tessera_map();
    for (i, partial) in backward.iter().enumerate() {
        by_end.entry(partial.end_id()).or_default().push(i);
    }

    for f in forward {
        let Some(candidates) = by_end.get(&f.end_id()) else {
            continue;
        };
        for &b in candidates {
            let b = &backward[b];
            if f.weight + b.weight > max_path_weight {
                continue;
            }
            if let Some(path) = join(source, f, b) {
                found.push(path);
            }
        }
    }
}

impl ShortestPathAlgorithm for BidirectionalLevelSynchronousBfs {
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

        let k = request.max_results();
        let (source_id, destination_id) = (source.id(), destination.id());
        let mut forward = vec![Partial::root(source)];
        let mut backward = vec![Partial::root(destination)];
        let mut found = Vec::new();

        for depth in 1..=request.max_depth() {
            let truncated = if depth % 2 == 1 {
                let (next, truncated) = expand(request, &forward, Side::Forward, destination_id);
                forward = next;
                truncated
            } else {
                let (next, truncated) = expand(request, &backward, Side::Backward, source_id);
                backward = next;
                truncated
            };
            if forward.is_empty() || backward.is_empty() {
                break;
            }

            join_layers(source_id, &forward, &backward, request.max_path_weight(), &mut found);
            tracing::trace!(depth, forward = forward.len(), backward = backward.len(), found = found.len(), "search step");

            if truncated || settled(&mut found, k, min_weight(&forward) + min_weight(&backward)) {
                break;
            }
        }

        Ok(finish(found, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Direction;
    use tessera_common::types::PropertyId;

    const ROAD: PropertyId = PropertyId::new(1);

    fn chain(n: usize) -> (GraphStore, Vec<VertexId>) {
        let store = GraphStore::new();
        let ids: Vec<_> = (0..n).map(|_| store.create_vertex().unwrap().id()).collect();
        for pair in ids.windows(2) {
            store.create_edge(pair[0], pair[1], ROAD).unwrap();
        }
        (store, ids)
    }

    #[test]
    fn test_chain_lengths() {
        for n in 2..=7 {
            let (store, ids) = chain(n);
            let request = ShortestPathRequest::new(ids[0], ids[n - 1]);
            let paths = BidirectionalLevelSynchronousBfs.calculate(&store, &request).unwrap();
            assert_eq!(paths.len(), 1, "chain of {n}");
            assert_eq!(paths[0].len(), n - 1);
            assert_eq!(paths[0].vertex_ids(), ids);
            assert_eq!(paths[0].total_weight(), (n - 1) as f64);
        }
    }

    #[test]
    fn test_depth_limit() {
        let (store, ids) = chain(5);
        let short = ShortestPathRequest::new(ids[0], ids[4]).with_max_depth(3);
        assert!(BidirectionalLevelSynchronousBfs.calculate(&store, &short).unwrap().is_empty());
        let exact = ShortestPathRequest::new(ids[0], ids[4]).with_max_depth(4);
        assert_eq!(BidirectionalLevelSynchronousBfs.calculate(&store, &exact).unwrap().len(), 1);
    }

    #[test]
    fn test_direction_restriction() {
        let (store, ids) = chain(3);
        let against = ShortestPathRequest::new(ids[2], ids[0]).with_direction(Direction::Outgoing);
        assert!(BidirectionalLevelSynchronousBfs.calculate(&store, &against).unwrap().is_empty());

        let with = ShortestPathRequest::new(ids[2], ids[0]).with_direction(Direction::Incoming);
        let paths = BidirectionalLevelSynchronousBfs.calculate(&store, &with).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].elements().iter().all(|e| e.direction() == Direction::Incoming));
    }

    #[test]
    fn test_every_path_found_once() {
        // Complete graph on 4 vertices: from 0 to 3 there are 1 + 2 + 2 simple paths.
        let store = GraphStore::new();
        let ids: Vec<_> = (0..4).map(|_| store.create_vertex().unwrap().id()).collect();
        for i in 0..4 {
            for j in (i + 1)..4 {
                store.create_edge(ids[i], ids[j], ROAD).unwrap();
            }
        }
        let request = ShortestPathRequest::new(ids[0], ids[3]).with_max_results(10);
        let paths = BidirectionalLevelSynchronousBfs.calculate(&store, &request).unwrap();
        assert_eq!(paths.len(), 5);

        let mut routes: Vec<_> = paths.iter().map(Path::vertex_ids).collect();
        routes.sort();
        routes.dedup();
        assert_eq!(routes.len(), 5);
        assert_eq!(paths[0].len(), 1);
    }
}
