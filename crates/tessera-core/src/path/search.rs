//! Layer expansion shared by the shortest-path algorithms.

use std::sync::Arc;

use smallvec::{SmallVec, smallvec};
use tessera_common::types::VertexId;

use super::{Path, PathElement, PathHelper, ShortestPathRequest};
use crate::graph::Vertex;

/// Which end a partial path grows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Side {
    /// From the source, steps in path order.
    Forward,
    /// From the destination, steps recorded as walked from it.
    Backward,
}

/// A simple path grown from one end of the search.
#[derive(Clone)]
pub(super) struct Partial {
    pub(super) vertices: SmallVec<[VertexId; 8]>,
    pub(super) elements: Vec<PathElement>,
    pub(super) weight: f64,
    pub(super) end: Arc<Vertex>,
}

impl Partial {
    pub(super) fn root(vertex: Arc<Vertex>) -> Self {
        Self {
            vertices: smallvec![vertex.id()],
            elements: Vec::new(),
            weight: 0.0,
            end: vertex,
        }
    }

    pub(super) fn end_id(&self) -> VertexId {
        self.end.id()
    }

    pub(super) fn visits(&self, id: VertexId) -> bool {
        self.vertices.contains(&id)
    }
}

/// Smallest weight in a layer, `INFINITY` for an empty one.
pub(super) fn min_weight(layer: &[Partial]) -> f64 {
    layer.iter().map(|p| p.weight).fold(f64::INFINITY, f64::min)
}

/// Grows every partial of `layer` by one step.
///
/// Partials ending at `stop` are not grown. Returns the next layer and
/// whether it was cut at the request's frontier limit.
pub(super) fn expand(
    request: &ShortestPathRequest,
    layer: &[Partial],
    side: Side,
    stop: VertexId,
) -> (Vec<Partial>, bool) {
    let limit = request.frontier_limit();
    let admitted = match side {
        Side::Forward => request.direction(),
        Side::Backward => request.direction().reverse(),
    };
    let admits_vertex = |v: &Vertex| request.admits_vertex(v);
    let vertex_filter: Option<&dyn Fn(&Vertex) -> bool> = if request.has_vertex_filter() {
        Some(&admits_vertex)
    } else {
        None
    };

    let mut next = Vec::new();
    for partial in layer.iter().filter(|p| p.end_id() != stop) {
        let steps = PathHelper::get_all_relevant_path_elements(
            &partial.end,
            request.edge_property_filter(),
            request.edge_filter(),
            vertex_filter,
        );
        for mut element in steps {
            if !admitted.admits(element.direction()) {
                continue;
            }
            let Some(entered) = element.next_vertex() else {
                continue;
            };
            if partial.visits(entered.id()) {
                continue;
            }
            let cost = match side {
                Side::Forward => {
                    request.edge_cost(element.edge(), element.direction()) + request.vertex_cost(&entered)
                }
                Side::Backward => {
                    request.edge_cost(element.edge(), element.direction().reverse())
                        + request.vertex_cost(&partial.end)
                }
            };
            let weight = partial.weight + cost;
            if weight > request.max_path_weight() {
                continue;
            }
            if next.len() == limit {
                tracing::warn!(
                    limit,
                    side = ?side,
                    source = %request.source(),
                    destination = %request.destination(),
                    "path frontier limit reached, layer truncated"
                );
                return (next, true);
            }
            element.set_weight(cost);
            let mut vertices = partial.vertices.clone();
            vertices.push(entered.id());
            let mut elements = partial.elements.clone();
            elements.push(element);
            next.push(Partial {
                vertices,
                elements,
                weight,
                end: entered,
            });
        }
    }
    (next, false)
}

/// Joins a forward partial with a backward partial ending at the same
/// vertex, provided they share no other vertex.
pub(super) fn join(source: VertexId, forward: &Partial, backward: &Partial) -> Option<Path> {
    let (_, before_meeting) = backward.vertices.split_last()?;
    if before_meeting.iter().any(|&v| forward.visits(v)) {
        return None;
    }
    let mut elements = Vec::with_capacity(forward.elements.len() + backward.elements.len());
    elements.extend(forward.elements.iter().cloned());
    elements.extend(backward.elements.iter().rev().map(PathElement::reversed));
    Some(Path::from_elements(source, elements))
}

/// Stable sort by weight, then cut to the result limit.
pub(super) fn finish(mut paths: Vec<Path>, max_results: usize) -> Vec<Path> {
    paths.sort_by(|a, b| a.total_weight().total_cmp(&b.total_weight()));
    paths.truncate(max_results);
    paths
}

/// Whether the `k`-th best result already beats `bound`.
pub(super) fn settled(paths: &mut [Path], k: usize, bound: f64) -> bool {
    if paths.len() < k {
        return false;
    }
    paths.sort_by(|a, b| a.total_weight().total_cmp(&b.total_weight()));
    paths[k - 1].total_weight() <= bound
}

/// Rejects requests that can never produce a path.
pub(super) fn trivially_empty(request: &ShortestPathRequest) -> bool {
    request.max_depth() == 0 || request.max_results() == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_weight() {
        assert_eq!(min_weight(&[]), f64::INFINITY);
    }
}
