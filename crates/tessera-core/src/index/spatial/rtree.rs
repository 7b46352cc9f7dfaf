//! Gated R-tree over spatial containers.
//!
//! Nodes live in an arena (`Vec<Node>` plus a free list) and refer to each
//! other by index. A node's parent is an index too, and so is the parent
//! slot of each stored shape, which names the leaf holding it.
//!
//! Insertion descends by least enlargement and splits overflowing nodes
//! with the linear seed-picking split. Removal tightens the covering boxes
//! on the way up and reinserts the entries of nodes that fell below the
//! minimum fill.

use tessera_common::collections::{TesseraIndexSet, tessera_index_set};
use tessera_common::utils::{Error, Result};

use super::{MbrContainer, SpatialContainer, SpatialShape, check_dimensions};
use crate::graph::Element;
use crate::resource::{LockPolicy, ThreadSafeResource};

#[derive(Debug, Clone)]
struct Entry {
    shape: SpatialShape,
    element: Element,
}

#[derive(Debug)]
enum NodeKind {
    Leaf(Vec<Entry>),
    Inner(Vec<usize>),
}

#[derive(Debug)]
struct Node {
    parent: Option<usize>,
    bounds: Option<MbrContainer>,
    kind: NodeKind,
}

impl Node {
    fn leaf(parent: Option<usize>) -> Self {
        Self {
            parent,
            bounds: None,
            kind: NodeKind::Leaf(Vec::new()),
        }
    }

    fn len(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(entries) => entries.len(),
            NodeKind::Inner(children) => children.len(),
        }
    }
}

#[derive(Debug)]
struct RTree {
    dimensions: usize,
    max_entries: usize,
    min_entries: usize,
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: usize,
    len: usize,
}

impl RTree {
    fn new(dimensions: usize, max_entries: usize) -> Self {
        Self {
            dimensions,
            max_entries,
            min_entries: max_entries / 2,
            nodes: vec![Node::leaf(None)],
            free: Vec::new(),
            root: 0,
            len: 0,
        }
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, slot: usize) {
        self.nodes[slot] = Node::leaf(None);
        self.free.push(slot);
    }

    fn wipe(&mut self) {
        self.nodes = vec![Node::leaf(None)];
        self.free.clear();
        self.root = 0;
        self.len = 0;
    }

    /// Recomputes a node's covering box from its direct children.
    fn refresh_bounds(&mut self, slot: usize) {
        let bounds = match &self.nodes[slot].kind {
            NodeKind::Leaf(entries) => cover(entries.iter().map(|e| &e.shape as &dyn SpatialContainer)),
            NodeKind::Inner(children) => cover(
                children
                    .iter()
                    .filter_map(|&c| self.nodes[c].bounds.as_ref())
                    .map(|b| b as &dyn SpatialContainer),
            ),
        };
        self.nodes[slot].bounds = bounds;
    }

    fn choose_leaf(&self, shape: &dyn SpatialContainer) -> Result<usize> {
        let mut slot = self.root;
        while let NodeKind::Inner(children) = &self.nodes[slot].kind {
            let mut best: Option<(usize, f64, f64)> = None;
            for &child in children {
                let Some(bounds) = &self.nodes[child].bounds else {
                    continue;
                };
                let growth = bounds.enlargement(shape)?;
                let area = bounds.area();
                let better = match best {
                    None => true,
                    Some((_, g, a)) => growth < g || (growth == g && area < a),
                };
                if better {
                    best = Some((child, growth, area));
                }
            }
            slot = best
                .map(|(child, _, _)| child)
                .ok_or_else(|| Error::Internal("inner R-tree node without children".into()))?;
        }
        Ok(slot)
    }

    fn insert(&mut self, mut shape: SpatialShape, element: Element) -> Result<()> {
        check_dimensions(self.dimensions, shape.dimensions())?;
        let leaf = self.choose_leaf(&shape)?;
        shape.set_parent(Some(leaf));
        if let NodeKind::Leaf(entries) = &mut self.nodes[leaf].kind {
            entries.push(Entry { shape, element });
        }
        self.len += 1;
        self.adjust_tree(leaf)
    }

    /// Walks from `slot` to the root, splitting overflowing nodes and
    /// tightening covering boxes.
    fn adjust_tree(&mut self, mut slot: usize) -> Result<()> {
        loop {
            let sibling = if self.nodes[slot].len() > self.max_entries {
                Some(self.split(slot)?)
            } else {
                self.refresh_bounds(slot);
                None
            };

            match (self.nodes[slot].parent, sibling) {
                (None, Some(sibling)) => {
                    let root = self.alloc(Node {
                        parent: None,
                        bounds: None,
                        kind: NodeKind::Inner(vec![slot, sibling]),
                    });
                    self.nodes[slot].parent = Some(root);
                    self.nodes[sibling].parent = Some(root);
                    self.refresh_bounds(root);
                    self.root = root;
                    return Ok(());
                }
                (None, None) => return Ok(()),
                (Some(parent), sibling) => {
                    if let Some(sibling) = sibling {
                        self.nodes[sibling].parent = Some(parent);
                        if let NodeKind::Inner(children) = &mut self.nodes[parent].kind {
                            children.push(sibling);
                        }
                    }
                    slot = parent;
                }
            }
        }
    }

    /// Splits an overflowing node in two, returning the new sibling.
    fn split(&mut self, slot: usize) -> Result<usize> {
        let kind = std::mem::replace(&mut self.nodes[slot].kind, NodeKind::Leaf(Vec::new()));
        let sibling = self.alloc(Node::leaf(self.nodes[slot].parent));

        match kind {
            NodeKind::Leaf(entries) => {
                let boxes: Vec<MbrContainer> = entries
                    .iter()
                    .map(|e| MbrContainer::bounding(&e.shape))
                    .collect();
                let (keep, moved) = linear_split(&boxes, self.min_entries)?;
                let (mut kept, mut gone) = (Vec::with_capacity(keep.len()), Vec::with_capacity(moved.len()));
                for (i, mut entry) in entries.into_iter().enumerate() {
                    if moved.contains(&i) {
                        entry.shape.set_parent(Some(sibling));
                        gone.push(entry);
                    } else {
                        kept.push(entry);
                    }
                }
                self.nodes[slot].kind = NodeKind::Leaf(kept);
                self.nodes[sibling].kind = NodeKind::Leaf(gone);
            }
            NodeKind::Inner(children) => {
                let boxes = children
                    .iter()
                    .map(|&c| {
                        self.nodes[c]
                            .bounds
                            .clone()
                            .ok_or_else(|| Error::Internal("R-tree child without bounds".into()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let (_, moved) = linear_split(&boxes, self.min_entries)?;
                let (mut kept, mut gone) = (Vec::new(), Vec::new());
                for (i, child) in children.into_iter().enumerate() {
                    if moved.contains(&i) {
                        self.nodes[child].parent = Some(sibling);
                        gone.push(child);
                    } else {
                        kept.push(child);
                    }
                }
                self.nodes[slot].kind = NodeKind::Inner(kept);
                self.nodes[sibling].kind = NodeKind::Inner(gone);
            }
        }
        self.refresh_bounds(slot);
        self.refresh_bounds(sibling);
        Ok(sibling)
    }

    /// Finds the leaf holding `element` under an equal shape.
    fn find_leaf(&self, slot: usize, shape: &dyn SpatialContainer, element: &Element) -> Result<Option<(usize, usize)>> {
        let node = &self.nodes[slot];
        match &node.bounds {
            Some(bounds) if bounds.inclusion(shape)? => {}
            _ => return Ok(None),
        }
        match &node.kind {
            NodeKind::Leaf(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    if entry.element == *element && entry.shape.equal_to(shape)? {
                        return Ok(Some((slot, i)));
                    }
                }
                Ok(None)
            }
            NodeKind::Inner(children) => {
                for &child in children {
                    if let Some(found) = self.find_leaf(child, shape, element)? {
                        return Ok(Some(found));
                    }
                }
                Ok(None)
            }
        }
    }

    fn remove(&mut self, shape: &dyn SpatialContainer, element: &Element) -> Result<bool> {
        check_dimensions(self.dimensions, shape.dimensions())?;
        let Some((leaf, position)) = self.find_leaf(self.root, shape, element)? else {
            return Ok(false);
        };
        if let NodeKind::Leaf(entries) = &mut self.nodes[leaf].kind {
            entries.remove(position);
        }
        self.len -= 1;

        let orphans = self.condense(leaf);
        self.len -= orphans.len();
        for entry in orphans {
            self.insert(entry.shape, entry.element)?;
        }
        Ok(true)
    }

    /// Removes underfull nodes on the path from `slot` to the root and
    /// returns the entries they held.
    fn condense(&mut self, mut slot: usize) -> Vec<Entry> {
        let mut orphans = Vec::new();
        while let Some(parent) = self.nodes[slot].parent {
            if self.nodes[slot].len() < self.min_entries {
                if let NodeKind::Inner(children) = &mut self.nodes[parent].kind {
                    children.retain(|&c| c != slot);
                }
                self.drain_subtree(slot, &mut orphans);
            } else {
                self.refresh_bounds(slot);
            }
            slot = parent;
        }
        self.refresh_bounds(self.root);

        let root = self.root;
        match &self.nodes[root].kind {
            NodeKind::Inner(children) if children.len() == 1 => {
                let child = children[0];
                self.nodes[child].parent = None;
                self.root = child;
                self.release(root);
            }
            NodeKind::Inner(children) if children.is_empty() => {
                self.nodes[root] = Node::leaf(None);
            }
            _ => {}
        }
        orphans
    }

    fn drain_subtree(&mut self, slot: usize, out: &mut Vec<Entry>) {
        let kind = std::mem::replace(&mut self.nodes[slot].kind, NodeKind::Leaf(Vec::new()));
        match kind {
            NodeKind::Leaf(entries) => out.extend(entries),
            NodeKind::Inner(children) => {
                for child in children {
                    self.drain_subtree(child, out);
                }
            }
        }
        self.release(slot);
    }

    /// Collects elements of entries passing `keep`, descending into nodes
    /// whose box intersects `query`.
    fn search(
        &self,
        query: &dyn SpatialContainer,
        keep: &dyn Fn(&SpatialShape) -> Result<bool>,
    ) -> Result<Vec<Element>> {
        check_dimensions(self.dimensions, query.dimensions())?;
        let mut found: TesseraIndexSet<Element> = tessera_index_set();
        let mut stack = vec![self.root];
        while let Some(slot) = stack.pop() {
            let node = &self.nodes[slot];
            match &node.bounds {
                Some(bounds) if bounds.intersection(query)? => {}
                _ => continue,
            }
            match &node.kind {
                NodeKind::Leaf(entries) => {
                    for entry in entries {
                        if keep(&entry.shape)? {
                            found.insert(entry.element.clone());
                        }
                    }
                }
                NodeKind::Inner(children) => stack.extend(children.iter().rev()),
            }
        }
        Ok(found.into_iter().collect())
    }

    fn height(&self) -> usize {
        let mut height = 1;
        let mut slot = self.root;
        while let NodeKind::Inner(children) = &self.nodes[slot].kind {
            match children.first() {
                Some(&child) => slot = child,
                None => break,
            }
            height += 1;
        }
        height
    }
}

/// Smallest box covering every container, or `None` for none.
fn cover<'a>(mut items: impl Iterator<Item = &'a dyn SpatialContainer>) -> Option<MbrContainer> {
    let mut bounds = MbrContainer::bounding(items.next()?);
    for item in items {
        // Children share the tree's dimensionality.
        let _ = bounds.enlarge(item);
    }
    Some(bounds)
}

/// Linear split: picks the two boxes farthest apart along the axis of
/// greatest normalized separation as seeds, then assigns the rest by least
/// enlargement. Returns the positions kept and the positions moved.
fn linear_split(boxes: &[MbrContainer], min_entries: usize) -> Result<(Vec<usize>, Vec<usize>)> {
    let (seed_a, seed_b) = pick_seeds(boxes);
    let mut groups = [vec![seed_a], vec![seed_b]];
    let mut covers = [boxes[seed_a].clone(), boxes[seed_b].clone()];

    let remaining: Vec<usize> = (0..boxes.len()).filter(|&i| i != seed_a && i != seed_b).collect();
    for (done, &i) in remaining.iter().enumerate() {
        let left = remaining.len() - done;
        let target = if groups[0].len() + left <= min_entries {
            0
        } else if groups[1].len() + left <= min_entries {
            1
        } else {
            let grow_a = covers[0].enlargement(&boxes[i])?;
            let grow_b = covers[1].enlargement(&boxes[i])?;
            if grow_a != grow_b {
                usize::from(grow_b < grow_a)
            } else if covers[0].area() != covers[1].area() {
                usize::from(covers[1].area() < covers[0].area())
            } else {
                usize::from(groups[1].len() < groups[0].len())
            }
        };
        covers[target].enlarge(&boxes[i])?;
        groups[target].push(i);
    }

    let [keep, moved] = groups;
    Ok((keep, moved))
}

fn pick_seeds(boxes: &[MbrContainer]) -> (usize, usize) {
    let dimensions = boxes[0].dimensions();
    let mut best = (0, 1, f64::NEG_INFINITY);
    for d in 0..dimensions {
        let (mut highest_low, mut lowest_high) = (0, 0);
        let (mut min_low, mut max_high) = (f64::INFINITY, f64::NEG_INFINITY);
        for (i, b) in boxes.iter().enumerate() {
            if b.lower()[d] > boxes[highest_low].lower()[d] {
                highest_low = i;
            }
            if b.upper()[d] < boxes[lowest_high].upper()[d] {
                lowest_high = i;
            }
            min_low = min_low.min(b.lower()[d]);
            max_high = max_high.max(b.upper()[d]);
        }
        if highest_low == lowest_high {
            continue;
        }
        let width = max_high - min_low;
        let separation = boxes[highest_low].lower()[d] - boxes[lowest_high].upper()[d];
        let normalized = if width > 0.0 { separation / width } else { 0.0 };
        if normalized > best.2 {
            best = (lowest_high, highest_low, normalized);
        }
    }
    (best.0, best.1)
}

/// Thread-safe R-tree mapping points and boxes to graph elements.
///
/// The dimensionality is fixed at construction; any shape or query of
/// another dimensionality is rejected with [`Error::DimensionMismatch`].
///
/// # Example
///
/// ```
/// use tessera_core::graph::{Element, GraphStore};
/// use tessera_core::index::spatial::{MbrContainer, PointContainer, SpatialIndex};
///
/// let store = GraphStore::new();
/// let cafe = Element::Vertex(store.create_vertex().unwrap());
///
/// let index = SpatialIndex::new(2).unwrap();
/// index.insert(PointContainer::new(vec![4.0, 2.0]).unwrap(), cafe.clone()).unwrap();
///
/// let area = MbrContainer::new(vec![0.0, 0.0], vec![5.0, 5.0]).unwrap();
/// assert_eq!(index.search_contained(&area).unwrap(), vec![cafe]);
/// ```
pub struct SpatialIndex {
    tree: ThreadSafeResource<RTree>,
}

impl SpatialIndex {
    /// Default node capacity.
    pub const DEFAULT_MAX_ENTRIES: usize = 8;

    /// Creates an empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for zero dimensions.
    pub fn new(dimensions: usize) -> Result<Self> {
        Self::with_max_entries(dimensions, Self::DEFAULT_MAX_ENTRIES)
    }

    /// Creates an empty tree whose nodes hold up to `max_entries` children.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for zero dimensions or a capacity below 4.
    pub fn with_max_entries(dimensions: usize, max_entries: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::InvalidArgument("spatial index needs at least one dimension".into()));
        }
        if max_entries < 4 {
            return Err(Error::InvalidArgument(format!(
                "R-tree node capacity must be at least 4, got {max_entries}"
            )));
        }
        Ok(Self {
            tree: ThreadSafeResource::new("SpatialIndex", RTree::new(dimensions, max_entries)),
        })
    }

    /// Replaces the retry budget of the tree's gate.
    pub fn set_lock_policy(&mut self, policy: LockPolicy) {
        self.tree.set_policy(policy);
    }

    /// Dimensionality of every stored shape.
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    pub fn dimensions(&self) -> Result<usize> {
        Ok(self.tree.begin_read()?.dimensions)
    }

    /// Stores `element` under `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] or a collision.
    pub fn insert(&self, shape: impl Into<SpatialShape>, element: Element) -> Result<()> {
        self.tree.begin_write()?.insert(shape.into(), element)
    }

    /// Removes the entry for `element` stored under a shape equal to
    /// `shape`. Returns whether one was found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] or a collision.
    pub fn remove(&self, shape: &dyn SpatialContainer, element: &Element) -> Result<bool> {
        self.tree.begin_write()?.remove(shape, element)
    }

    /// Elements whose shape intersects `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] or a collision.
    pub fn search_intersecting(&self, query: &dyn SpatialContainer) -> Result<Vec<Element>> {
        let tree = self.tree.begin_read()?;
        tree.search(query, &|shape| shape.intersection(query))
    }

    /// Elements whose shape lies entirely inside `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] or a collision.
    pub fn search_contained(&self, query: &dyn SpatialContainer) -> Result<Vec<Element>> {
        let tree = self.tree.begin_read()?;
        tree.search(query, &|shape| query.inclusion(shape))
    }

    /// Number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    pub fn len(&self) -> Result<usize> {
        Ok(self.tree.begin_read()?.len)
    }

    /// Returns `true` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Levels from root to leaves.
    ///
    /// # Errors
    ///
    /// Returns a collision if the read gate is unavailable.
    pub fn height(&self) -> Result<usize> {
        Ok(self.tree.begin_read()?.height())
    }

    /// Removes everything.
    ///
    /// # Errors
    ///
    /// Returns a collision if the write gate is unavailable.
    pub fn wipe(&self) -> Result<()> {
        self.tree.begin_write()?.wipe();
        Ok(())
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex").field("tree", &self.tree).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;
    use crate::index::spatial::PointContainer;

    fn point(x: f64, y: f64) -> PointContainer {
        PointContainer::new(vec![x, y]).unwrap()
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MbrContainer {
        MbrContainer::new(vec![x0, y0], vec![x1, y1]).unwrap()
    }

    /// A 10x10 grid of points, one vertex each.
    fn grid(index: &SpatialIndex, store: &GraphStore) -> Vec<(PointContainer, Element)> {
        let mut placed = Vec::new();
        for x in 0..10 {
            for y in 0..10 {
                let p = point(f64::from(x), f64::from(y));
                let e = Element::Vertex(store.create_vertex().unwrap());
                index.insert(p.clone(), e.clone()).unwrap();
                placed.push((p, e));
            }
        }
        placed
    }

    /// Every non-root node respects the fill bounds and every parent link
    /// points back to the node listing it.
    fn check_structure(tree: &RTree) {
        let mut stack = vec![tree.root];
        let mut entries = 0;
        while let Some(slot) = stack.pop() {
            let node = &tree.nodes[slot];
            if slot != tree.root {
                assert!(node.len() >= tree.min_entries, "underfull node {slot}");
            }
            assert!(node.len() <= tree.max_entries, "overfull node {slot}");
            match &node.kind {
                NodeKind::Leaf(list) => {
                    for entry in list {
                        assert_eq!(entry.shape.parent(), Some(slot));
                        assert!(node.bounds.as_ref().unwrap().inclusion(&entry.shape).unwrap());
                    }
                    entries += list.len();
                }
                NodeKind::Inner(children) => {
                    for &child in children {
                        assert_eq!(tree.nodes[child].parent, Some(slot));
                        let child_bounds = tree.nodes[child].bounds.as_ref().unwrap();
                        assert!(node.bounds.as_ref().unwrap().inclusion(child_bounds).unwrap());
                        stack.push(child);
                    }
                }
            }
        }
        assert_eq!(entries, tree.len);
    }

    #[test]
    fn test_grid_insert_and_search() {
        let store = GraphStore::new();
        let index = SpatialIndex::new(2).unwrap();
        let placed = grid(&index, &store);

        assert_eq!(index.len().unwrap(), 100);
        assert!(index.height().unwrap() > 1);
        check_structure(&index.tree.begin_read().unwrap());

        let hits = index.search_contained(&rect(2.0, 2.0, 4.0, 3.0)).unwrap();
        assert_eq!(hits.len(), 6);
        for (p, e) in &placed {
            let inside = (2.0..=4.0).contains(&p.coordinates()[0]) && (2.0..=3.0).contains(&p.coordinates()[1]);
            assert_eq!(hits.contains(e), inside);
        }
    }

    #[test]
    fn test_intersecting_versus_contained() {
        let store = GraphStore::new();
        let index = SpatialIndex::new(2).unwrap();
        let big = Element::Vertex(store.create_vertex().unwrap());
        let small = Element::Vertex(store.create_vertex().unwrap());
        index.insert(rect(0.0, 0.0, 10.0, 10.0), big.clone()).unwrap();
        index.insert(rect(1.0, 1.0, 2.0, 2.0), small.clone()).unwrap();

        let query = rect(0.5, 0.5, 3.0, 3.0);
        let intersecting = index.search_intersecting(&query).unwrap();
        assert!(intersecting.contains(&big) && intersecting.contains(&small));
        assert_eq!(index.search_contained(&query).unwrap(), vec![small]);
        assert!(index.search_intersecting(&rect(20.0, 20.0, 21.0, 21.0)).unwrap().is_empty());
    }

    #[test]
    fn test_remove_condenses() {
        let store = GraphStore::new();
        let index = SpatialIndex::new(2).unwrap();
        let placed = grid(&index, &store);

        for (p, e) in placed.iter().take(95) {
            assert!(index.remove(p, e).unwrap());
        }
        assert_eq!(index.len().unwrap(), 5);
        check_structure(&index.tree.begin_read().unwrap());

        let all = index.search_intersecting(&rect(-1.0, -1.0, 11.0, 11.0)).unwrap();
        assert_eq!(all.len(), 5);
        for (_, e) in placed.iter().skip(95) {
            assert!(all.contains(e));
        }

        let (p, e) = &placed[0];
        assert!(!index.remove(p, e).unwrap());
    }

    #[test]
    fn test_remove_requires_matching_shape() {
        let store = GraphStore::new();
        let index = SpatialIndex::new(2).unwrap();
        let e = Element::Vertex(store.create_vertex().unwrap());
        index.insert(point(1.0, 1.0), e.clone()).unwrap();

        assert!(!index.remove(&point(1.0, 2.0), &e).unwrap());
        assert!(index.remove(&point(1.0, 1.0), &e).unwrap());
        assert!(index.is_empty().unwrap());
    }

    #[test]
    fn test_dimension_checks() {
        let store = GraphStore::new();
        let index = SpatialIndex::new(2).unwrap();
        let e = Element::Vertex(store.create_vertex().unwrap());
        let cube = PointContainer::new(vec![1.0, 2.0, 3.0]).unwrap();

        assert!(matches!(
            index.insert(cube.clone(), e.clone()),
            Err(Error::DimensionMismatch { expected: 2, found: 3 })
        ));
        assert!(index.search_intersecting(&cube).is_err());
        assert!(SpatialIndex::new(0).is_err());
        assert!(SpatialIndex::with_max_entries(2, 2).is_err());
    }

    #[test]
    fn test_wipe() {
        let store = GraphStore::new();
        let index = SpatialIndex::new(2).unwrap();
        grid(&index, &store);
        index.wipe().unwrap();
        assert!(index.is_empty().unwrap());
        assert_eq!(index.height().unwrap(), 1);
    }
}
