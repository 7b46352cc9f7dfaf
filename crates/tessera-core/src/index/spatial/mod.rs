//! Spatial containers and the R-tree built from them.
//!
//! A container is either a point or a minimum bounding rectangle (MBR) in
//! `n` dimensions. Containers of either kind compare against each other
//! through the four predicates of [`SpatialContainer`]. Comparing
//! containers of different dimensionality is an error, never a silent
//! answer.
//!
//! Every container carries an optional parent slot. Inside a
//! [`SpatialIndex`] it holds the arena index of the tree node that owns the
//! container, which keeps the back-reference non-owning.

mod mbr;
mod point;
mod rtree;

use tessera_common::utils::{Error, Result};

pub use mbr::MbrContainer;
pub use point::PointContainer;
pub use rtree::SpatialIndex;

/// Geometry shared by points and bounding rectangles.
pub trait SpatialContainer: Send + Sync {
    /// Number of dimensions.
    fn dimensions(&self) -> usize;

    /// Lower corner. For a point this is its coordinates.
    fn lower(&self) -> &[f64];

    /// Upper corner. For a point this is its coordinates.
    fn upper(&self) -> &[f64];

    /// Returns `true` for a point container.
    fn is_point(&self) -> bool;

    /// Arena index of the owning tree node.
    fn parent(&self) -> Option<usize>;

    /// Sets the owning tree node.
    fn set_parent(&mut self, parent: Option<usize>);

    /// Does this container fully contain `other`?
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the dimensionality differs.
    fn inclusion(&self, other: &dyn SpatialContainer) -> Result<bool> {
        check_dimensions(self.dimensions(), other.dimensions())?;
        Ok((0..self.dimensions())
            .all(|d| self.lower()[d] <= other.lower()[d] && other.upper()[d] <= self.upper()[d]))
    }

    /// Do the two containers share at least one point?
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the dimensionality differs.
    fn intersection(&self, other: &dyn SpatialContainer) -> Result<bool> {
        check_dimensions(self.dimensions(), other.dimensions())?;
        Ok((0..self.dimensions())
            .all(|d| self.lower()[d] <= other.upper()[d] && other.lower()[d] <= self.upper()[d]))
    }

    /// Do the containers touch without their interiors overlapping?
    ///
    /// When either side is a point this is [`SpatialContainer::equal_to`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the dimensionality differs.
    fn adjacency(&self, other: &dyn SpatialContainer) -> Result<bool> {
        if self.is_point() || other.is_point() {
            return self.equal_to(other);
        }
        Ok(self.intersection(other)? && !internal_intersection(self, other))
    }

    /// Are both corners identical?
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the dimensionality differs.
    fn equal_to(&self, other: &dyn SpatialContainer) -> Result<bool> {
        check_dimensions(self.dimensions(), other.dimensions())?;
        Ok(self.lower() == other.lower() && self.upper() == other.upper())
    }
}

/// Interiors overlap: every dimension has a gap-free, non-degenerate overlap.
fn internal_intersection<A: SpatialContainer + ?Sized>(a: &A, b: &dyn SpatialContainer) -> bool {
    (0..a.dimensions()).all(|d| a.lower()[d] < b.upper()[d] && b.lower()[d] < a.upper()[d])
}

pub(crate) fn check_dimensions(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, found })
    }
}

/// A container of either kind, as stored in the R-tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialShape {
    /// A single location.
    Point(PointContainer),
    /// An axis-aligned box.
    Mbr(MbrContainer),
}

impl SpatialShape {
    fn inner(&self) -> &dyn SpatialContainer {
        match self {
            Self::Point(p) => p,
            Self::Mbr(m) => m,
        }
    }
}

impl SpatialContainer for SpatialShape {
    fn dimensions(&self) -> usize {
        self.inner().dimensions()
    }

    fn lower(&self) -> &[f64] {
        match self {
            Self::Point(p) => p.lower(),
            Self::Mbr(m) => m.lower(),
        }
    }

    fn upper(&self) -> &[f64] {
        match self {
            Self::Point(p) => p.upper(),
            Self::Mbr(m) => m.upper(),
        }
    }

    fn is_point(&self) -> bool {
        matches!(self, Self::Point(_))
    }

    fn parent(&self) -> Option<usize> {
        self.inner().parent()
    }

    fn set_parent(&mut self, parent: Option<usize>) {
        match self {
            Self::Point(p) => p.set_parent(parent),
            Self::Mbr(m) => m.set_parent(parent),
        }
    }
}

impl From<PointContainer> for SpatialShape {
    fn from(p: PointContainer) -> Self {
        Self::Point(p)
    }
}

impl From<MbrContainer> for SpatialShape {
    fn from(m: MbrContainer) -> Self {
        Self::Mbr(m)
    }
}
