use tessera_common::utils::{Error, Result};

use super::{SpatialContainer, check_dimensions};

/// Minimum bounding rectangle: an axis-aligned box given by two corners.
#[derive(Debug, Clone, PartialEq)]
pub struct MbrContainer {
    lower: Vec<f64>,
    upper: Vec<f64>,
    parent: Option<usize>,
}

impl MbrContainer {
    /// Creates a box from its lower and upper corners.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the corners are empty, differ in
    /// length, are not finite, or if `lower` exceeds `upper` in any dimension.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.is_empty() || lower.len() != upper.len() {
            return Err(Error::InvalidArgument(format!(
                "box corners must be non-empty and of equal length, got {} and {}",
                lower.len(),
                upper.len()
            )));
        }
        if lower.iter().chain(&upper).any(|c| !c.is_finite()) {
            return Err(Error::InvalidArgument("box corners must be finite".into()));
        }
        if lower.iter().zip(&upper).any(|(lo, hi)| lo > hi) {
            return Err(Error::InvalidArgument("box lower corner exceeds upper corner".into()));
        }
        Ok(Self {
            lower,
            upper,
            parent: None,
        })
    }

    /// The smallest box covering `container`.
    #[must_use]
    pub fn bounding(container: &dyn SpatialContainer) -> Self {
        Self {
            lower: container.lower().to_vec(),
            upper: container.upper().to_vec(),
            parent: None,
        }
    }

    /// Product of the side lengths.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(lo, hi)| hi - lo)
            .product()
    }

    /// Grows this box to cover `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the dimensionality differs.
    pub fn enlarge(&mut self, other: &dyn SpatialContainer) -> Result<()> {
        check_dimensions(self.dimensions(), other.dimensions())?;
        for d in 0..self.lower.len() {
            self.lower[d] = self.lower[d].min(other.lower()[d]);
            self.upper[d] = self.upper[d].max(other.upper()[d]);
        }
        Ok(())
    }

    /// The smallest box covering both.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the dimensionality differs.
    pub fn union(&self, other: &dyn SpatialContainer) -> Result<Self> {
        let mut grown = self.clone();
        grown.enlarge(other)?;
        Ok(grown)
    }

    /// Area this box would gain by covering `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the dimensionality differs.
    pub fn enlargement(&self, other: &dyn SpatialContainer) -> Result<f64> {
        Ok(self.union(other)?.area() - self.area())
    }
}

impl SpatialContainer for MbrContainer {
    fn dimensions(&self) -> usize {
        self.lower.len()
    }

    fn lower(&self) -> &[f64] {
        &self.lower
    }

    fn upper(&self) -> &[f64] {
        &self.upper
    }

    fn is_point(&self) -> bool {
        false
    }

    fn parent(&self) -> Option<usize> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<usize>) {
        self.parent = parent;
    }
}
