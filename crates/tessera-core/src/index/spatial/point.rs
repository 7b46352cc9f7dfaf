use tessera_common::types::Value;
use tessera_common::utils::{Error, Result};

use super::SpatialContainer;

/// A location in `n`-dimensional space.
#[derive(Debug, Clone, PartialEq)]
pub struct PointContainer {
    coordinates: Vec<f64>,
    parent: Option<usize>,
}

impl PointContainer {
    /// Creates a point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty or non-finite coordinate list.
    pub fn new(coordinates: Vec<f64>) -> Result<Self> {
        if coordinates.is_empty() {
            return Err(Error::InvalidArgument("a point needs at least one coordinate".into()));
        }
        if coordinates.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidArgument("point coordinates must be finite".into()));
        }
        Ok(Self {
            coordinates,
            parent: None,
        })
    }

    /// Reads a point from a list-of-numbers value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `value` is not such a list.
    pub fn from_value(value: &Value) -> Result<Self> {
        let coordinates = value.as_coordinates().ok_or_else(|| {
            Error::InvalidArgument(format!("expected a coordinate list, got {}", value.type_name()))
        })?;
        Self::new(coordinates)
    }

    /// The coordinates.
    #[must_use]
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }
}

impl SpatialContainer for PointContainer {
    fn dimensions(&self) -> usize {
        self.coordinates.len()
    }

    fn lower(&self) -> &[f64] {
        &self.coordinates
    }

    fn upper(&self) -> &[f64] {
        &self.coordinates
    }

    fn is_point(&self) -> bool {
        true
    }

    fn parent(&self) -> Option<usize> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<usize>) {
        self.parent = parent;
    }
}
