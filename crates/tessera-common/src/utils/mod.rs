//! Common utilities used throughout Tessera.
//!
//! - [`error`] - The crate-wide [`Error`] and [`Result`]

pub mod error;

pub use error::{AccessMode, Error, Result};
