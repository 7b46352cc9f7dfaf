//! # tessera-common
//!
//! Foundation types for Tessera: identifiers, dynamic property values, the
//! orderable index key, the shared error type and collection aliases.
//!
//! This crate has no dependency on the rest of the workspace.
//!
//! ## Modules
//!
//! - [`types`] - Identifiers, [`Value`](types::Value), [`IndexKey`](types::IndexKey), [`Timestamp`](types::Timestamp)
//! - [`utils`] - [`Error`](utils::Error) and [`Result`](utils::Result)
//! - [`collections`] - Hash map/set aliases with FxHash

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collections;
pub mod types;
pub mod utils;
