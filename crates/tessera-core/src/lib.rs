//! # tessera-core
//!
//! The moving parts of the Tessera graph engine.
//!
//! ## Modules
//!
//! - [`resource`] - [`ThreadSafeResource`], the reader/writer gate with a bounded retry budget
//! - [`graph`] - Vertices, edges, their properties and the [`GraphStore`](graph::GraphStore)
//! - [`index`] - The [`Index`](index::Index) trait, its implementations, the factory and spatial containers
//! - [`path`] - Paths, edge enumeration and the shortest-path algorithms
//! - [`plugin`] - Name-to-constructor registries for indices and path algorithms
//! - [`storage`] - Sequential binary reader/writer used by index persistence
//!
//! Every shared, stateful component sits behind a [`ThreadSafeResource`].
//! Acquiring it either succeeds within the configured [`LockPolicy`] or
//! returns [`Error::Collision`](tessera_common::utils::Error::Collision).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod graph;
pub mod index;
pub mod path;
pub mod plugin;
pub mod resource;
pub mod storage;

pub use resource::{LockPolicy, ThreadSafeResource};
