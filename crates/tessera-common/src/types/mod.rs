//! Core type definitions for Tessera.
//!
//! - Identifier types ([`VertexId`], [`EdgeId`], [`ElementId`], [`PropertyId`])
//! - Property types ([`Value`], [`IndexKey`])
//! - Temporal types ([`Timestamp`])

mod id;
mod index_key;
mod timestamp;
mod value;

pub use id::{EdgeId, ElementId, PropertyId, VertexId};
pub use index_key::{IndexKey, OrderedFloat64};
pub use timestamp::Timestamp;
pub use value::Value;
