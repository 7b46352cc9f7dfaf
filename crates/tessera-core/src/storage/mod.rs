//! Persistence primitives.
//!
//! Indices persist themselves through a [`SerializationWriter`] and are
//! rebuilt from a [`SerializationReader`]. Both are plain sequential cursors
//! over a byte buffer; file handling lives in the engine.

mod serializer;

pub use serializer::{SerializationReader, SerializationWriter};
