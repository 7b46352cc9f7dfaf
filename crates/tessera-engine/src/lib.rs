//! # tessera-engine
//!
//! The public entry point to Tessera.
//!
//! [`TesseraDB`] owns a [`GraphStore`](tessera_core::graph::GraphStore), an
//! [`IndexFactory`](tessera_core::index::IndexFactory) and the registries of
//! index and path plugins. Everything is in memory; [`TesseraDB::save`] and
//! [`TesseraDB::open`] move a binary snapshot to and from a file.
//!
//! ```
//! use tessera_common::types::{PropertyId, Value};
//! use tessera_engine::TesseraDB;
//!
//! let db = TesseraDB::new_in_memory();
//! let name = PropertyId::new(0);
//! let alix = db.create_vertex_with_props([(name, Value::from("Alix"))])?;
//!
//! let names = db.create_index("names", "DictionaryIndex")?;
//! names.add_or_update(&Value::from("Alix"), alix.into())?;
//! assert_eq!(names.count_of_keys()?, 1);
//! # Ok::<(), tessera_common::utils::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod database;

pub use config::{Config, ConfigError};
pub use database::TesseraDB;
