//! Error types shared by every Tessera crate.
//!
//! Lookups that simply miss are not errors: they come back as `Option`.
//! The variants here are the conditions a caller has to handle, the most
//! important being [`Error::Collision`], which is raised whenever a reader or
//! writer gate cannot be entered within its retry budget.

use std::fmt;

use thiserror::Error;

/// Which side of a reader/writer gate an operation asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Shared read access.
    Read,
    /// Exclusive write access.
    Write,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// The error type for Tessera operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A gated resource could not be entered within its retry budget.
    #[error("collision on {resource}: {access} access not granted after {attempts} attempts")]
    Collision {
        /// Name of the resource that refused access.
        resource: String,
        /// The access that was requested.
        access: AccessMode,
        /// How many acquisition attempts were made.
        attempts: u32,
    },

    /// An argument or parameter was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two spatial containers of different dimensionality were combined.
    #[error("dimension mismatch: expected {expected} dimensions, found {found}")]
    DimensionMismatch {
        /// Dimensionality of the receiving container or tree.
        expected: usize,
        /// Dimensionality of the argument.
        found: usize,
    },

    /// No plugin is registered under the requested type name.
    #[error("unknown plugin type: {0}")]
    UnknownPlugin(String),

    /// An index with this name is already registered.
    #[error("index already exists: {0}")]
    IndexExists(String),

    /// Persisted bytes could not be read or written.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An invariant was violated inside the engine.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns `true` if this is a gate collision.
    #[must_use]
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::Collision { .. })
    }
}

/// Result alias used throughout Tessera.
pub type Result<T> = std::result::Result<T, Error>;
