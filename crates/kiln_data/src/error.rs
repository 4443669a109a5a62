//! # Data Error Types
//!
//! All errors that can occur in the record store and the module lifecycle.

use kiln_core::{CoreError, Id};
use thiserror::Error;

/// Errors that can occur in the record store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A scheme or table was set up inconsistently.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A record was handed to an agent or table that does not own its set.
    #[error("record belongs to set {actual}, not to set {expected}")]
    IdentityMismatch {
        /// Set being operated on.
        expected: Id,
        /// Set stamped on the record.
        actual: Id,
    },

    /// A live record with the same primary key is already attached.
    #[error("{scheme} record {key} already exists")]
    DuplicateRecord {
        /// Scheme tag of the table.
        scheme: &'static str,
        /// Debug rendering of the primary key.
        key: String,
    },

    /// A record reported that it could not be filled from external data.
    #[error("{scheme} record {key} failed to parse")]
    ParseFailed {
        /// Scheme tag of the table.
        scheme: &'static str,
        /// Debug rendering of the primary key.
        key: String,
    },

    /// The record is not attached to its table.
    #[error("{scheme} record {key} is not attached")]
    NotFound {
        /// Scheme tag of the table.
        scheme: &'static str,
        /// Debug rendering of the primary key.
        key: String,
    },

    /// Pool failure while acquiring or releasing records.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for record store operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors that can occur while installing, initializing or removing modules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// A lifecycle phase failed; the module has been torn down.
    #[error("module {name} - {id} failed to initialize: {source}")]
    Init {
        /// Name the module was installed under.
        name: String,
        /// Identifier of the module.
        id: Id,
        /// The fault raised by the phase.
        #[source]
        source: Box<ModuleError>,
    },

    /// A module with this identifier or name is already installed.
    #[error("module {name} - {id} already exists")]
    AlreadyExists {
        /// Requested name.
        name: String,
        /// Requested identifier.
        id: Id,
    },

    /// No module matches the identifier or name.
    #[error("module not found: {0}")]
    NotFound(String),

    /// The requested parent link would break the hierarchy.
    #[error("invalid module hierarchy: {0}")]
    Structural(String),

    /// Raised by a module's own lifecycle hook.
    #[error("{0}")]
    Failed(String),

    /// Tearing a module down did not complete cleanly.
    #[error("module teardown failed: {0}")]
    Teardown(String),

    /// Record store failure inside a hook.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Pool failure.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for module operations.
pub type ModuleResult<T> = Result<T, ModuleError>;
