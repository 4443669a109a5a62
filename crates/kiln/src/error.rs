//! # Runtime Error Types

use kiln_core::CoreError;
use kiln_data::{ModuleError, RecordError};
use thiserror::Error;

/// Errors surfaced by the runtime facade.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The runtime configuration could not be read or parsed.
    #[error("invalid runtime configuration: {0}")]
    Config(String),

    /// Pool or identity failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Record store failure.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Module lifecycle failure.
    #[error(transparent)]
    Module(#[from] ModuleError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
