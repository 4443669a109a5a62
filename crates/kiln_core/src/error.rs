//! # Core Error Types
//!
//! All errors that can occur in the pool and the ownership tree.

use thiserror::Error;

use crate::id::Id;

/// Errors that can occur in the core runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A reference or argument was unusable (empty, wrong shape).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An object was released into a collection registered for another type.
    #[error("type mismatch: collection for {expected} cannot accept {actual}")]
    TypeMismatch {
        /// Type the collection was registered for.
        expected: &'static str,
        /// Type of the object that was handed in.
        actual: &'static str,
    },

    /// Strict check caught an object that is already sitting in the free list.
    #[error("double release of {type_name}: object is already in the free list")]
    DoubleRelease {
        /// Type of the released object.
        type_name: &'static str,
    },

    /// A node tried to become its own parent.
    #[error("{type_name} {id} cannot be its own parent")]
    SelfParent {
        /// Type of the offending node.
        type_name: &'static str,
        /// Identifier of the offending node.
        id: Id,
    },

    /// A node already has a parent and must be detached first.
    #[error("{type_name} {id} cannot attach to parent {attempted}: already attached to {existing}")]
    AlreadyParented {
        /// Type of the offending node.
        type_name: &'static str,
        /// Identifier of the offending node.
        id: Id,
        /// Parent the caller tried to set.
        attempted: Id,
        /// Parent currently set.
        existing: Id,
    },

    /// A node tried to attach under one of its own descendants.
    #[error("{type_name} {id} cannot attach under its own descendant {parent}")]
    Cycle {
        /// Type of the offending node.
        type_name: &'static str,
        /// Identifier of the offending node.
        id: Id,
        /// Descendant the caller tried to use as parent.
        parent: Id,
    },

    /// A parent already owns a child with the same identifier.
    #[error("parent {parent} already owns a child with id {id}")]
    DuplicateChild {
        /// Identifier of the parent.
        parent: Id,
        /// Identifier of the colliding child.
        id: Id,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
