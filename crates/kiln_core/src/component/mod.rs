//! # Ownership Tree
//!
//! Pooled components owning other pooled components, keyed by identifier.
//!
//! A child holds only its parent's identifier; the parent holds the child.
//! Removing a node releases its whole subtree back to the pool.

mod helper;
mod node;

pub use helper::ComponentHelper;
pub use node::{Awake, Component, ComponentSlot, Node};
