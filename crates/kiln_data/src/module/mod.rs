//! # Modules
//!
//! Hierarchical units that each own one record set. Installing a module
//! binds a [`ModelSetAgent`](crate::record::ModelSetAgent) to it and runs its
//! load pipeline; uninstalling tears its subtree down leaves first.

mod lifecycle;
mod repository;

pub use lifecycle::{Module, ModuleState};
pub use repository::ModuleRepository;
