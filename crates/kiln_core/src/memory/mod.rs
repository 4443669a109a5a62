//! # Memory Management
//!
//! Recyclable objects and the pool that owns them between uses.
//!
//! ## Lifecycle
//!
//! Every pooled object cycles through acquire → use → release → clear for
//! the rest of the process. Holding a [`Pooled`] clone after release is
//! allowed; [`Handle`] is how such holders find out the slot moved on.

mod handle;
mod pool;
mod pooled;

pub use handle::Handle;
pub use pool::{PoolInfo, ReferencePool};
pub use pooled::{AnyPooled, Poolable, Pooled};
