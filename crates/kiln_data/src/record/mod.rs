//! # Record Store
//!
//! Pooled rows with New/Clean/Dirty/Delete tracking, grouped into tables by
//! scheme and into sets by owning module.
//!
//! ```text
//! Repository ─┬─ ModelSet (module 100) ─┬─ ModelTable<Item>
//!             │                         └─ ModelTable<Quest>
//!             └─ ModelSet (module 200) ─── ModelTable<Item>
//! ```

mod agent;
mod base;
mod meta;
mod repository;
mod scheme;
mod set;
mod state;
mod table;

pub use agent::ModelSetAgent;
pub use base::{PackageFuture, ParseFuture, Record};
pub use meta::RecordMeta;
pub use repository::Repository;
pub use scheme::{SchemeEntry, SchemeRegistry};
pub use set::ModelSet;
pub use state::RecordState;
pub use table::ModelTable;
