//! # KILN Data
//!
//! Change-tracked records and the modules that own them:
//! - Records tracked as New, Clean, Dirty or Delete with field-level rollback
//! - Tables per scheme, sets per module, one repository per runtime
//! - Agents that keep each module inside its own set
//! - Modules installed into a hierarchy and torn down leaves first
//!
//! ## Architecture Rules
//!
//! 1. **Records come from the pool** - tables create them, tables dispose them
//! 2. **One set per module** - a record is stamped with its set on creation
//! 3. **No lock across an await** - parse hooks run on a detached value
//!
//! ## Example
//!
//! ```rust,ignore
//! use kiln_data::{ModuleConfig, ModuleRepository, Repository};
//!
//! let records = Arc::new(Mutex::new(Repository::new(Arc::clone(&ctx))));
//! let mut modules = ModuleRepository::new(ctx, records, ModuleConfig::default());
//! modules.install_with_id::<Bag>(100, "bag", ())?;
//! if let Some(agent) = modules.agent(100) {
//!     let item = agent.create_and_attach::<Item>(|item| item.key = 10002)?;
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod module;
pub mod record;

pub use config::ModuleConfig;
pub use error::{ModuleError, ModuleResult, RecordError, RecordResult};
pub use module::{Module, ModuleRepository, ModuleState};
pub use record::{
    ModelSet, ModelSetAgent, ModelTable, PackageFuture, ParseFuture, Record, RecordMeta,
    RecordState, Repository, SchemeEntry, SchemeRegistry,
};
