//! # KILN
//!
//! Pooled objects, change-tracked records and hierarchical modules for an
//! interactive client.
//!
//! ```text
//! ┌──────────────────────────── Runtime ────────────────────────────┐
//! │                                                                 │
//! │  kiln_core                        kiln_data                     │
//! │  ┌───────────────────┐            ┌──────────────────────────┐  │
//! │  │ ReferencePool     │<───────────│ Repository (record sets) │  │
//! │  │ IdGenerator       │            │ ModuleRepository         │  │
//! │  │ FrameClock        │            │ ModelSetAgent            │  │
//! │  │ Component tree    │            └──────────────────────────┘  │
//! │  └───────────────────┘                                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut runtime = kiln::Runtime::from_toml_str("[core]\nprocess_tag = 2\n")?;
//! let bag = runtime.install::<Bag>("bag", ())?;
//! runtime.tick();
//! runtime.shutdown()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod runtime;

pub use kiln_core as core;
pub use kiln_data as data;

pub use config::RuntimeConfig;
pub use error::{RuntimeError, RuntimeResult};
pub use runtime::Runtime;
