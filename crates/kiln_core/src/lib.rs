//! # KILN Core
//!
//! Generational pooled objects for a client runtime:
//! - Per-type object pool with double-release detection
//! - Time-ordered 64-bit identifiers stamped from a frame clock
//! - Handles that notice when their object was recycled
//! - An ownership tree of pooled components
//!
//! ## Architecture Rules
//!
//! 1. **The pool is the only allocation path** - pooled types are never built by hand
//! 2. **Identity is the generation** - a recycled object always gets a fresh id
//! 3. **No globals** - pool, ids and clock live in a [`CoreContext`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use kiln_core::{ComponentHelper, CoreConfig, CoreContext};
//!
//! let ctx = CoreContext::new(CoreConfig::default());
//! let scene = ctx.spawn_component::<Scene, _>(0, ());
//! let player = scene.add_component::<Player, _>(&ctx, ("hero",))?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod id;
pub mod memory;

pub use component::{Awake, Component, ComponentHelper, ComponentSlot, Node};
pub use config::CoreConfig;
pub use context::CoreContext;
pub use error::{CoreError, CoreResult};
pub use id::{FrameClock, Id, IdGenerator, IdStruct, Identified, InstanceIdStruct};
pub use memory::{AnyPooled, Handle, PoolInfo, Poolable, Pooled, ReferencePool};
