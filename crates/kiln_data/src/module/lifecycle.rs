//! # Module Lifecycle
//!
//! What a module supplies, and the states it moves through.

use std::any::Any;
use std::fmt;

use kiln_core::{CoreResult, Poolable, Pooled, ReferencePool};

use crate::error::ModuleResult;
use crate::record::ModelSetAgent;

/// A hierarchical unit of the application owning exactly one record set.
///
/// Load phases run in order after [`Module::on_init`]:
///
/// ```text
/// on_init -> on_preparing_load -> on_loading -> on_load_completed
/// ```
///
/// With load checking on, a gating phase returning `Ok(false)` stops the
/// pipeline and the module stays in that phase. With it off, every phase
/// runs regardless. Any `Err` aborts installation.
pub trait Module: Poolable {
    /// Arguments handed to [`Module::on_init`].
    type Args;

    /// Teardown order for [`uninstall_all`]: higher values go first.
    ///
    /// [`uninstall_all`]: super::ModuleRepository::uninstall_all
    fn priority(&self) -> i32 {
        0
    }

    /// Per-module override of load checking. `None` uses the repository
    /// default.
    fn check_loading(&self) -> Option<bool> {
        None
    }

    /// First phase. The agent is bound to this module's set.
    ///
    /// # Errors
    ///
    /// Any failure aborts installation.
    fn on_init(&mut self, agent: &ModelSetAgent, args: Self::Args) -> ModuleResult<()> {
        let _ = (agent, args);
        Ok(())
    }

    /// Gating phase run before loading.
    ///
    /// # Errors
    ///
    /// Any failure aborts installation.
    fn on_preparing_load(&mut self, agent: &ModelSetAgent) -> ModuleResult<bool> {
        let _ = agent;
        Ok(true)
    }

    /// Gating phase doing the actual loading.
    ///
    /// # Errors
    ///
    /// Any failure aborts installation.
    fn on_loading(&mut self, agent: &ModelSetAgent) -> ModuleResult<bool> {
        let _ = agent;
        Ok(true)
    }

    /// Last phase.
    ///
    /// # Errors
    ///
    /// Any failure aborts installation.
    fn on_load_completed(&mut self, agent: &ModelSetAgent) -> ModuleResult<()> {
        let _ = agent;
        Ok(())
    }

    /// Runs after every child is gone and the set is released.
    fn on_destroyed(&mut self) {}
}

/// Where a module stands in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleState {
    /// Registered, nothing run yet.
    Created,
    /// Running `on_init`.
    Initializing,
    /// Running `on_preparing_load`, or stopped there.
    PreparingLoad,
    /// Running `on_loading`, or stopped there.
    Loading,
    /// Running `on_load_completed`.
    LoadCompleted,
    /// Every phase ran.
    Ready,
    /// Children are being torn down.
    Destroying,
    /// Returned to the pool.
    Destroyed,
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::PreparingLoad => "preparing-load",
            Self::Loading => "loading",
            Self::LoadCompleted => "load-completed",
            Self::Ready => "ready",
            Self::Destroying => "destroying",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Type-erased installed module.
pub(crate) trait ModuleSlot: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn destroyed(&self);
    fn release_to(self: Box<Self>, pool: &ReferencePool) -> CoreResult<()>;
}

impl<M: Module> ModuleSlot for Pooled<M> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn destroyed(&self) {
        self.write().on_destroyed();
    }

    fn release_to(self: Box<Self>, pool: &ReferencePool) -> CoreResult<()> {
        pool.release_any(self)
    }
}
