//! # Runtime
//!
//! One process-scoped bundle of pool, clock, record sets and modules.
//!
//! ```text
//! tick():     clock.update() -> frame += 1
//! shutdown(): modules.uninstall_all() -> records.clear() -> pool.clear_all()
//! ```

use std::sync::Arc;

use kiln_core::{CoreContext, FrameClock, Id, PoolInfo, Pooled};
use kiln_data::{ModelSetAgent, Module, ModuleRepository, Repository};
use parking_lot::Mutex;

use crate::config::RuntimeConfig;
use crate::error::RuntimeResult;

/// The host-facing entry point.
///
/// Driven from one coordinating thread: the host calls [`Runtime::tick`]
/// once per frame and [`Runtime::shutdown`] once on exit.
#[derive(Debug)]
pub struct Runtime {
    core: Arc<CoreContext>,
    records: Arc<Mutex<Repository>>,
    modules: ModuleRepository,
    frame: u64,
}

impl Runtime {
    /// Builds a runtime reading wall time.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_clock(config, Arc::new(FrameClock::new()))
    }

    /// Builds a runtime around an existing clock.
    #[must_use]
    pub fn with_clock(config: RuntimeConfig, clock: Arc<FrameClock>) -> Self {
        let RuntimeConfig { core, modules } = config;
        let core = Arc::new(CoreContext::with_clock(core, clock));
        let records = Arc::new(Mutex::new(Repository::new(Arc::clone(&core))));
        let modules = ModuleRepository::new(Arc::clone(&core), Arc::clone(&records), modules);
        tracing::info!(
            strict_check = core.config().strict_check,
            process_tag = core.config().process_tag,
            "runtime started"
        );
        Self {
            core,
            records,
            modules,
            frame: 0,
        }
    }

    /// Builds a runtime from TOML configuration text.
    ///
    /// # Errors
    ///
    /// Same as [`RuntimeConfig::from_toml_str`].
    pub fn from_toml_str(text: &str) -> RuntimeResult<Self> {
        Ok(Self::new(RuntimeConfig::from_toml_str(text)?))
    }

    /// Pool, identifiers and clock.
    #[inline]
    #[must_use]
    pub fn core(&self) -> &Arc<CoreContext> {
        &self.core
    }

    /// Every module's record set.
    #[inline]
    #[must_use]
    pub fn records(&self) -> &Arc<Mutex<Repository>> {
        &self.records
    }

    /// Installed modules.
    #[inline]
    #[must_use]
    pub fn modules(&self) -> &ModuleRepository {
        &self.modules
    }

    /// Installed modules, for install, reparenting and uninstall.
    #[inline]
    pub fn modules_mut(&mut self) -> &mut ModuleRepository {
        &mut self.modules
    }

    /// Installs a root module.
    ///
    /// # Errors
    ///
    /// Same as [`ModuleRepository::install`].
    pub fn install<M: Module>(&mut self, name: &str, args: M::Args) -> RuntimeResult<Pooled<M>> {
        Ok(self.modules.install(name, args)?)
    }

    /// Agent of an installed module.
    #[must_use]
    pub fn agent(&self, module_id: Id) -> Option<ModelSetAgent> {
        self.modules.agent(module_id).cloned()
    }

    /// Frames ticked so far.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Advances the frame clock. Returns the new frame number.
    pub fn tick(&mut self) -> u64 {
        self.core.clock().update();
        self.frame += 1;
        tracing::trace!(frame = self.frame, time = self.core.clock().frame_time(), "tick");
        self.frame
    }

    /// Pool counters per type, for monitoring.
    #[must_use]
    pub fn pool_report(&self) -> Vec<PoolInfo> {
        self.core.pool().infos()
    }

    /// Uninstalls every module, frees every remaining set and empties the
    /// pool.
    ///
    /// Every step runs even if an earlier one failed.
    ///
    /// # Errors
    ///
    /// The first failure, modules before records.
    pub fn shutdown(&mut self) -> RuntimeResult<()> {
        let modules = self.modules.uninstall_all();
        let records = self.records.lock().clear();
        self.core.pool().clear_all();
        tracing::info!(frames = self.frame, "runtime shut down");
        modules?;
        records?;
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
