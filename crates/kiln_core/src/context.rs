//! # Core Context
//!
//! Owns the pool, the identifier generator and the frame clock for one
//! runtime. Several contexts can coexist in a process; nothing here is global.

use std::sync::Arc;

use crate::component::{Awake, Component, ComponentSlot};
use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::id::{FrameClock, Id, IdGenerator};
use crate::memory::{Pooled, ReferencePool};

/// Process-scoped services shared by every layer above the core.
#[derive(Debug)]
pub struct CoreContext {
    config: CoreConfig,
    pool: ReferencePool,
    ids: IdGenerator,
}

impl CoreContext {
    /// Builds a context with a wall-clock frame clock.
    #[must_use]
    pub fn new(config: CoreConfig) -> Self {
        Self::with_clock(config, Arc::new(FrameClock::new()))
    }

    /// Builds a context around an existing clock.
    #[must_use]
    pub fn with_clock(config: CoreConfig, clock: Arc<FrameClock>) -> Self {
        clock.set_time_zone(config.time_zone_hours);
        Self {
            pool: ReferencePool::new(config.strict_check),
            ids: IdGenerator::new(clock, config.process_tag),
            config,
        }
    }

    /// Settings the context was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// The object pool.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &ReferencePool {
        &self.pool
    }

    /// The identifier generator.
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    /// The frame clock.
    #[inline]
    #[must_use]
    pub fn clock(&self) -> &FrameClock {
        self.ids.clock()
    }

    /// Acquires a root component (one without a parent) and runs its
    /// [`Awake`] hook. An `id` of `0` means "generate one".
    pub fn spawn_component<T, A>(&self, id: Id, args: A) -> Pooled<T>
    where
        T: Awake<A>,
    {
        let id = if id == 0 { self.ids.generate_id() } else { id };
        let root = self.pool.acquire::<T>();
        {
            let mut guard = root.write();
            guard.node_mut().id = id;
            guard.awake(args);
        }
        root
    }

    /// Releases a component and its whole subtree back to the pool.
    ///
    /// Only meant for roots; children are removed through their parent.
    ///
    /// # Errors
    ///
    /// The first pool error met while releasing.
    pub fn destroy_component<T: Component>(&self, root: Pooled<T>) -> CoreResult<()> {
        Box::new(root).release_tree(&self.pool)
    }
}

impl Default for CoreContext {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}
