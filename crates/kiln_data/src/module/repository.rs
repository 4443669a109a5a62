//! # Module Repository
//!
//! Installs modules, keeps their hierarchy and tears them down children
//! first.

use std::sync::Arc;
use std::thread;

use indexmap::IndexMap;
use kiln_core::{CoreContext, CoreError, Id, Pooled, ReferencePool};
use parking_lot::Mutex;

use super::lifecycle::{Module, ModuleSlot, ModuleState};
use crate::config::ModuleConfig;
use crate::error::{ModuleError, ModuleResult};
use crate::record::{ModelSetAgent, Repository};

struct ModuleEntry {
    name: String,
    parent: Option<Id>,
    priority: i32,
    state: ModuleState,
    agent: ModelSetAgent,
    slot: Box<dyn ModuleSlot>,
}

impl ModuleEntry {
    fn transition(&mut self, id: Id, state: ModuleState) {
        tracing::debug!(module = %self.name, id, from = %self.state, to = %state, "module state");
        self.state = state;
    }
}

/// A module removed from the directory together with its subtree.
struct Detached {
    id: Id,
    entry: ModuleEntry,
    children: Vec<Detached>,
}

/// Directory of installed modules.
///
/// Install and uninstall calls for the same module must not overlap; the
/// repository is driven from one coordinating context.
pub struct ModuleRepository {
    ctx: Arc<CoreContext>,
    records: Arc<Mutex<Repository>>,
    config: ModuleConfig,
    modules: IndexMap<Id, ModuleEntry>,
}

impl ModuleRepository {
    /// Creates an empty directory whose modules keep their sets in
    /// `records`.
    #[must_use]
    pub fn new(ctx: Arc<CoreContext>, records: Arc<Mutex<Repository>>, config: ModuleConfig) -> Self {
        Self {
            ctx,
            records,
            config,
            modules: IndexMap::new(),
        }
    }

    /// Settings the repository was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// The record repository holding every module's set.
    #[inline]
    #[must_use]
    pub fn records(&self) -> &Arc<Mutex<Repository>> {
        &self.records
    }

    // =========================================================================
    // Install
    // =========================================================================

    /// Installs a root module under a generated id and runs its load
    /// pipeline.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` for a taken name; `Init` when a phase fails, after the
    /// module has been torn down.
    pub fn install<M: Module>(&mut self, name: &str, args: M::Args) -> ModuleResult<Pooled<M>> {
        let id = self.ctx.ids().generate_id();
        self.install_inner(id, name, None, args)
    }

    /// Installs a root module under an explicit id.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` for a taken id or name; `Init` when a phase fails.
    pub fn install_with_id<M: Module>(&mut self, id: Id, name: &str, args: M::Args) -> ModuleResult<Pooled<M>> {
        self.install_inner(id, name, None, args)
    }

    /// Installs a module as a child of `parent`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the parent is not installed, otherwise same as
    /// [`ModuleRepository::install`].
    pub fn install_under<M: Module>(&mut self, parent: Id, name: &str, args: M::Args) -> ModuleResult<Pooled<M>> {
        if !self.is_exist(parent) {
            return Err(ModuleError::NotFound(format!("parent module {parent}")));
        }
        let id = self.ctx.ids().generate_id();
        self.install_inner(id, name, Some(parent), args)
    }

    fn install_inner<M: Module>(
        &mut self,
        id: Id,
        name: &str,
        parent: Option<Id>,
        args: M::Args,
    ) -> ModuleResult<Pooled<M>> {
        if id == 0 {
            return Err(CoreError::InvalidArgument(format!("module {name} needs a non-zero id")).into());
        }
        if self.is_exist(id) || self.is_exist_by_name(name) {
            return Err(ModuleError::AlreadyExists {
                name: name.to_owned(),
                id,
            });
        }

        let module = self.ctx.pool().acquire::<M>();
        let agent = ModelSetAgent::new(id, Arc::clone(&self.records));
        let priority = module.read().priority();
        self.modules.insert(
            id,
            ModuleEntry {
                name: name.to_owned(),
                parent,
                priority,
                state: ModuleState::Created,
                agent: agent.clone(),
                slot: Box::new(module.clone()),
            },
        );
        tracing::info!(module = name, id, ?parent, "installing module");

        if let Err(source) = self.run_pipeline(id, &module, &agent, args) {
            tracing::warn!(module = name, id, error = %source, "module failed to initialize");
            drop(module);
            if let Some(detached) = self.detach(id) {
                if let Err(teardown) = destroy(detached, self.ctx.pool()) {
                    tracing::warn!(module = name, id, error = %teardown, "teardown after failed init");
                }
            }
            return Err(ModuleError::Init {
                name: name.to_owned(),
                id,
                source: Box::new(source),
            });
        }
        Ok(module)
    }

    fn run_pipeline<M: Module>(
        &mut self,
        id: Id,
        module: &Pooled<M>,
        agent: &ModelSetAgent,
        args: M::Args,
    ) -> ModuleResult<()> {
        self.transition(id, ModuleState::Initializing);
        module.write().on_init(agent, args)?;

        let gated = module
            .read()
            .check_loading()
            .unwrap_or(self.config.default_check_loading);

        self.transition(id, ModuleState::PreparingLoad);
        let prepared = module.write().on_preparing_load(agent)?;
        if gated && !prepared {
            tracing::warn!(id, phase = %ModuleState::PreparingLoad, "load pipeline stopped");
            return Ok(());
        }

        self.transition(id, ModuleState::Loading);
        let loaded = module.write().on_loading(agent)?;
        if gated && !loaded {
            tracing::warn!(id, phase = %ModuleState::Loading, "load pipeline stopped");
            return Ok(());
        }

        self.transition(id, ModuleState::LoadCompleted);
        module.write().on_load_completed(agent)?;
        self.transition(id, ModuleState::Ready);
        Ok(())
    }

    fn transition(&mut self, id: Id, state: ModuleState) {
        if let Some(entry) = self.modules.get_mut(&id) {
            entry.transition(id, state);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether a module with this id is installed.
    #[must_use]
    pub fn is_exist(&self, id: Id) -> bool {
        self.modules.contains_key(&id)
    }

    /// Whether a module with this name is installed.
    #[must_use]
    pub fn is_exist_by_name(&self, name: &str) -> bool {
        self.id_of(name).is_some()
    }

    /// Id of the module installed under `name`.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<Id> {
        self.modules
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(id, _)| *id)
    }

    /// Name of the module `id`.
    #[must_use]
    pub fn name(&self, id: Id) -> Option<&str> {
        self.modules.get(&id).map(|entry| entry.name.as_str())
    }

    /// The module `id`, if installed and of type `M`.
    #[must_use]
    pub fn get_module<M: Module>(&self, id: Id) -> Option<Pooled<M>> {
        self.modules
            .get(&id)?
            .slot
            .as_any()
            .downcast_ref::<Pooled<M>>()
            .cloned()
    }

    /// The module installed under `name`, if of type `M`.
    #[must_use]
    pub fn get_module_by_name<M: Module>(&self, name: &str) -> Option<Pooled<M>> {
        self.get_module(self.id_of(name)?)
    }

    /// The agent bound to module `id`.
    #[must_use]
    pub fn agent(&self, id: Id) -> Option<&ModelSetAgent> {
        self.modules.get(&id).map(|entry| &entry.agent)
    }

    /// Lifecycle state of module `id`.
    #[must_use]
    pub fn state(&self, id: Id) -> Option<ModuleState> {
        self.modules.get(&id).map(|entry| entry.state)
    }

    /// Teardown priority of module `id`.
    #[must_use]
    pub fn priority(&self, id: Id) -> Option<i32> {
        self.modules.get(&id).map(|entry| entry.priority)
    }

    /// Parent of module `id`, `None` for roots and unknown ids.
    #[must_use]
    pub fn parent(&self, id: Id) -> Option<Id> {
        self.modules.get(&id)?.parent
    }

    /// Direct children of module `id`, in install order.
    #[must_use]
    pub fn children(&self, id: Id) -> Vec<Id> {
        self.modules
            .iter()
            .filter(|(_, entry)| entry.parent == Some(id))
            .map(|(child, _)| *child)
            .collect()
    }

    /// Every module below `id`, breadth first.
    #[must_use]
    pub fn descendants(&self, id: Id) -> Vec<Id> {
        let mut found = self.children(id);
        let mut cursor = 0;
        while cursor < found.len() {
            let next = self.children(found[cursor]);
            found.extend(next);
            cursor += 1;
        }
        found
    }

    /// Topmost ancestor of module `id` (itself for a root).
    #[must_use]
    pub fn root_id(&self, id: Id) -> Option<Id> {
        let mut current = id;
        let mut entry = self.modules.get(&current)?;
        while let Some(parent) = entry.parent {
            match self.modules.get(&parent) {
                Some(next) => {
                    current = parent;
                    entry = next;
                }
                None => break,
            }
        }
        Some(current)
    }

    /// Ids of every installed module, in install order.
    #[must_use]
    pub fn ids(&self) -> Vec<Id> {
        self.modules.keys().copied().collect()
    }

    /// Number of installed modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether nothing is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Moves module `id` under `parent`.
    ///
    /// # Errors
    ///
    /// `NotFound` when either module is missing; `Structural` when the link
    /// would make a module its own ancestor.
    pub fn set_parent(&mut self, id: Id, parent: Id) -> ModuleResult<()> {
        if !self.is_exist(id) {
            return Err(ModuleError::NotFound(format!("module {id}")));
        }
        if !self.is_exist(parent) {
            return Err(ModuleError::NotFound(format!("parent module {parent}")));
        }
        if id == parent {
            return Err(ModuleError::Structural(format!("module {id} cannot be its own parent")));
        }
        if self.descendants(id).contains(&parent) {
            return Err(ModuleError::Structural(format!(
                "module {parent} is a descendant of module {id}"
            )));
        }
        if let Some(entry) = self.modules.get_mut(&id) {
            entry.parent = Some(parent);
        }
        Ok(())
    }

    /// [`ModuleRepository::set_parent`] with both modules named.
    ///
    /// # Errors
    ///
    /// Same as [`ModuleRepository::set_parent`].
    pub fn set_parent_by_name(&mut self, name: &str, parent: &str) -> ModuleResult<()> {
        let id = self
            .id_of(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_owned()))?;
        let parent = self
            .id_of(parent)
            .ok_or_else(|| ModuleError::NotFound(parent.to_owned()))?;
        self.set_parent(id, parent)
    }

    // =========================================================================
    // Uninstall
    // =========================================================================

    /// Tears down module `id` and its subtree. Unknown ids are a no-op.
    ///
    /// Children are destroyed concurrently before the module's set is
    /// released and its `on_destroyed` hook runs.
    ///
    /// # Errors
    ///
    /// `Teardown` listing what failed; the subtree is gone either way.
    pub fn uninstall(&mut self, id: Id) -> ModuleResult<()> {
        match self.detach(id) {
            Some(detached) => destroy(detached, self.ctx.pool()),
            None => Ok(()),
        }
    }

    /// [`ModuleRepository::uninstall`] by name.
    ///
    /// # Errors
    ///
    /// Same as [`ModuleRepository::uninstall`].
    pub fn uninstall_by_name(&mut self, name: &str) -> ModuleResult<()> {
        match self.id_of(name) {
            Some(id) => self.uninstall(id),
            None => Ok(()),
        }
    }

    /// Tears down every module, root subtrees started in descending
    /// priority and run concurrently, then clears the directory.
    ///
    /// # Errors
    ///
    /// The first teardown failure; every module is gone either way.
    pub fn uninstall_all(&mut self) -> ModuleResult<()> {
        let mut roots: Vec<(Id, i32)> = self
            .modules
            .iter()
            .filter(|(_, entry)| entry.parent.map_or(true, |parent| !self.modules.contains_key(&parent)))
            .map(|(id, entry)| (*id, entry.priority))
            .collect();
        roots.sort_by(|a, b| b.1.cmp(&a.1));

        let detached: Vec<Detached> = roots
            .into_iter()
            .filter_map(|(id, _)| self.detach(id))
            .collect();
        let results = destroy_all(detached, self.ctx.pool());
        self.modules.clear();
        tracing::info!("all modules uninstalled");
        results.into_iter().collect()
    }

    fn detach(&mut self, id: Id) -> Option<Detached> {
        let entry = self.modules.shift_remove(&id)?;
        let children = self
            .children(id)
            .into_iter()
            .filter_map(|child| self.detach(child))
            .collect();
        Some(Detached { id, entry, children })
    }
}

fn destroy(detached: Detached, pool: &ReferencePool) -> ModuleResult<()> {
    let Detached {
        id,
        mut entry,
        children,
    } = detached;
    entry.transition(id, ModuleState::Destroying);

    let mut failures: Vec<String> = destroy_all(children, pool)
        .into_iter()
        .filter_map(Result::err)
        .map(|err| err.to_string())
        .collect();
    if let Err(err) = entry.agent.release() {
        failures.push(format!("{} - {id}: {err}", entry.name));
    }
    entry.slot.destroyed();
    entry.transition(id, ModuleState::Destroyed);

    let ModuleEntry { name, slot, .. } = entry;
    if let Err(err) = slot.release_to(pool) {
        failures.push(format!("{name} - {id}: {err}"));
    }
    tracing::info!(module = %name, id, "uninstalled module");

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ModuleError::Teardown(failures.join("; ")))
    }
}

fn destroy_all(mut modules: Vec<Detached>, pool: &ReferencePool) -> Vec<ModuleResult<()>> {
    match modules.len() {
        0 => Vec::new(),
        1 => modules.pop().map(|only| destroy(only, pool)).into_iter().collect(),
        _ => thread::scope(|scope| {
            let workers: Vec<_> = modules
                .into_iter()
                .map(|module| scope.spawn(move || destroy(module, pool)))
                .collect();
            workers
                .into_iter()
                .map(|worker| {
                    worker
                        .join()
                        .unwrap_or_else(|_| Err(ModuleError::Teardown("module teardown panicked".to_owned())))
                })
                .collect()
        }),
    }
}

impl std::fmt::Debug for ModuleRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRepository")
            .field("modules", &self.modules.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
