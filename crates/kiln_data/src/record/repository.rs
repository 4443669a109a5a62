//! # Repository
//!
//! Directory of record sets, keyed by the identity of the owning module.

use std::collections::HashMap;
use std::sync::Arc;

use kiln_core::{CoreContext, Id, Pooled};

use super::base::Record;
use super::scheme::SchemeRegistry;
use super::set::ModelSet;
use crate::error::RecordResult;

/// Every set of one runtime.
///
/// Record entry points route by the set id stamped on the record. Modules
/// reach their own set through a [`ModelSetAgent`](super::ModelSetAgent).
#[derive(Debug)]
pub struct Repository {
    ctx: Arc<CoreContext>,
    sets: HashMap<Id, ModelSet>,
    schemes: SchemeRegistry,
}

impl Repository {
    /// Creates an empty directory.
    #[must_use]
    pub fn new(ctx: Arc<CoreContext>) -> Self {
        Self {
            ctx,
            sets: HashMap::new(),
            schemes: SchemeRegistry::new(),
        }
    }

    /// The core context shared by every set.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Arc<CoreContext> {
        &self.ctx
    }

    // =========================================================================
    // Sets
    // =========================================================================

    /// Whether a set exists for `set_id`.
    #[must_use]
    pub fn is_exist(&self, set_id: Id) -> bool {
        self.sets.contains_key(&set_id)
    }

    /// The set for `set_id`, if allocated.
    #[must_use]
    pub fn set(&self, set_id: Id) -> Option<&ModelSet> {
        self.sets.get(&set_id)
    }

    /// The set for `set_id`, allocating it on first use.
    pub fn set_mut(&mut self, set_id: Id) -> &mut ModelSet {
        let ctx = &self.ctx;
        self.sets.entry(set_id).or_insert_with(|| {
            tracing::debug!(set_id, "allocated set");
            ModelSet::new(Arc::clone(ctx), set_id)
        })
    }

    /// Allocates the set for `set_id` if it does not exist yet.
    pub fn alloc(&mut self, set_id: Id) {
        self.set_mut(set_id);
    }

    /// Frees every table of the set and removes it.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::free_all`]; the set is removed regardless.
    pub fn release(&mut self, set_id: Id) -> RecordResult<()> {
        match self.sets.remove(&set_id) {
            Some(mut set) => {
                tracing::debug!(set_id, "released set");
                set.free_all()
            }
            None => Ok(()),
        }
    }

    /// Frees the table of scheme `R` in the set `set_id`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::free`].
    pub fn free_table<R: Record>(&mut self, set_id: Id) -> RecordResult<()> {
        match self.sets.get_mut(&set_id) {
            Some(set) => set.free::<R>(),
            None => Ok(()),
        }
    }

    /// Identities of the allocated sets, sorted.
    #[must_use]
    pub fn set_ids(&self) -> Vec<Id> {
        let mut ids: Vec<_> = self.sets.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of allocated sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether no set is allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Frees and removes every set.
    ///
    /// # Errors
    ///
    /// The first failure; every set is still removed.
    pub fn clear(&mut self) -> RecordResult<()> {
        let mut result = Ok(());
        for (_, mut set) in self.sets.drain() {
            let freed = set.free_all();
            if result.is_ok() {
                result = freed;
            }
        }
        result
    }

    // =========================================================================
    // Records, routed by set id
    // =========================================================================

    /// Acquires a record of scheme `R` for the set `set_id`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::create`].
    pub fn create<R: Record>(&mut self, set_id: Id) -> RecordResult<Pooled<R>> {
        self.set_mut(set_id).create::<R>()
    }

    /// Attaches a record to the set it is stamped with.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::attach`].
    pub fn attach<R: Record>(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        let set_id = record.read().meta().set_id();
        self.set_mut(set_id).attach(record)
    }

    /// Deletes a record from the set it is stamped with.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::delete`].
    pub fn delete<R: Record>(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        let set_id = record.read().meta().set_id();
        self.set_mut(set_id).delete(record)
    }

    /// Discards changes to a record.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::reset_data`].
    pub fn reset_data<R: Record>(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        let set_id = record.read().meta().set_id();
        self.set_mut(set_id).reset_data(record)
    }

    /// Accepts a record's current state as its baseline.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::reset_state`].
    pub fn reset_state<R: Record>(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        let set_id = record.read().meta().set_id();
        self.set_mut(set_id).reset_state(record)
    }

    /// Whether a record is attached to the set it is stamped with.
    #[must_use]
    pub fn is_exist_record<R: Record>(&self, record: &Pooled<R>, include_deleted: bool) -> bool {
        let set_id = record.read().meta().set_id();
        self.set(set_id)
            .is_some_and(|set| set.is_exist_record(record, include_deleted))
    }

    // =========================================================================
    // Schemes
    // =========================================================================

    /// Registers scheme `R` for tag-based access.
    ///
    /// # Errors
    ///
    /// Same as [`SchemeRegistry::register`].
    pub fn register_scheme<R: Record>(&mut self) -> RecordResult<()> {
        self.schemes.register::<R>()
    }

    /// The scheme registry.
    #[inline]
    #[must_use]
    pub fn schemes(&self) -> &SchemeRegistry {
        &self.schemes
    }

    /// Allocates the table tagged `tag` in the set `set_id`.
    ///
    /// # Errors
    ///
    /// `Config` when the tag is unknown.
    pub fn alloc_by_scheme(&mut self, set_id: Id, tag: &str) -> RecordResult<()> {
        let entry = *self.schemes.resolve(tag)?;
        entry.alloc(self.set_mut(set_id));
        Ok(())
    }

    /// Frees the table tagged `tag` in the set `set_id`.
    ///
    /// # Errors
    ///
    /// `Config` when the tag is unknown, or a pool failure while freeing.
    pub fn free_by_scheme(&mut self, set_id: Id, tag: &str) -> RecordResult<()> {
        let entry = *self.schemes.resolve(tag)?;
        match self.sets.get_mut(&set_id) {
            Some(set) => entry.free(set),
            None => Ok(()),
        }
    }

    /// Number of rows in the table tagged `tag` in the set `set_id`.
    ///
    /// # Errors
    ///
    /// `Config` when the tag is unknown.
    pub fn count_by_scheme(&self, set_id: Id, tag: &str, include_deleted: bool) -> RecordResult<usize> {
        let entry = self.schemes.resolve(tag)?;
        Ok(self
            .set(set_id)
            .map_or(0, |set| entry.count(set, include_deleted)))
    }

    /// Deletes every live row of the table tagged `tag` in the set `set_id`.
    ///
    /// # Errors
    ///
    /// `Config` when the tag is unknown.
    pub fn delete_by_scheme(&mut self, set_id: Id, tag: &str) -> RecordResult<usize> {
        let entry = *self.schemes.resolve(tag)?;
        Ok(self.sets.get_mut(&set_id).map_or(0, |set| entry.delete(set)))
    }

    /// Discards changes to every row of the table tagged `tag`.
    ///
    /// # Errors
    ///
    /// `Config` when the tag is unknown, or the reset failure.
    pub fn reset_data_by_scheme(&mut self, set_id: Id, tag: &str) -> RecordResult<()> {
        let entry = *self.schemes.resolve(tag)?;
        match self.sets.get_mut(&set_id) {
            Some(set) => entry.reset_data(set),
            None => Ok(()),
        }
    }

    /// Accepts the current state of every row of the table tagged `tag`.
    ///
    /// # Errors
    ///
    /// `Config` when the tag is unknown, or the reset failure.
    pub fn reset_state_by_scheme(&mut self, set_id: Id, tag: &str) -> RecordResult<()> {
        let entry = *self.schemes.resolve(tag)?;
        match self.sets.get_mut(&set_id) {
            Some(set) => entry.reset_state(set),
            None => Ok(()),
        }
    }
}
