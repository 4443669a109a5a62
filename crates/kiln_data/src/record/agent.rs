//! # Model Set Agent
//!
//! A module's capability over its own set, and nothing else.
//!
//! The repository lock is only held for table bookkeeping. Caller closures,
//! query predicates and record hooks run after it is released, so they may
//! call back into any agent.

use std::sync::Arc;

use kiln_core::{CoreContext, Id, Pooled};
use parking_lot::Mutex;
use serde_json::Value;

use super::base::{parse_detached, PackageFuture, Record};
use super::repository::Repository;
use super::set::ModelSet;
use super::table::{run_deletes, run_pending, ModelTable, PendingDelete};
use crate::error::{RecordError, RecordResult};

/// Handle a module uses to reach its record set.
///
/// Every entry point that takes a record first checks that the record is
/// stamped with the agent's module id and fails with
/// [`RecordError::IdentityMismatch`] otherwise. This check is the only
/// isolation between modules' data.
#[derive(Clone)]
pub struct ModelSetAgent {
    module_id: Id,
    repository: Arc<Mutex<Repository>>,
}

impl ModelSetAgent {
    /// Binds an agent to the set `module_id`, allocating the set.
    #[must_use]
    pub fn new(module_id: Id, repository: Arc<Mutex<Repository>>) -> Self {
        repository.lock().alloc(module_id);
        Self {
            module_id,
            repository,
        }
    }

    /// The module (and set) the agent works for.
    #[inline]
    #[must_use]
    pub const fn module_id(&self) -> Id {
        self.module_id
    }

    /// Frees every table of the set and removes it from the repository.
    ///
    /// # Errors
    ///
    /// Same as [`Repository::release`].
    pub fn release(&self) -> RecordResult<()> {
        self.repository.lock().release(self.module_id)
    }

    fn check<R: Record>(&self, record: &Pooled<R>) -> RecordResult<()> {
        let actual = record.read().meta().set_id();
        if actual == self.module_id {
            Ok(())
        } else {
            Err(RecordError::IdentityMismatch {
                expected: self.module_id,
                actual,
            })
        }
    }

    fn check_all<R: Record>(&self, records: &[&Pooled<R>]) -> RecordResult<()> {
        records.iter().try_for_each(|record| self.check(record))
    }

    fn with_set<T>(&self, f: impl FnOnce(&mut ModelSet) -> T) -> T {
        f(self.repository.lock().set_mut(self.module_id))
    }

    fn read_set<T: Default>(&self, f: impl FnOnce(&ModelSet) -> T) -> T {
        self.repository
            .lock()
            .set(self.module_id)
            .map(f)
            .unwrap_or_default()
    }

    fn context(&self) -> Arc<CoreContext> {
        Arc::clone(self.repository.lock().context())
    }

    fn finish(&self, pending: impl IntoIterator<Item = PendingDelete>) -> RecordResult<()> {
        run_pending(pending, self.context().pool())
    }

    /// Rows of `R` passing `predicate`, evaluated outside the lock.
    fn select<R: Record>(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> impl Iterator<Item = Pooled<R>> {
        self.assembly::<R>(include_deleted)
            .into_iter()
            .filter(move |record| predicate(&record.read()))
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Whether the table for `R` is allocated.
    #[must_use]
    pub fn is_exist<R: Record>(&self) -> bool {
        self.read_set(ModelSet::is_exist::<R>)
    }

    /// Allocates the table for `R`.
    pub fn alloc<R: Record>(&self) {
        self.with_set(ModelSet::alloc::<R>);
    }

    /// Frees the table for `R`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::free`].
    pub fn free<R: Record>(&self) -> RecordResult<()> {
        self.with_set(ModelSet::free::<R>)
    }

    /// Frees every table of the set, keeping the set itself.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::free_all`].
    pub fn free_all(&self) -> RecordResult<()> {
        self.with_set(ModelSet::free_all)
    }

    /// Drops every table and row without hooks and without pooling.
    pub fn violence_clear(&self) {
        self.with_set(ModelSet::violence_clear);
    }

    /// Scheme tags of the allocated tables.
    #[must_use]
    pub fn schemes(&self) -> Vec<&'static str> {
        self.read_set(ModelSet::schemes)
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Acquires a record of scheme `R` stamped with this module's set.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::create`].
    pub fn create<R: Record>(&self) -> RecordResult<Pooled<R>> {
        self.with_set(|set| set.table_mut::<R>().map(|_| ()))?;
        Ok(ModelTable::<R>::acquire_stamped(self.context().pool(), self.module_id))
    }

    /// Creates, fills and attaches a record of scheme `R`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::create_and_attach`].
    pub fn create_and_attach<R: Record>(&self, init: impl FnOnce(&mut R)) -> RecordResult<Pooled<R>> {
        let record = self.create::<R>()?;
        init(&mut record.write());
        if let Err(err) = self.with_set(|set| set.attach(&record)) {
            self.context().pool().release(record)?;
            return Err(err);
        }
        Ok(record)
    }

    /// Attaches a record.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a foreign record, otherwise same as
    /// [`ModelSet::attach`].
    pub fn attach<R: Record>(&self, record: &Pooled<R>) -> RecordResult<()> {
        self.check(record)?;
        self.with_set(|set| set.attach(record))
    }

    /// Attaches several records. Nothing is attached if any is foreign.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a foreign record, otherwise same as
    /// [`ModelSet::attach_many`].
    pub fn attach_many<R: Record>(&self, records: &[&Pooled<R>]) -> RecordResult<()> {
        self.check_all(records)?;
        self.with_set(|set| set.attach_many(records.iter().copied()))
    }

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a foreign record, otherwise same as
    /// [`ModelSet::delete`].
    pub fn delete<R: Record>(&self, record: &Pooled<R>) -> RecordResult<()> {
        self.check(record)?;
        self.delete_owned(record)
    }

    fn delete_owned<R: Record>(&self, record: &Pooled<R>) -> RecordResult<()> {
        let pending = self.with_set(|set| set.table_mut::<R>()?.unlink(record))?;
        self.finish(pending)
    }

    /// Deletes several records. Nothing is deleted if any is foreign.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a foreign record, otherwise same as
    /// [`ModelSet::delete_many`].
    pub fn delete_many<R: Record>(&self, records: &[&Pooled<R>]) -> RecordResult<()> {
        self.check_all(records)?;
        records.iter().try_for_each(|record| self.delete_owned(record))
    }

    /// Deletes every live row of `R`.
    pub fn delete_table<R: Record>(&self) -> usize {
        let pending = self.with_set(ModelSet::unlink_table::<R>);
        run_deletes(pending, self.context().pool())
    }

    /// Deletes every live row of the set.
    pub fn delete_all(&self) -> usize {
        let pending = self.with_set(ModelSet::unlink_all);
        run_deletes(pending, self.context().pool())
    }

    /// Discards changes to a record.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a foreign record, otherwise same as
    /// [`ModelSet::reset_data`].
    pub fn reset_data<R: Record>(&self, record: &Pooled<R>) -> RecordResult<()> {
        self.check(record)?;
        self.reset_data_owned(record)
    }

    fn reset_data_owned<R: Record>(&self, record: &Pooled<R>) -> RecordResult<()> {
        let pending = self.with_set(|set| set.table_mut::<R>()?.discard(record))?;
        self.finish(pending)
    }

    /// Discards changes to several records.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a foreign record, otherwise same as
    /// [`ModelSet::reset_data_many`].
    pub fn reset_data_many<R: Record>(&self, records: &[&Pooled<R>]) -> RecordResult<()> {
        self.check_all(records)?;
        records.iter().try_for_each(|record| self.reset_data_owned(record))
    }

    /// Discards changes to every row of `R`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::reset_data_table`].
    pub fn reset_data_table<R: Record>(&self) -> RecordResult<()> {
        let (pending, result) = self.with_set(ModelSet::discard_table::<R>);
        let ran = self.finish(pending);
        result.and(ran)
    }

    /// Discards changes to every row of the set.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::reset_data_all`].
    pub fn reset_data_all(&self) -> RecordResult<()> {
        let (pending, result) = self.with_set(ModelSet::discard_all);
        let ran = self.finish(pending);
        result.and(ran)
    }

    /// Accepts a record's current state as its baseline.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a foreign record, otherwise same as
    /// [`ModelSet::reset_state`].
    pub fn reset_state<R: Record>(&self, record: &Pooled<R>) -> RecordResult<()> {
        self.check(record)?;
        self.with_set(|set| set.reset_state(record))
    }

    /// Accepts the current state of several records.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a foreign record, otherwise same as
    /// [`ModelSet::reset_state_many`].
    pub fn reset_state_many<R: Record>(&self, records: &[&Pooled<R>]) -> RecordResult<()> {
        self.check_all(records)?;
        self.with_set(|set| set.reset_state_many(records.iter().copied()))
    }

    /// Accepts the current state of every row of `R`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::reset_state_table`].
    pub fn reset_state_table<R: Record>(&self) -> RecordResult<()> {
        self.with_set(ModelSet::reset_state_table::<R>)
    }

    /// Accepts the current state of every row of the set.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::reset_state_all`].
    pub fn reset_state_all(&self) -> RecordResult<()> {
        self.with_set(ModelSet::reset_state_all)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `record` is attached here.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a foreign record.
    pub fn is_exist_record<R: Record>(&self, record: &Pooled<R>, include_deleted: bool) -> RecordResult<bool> {
        self.check(record)?;
        Ok(self.read_set(|set| set.is_exist_record(record, include_deleted)))
    }

    /// Whether any row of `R` matches `predicate`.
    pub fn exists_where<R: Record>(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> bool {
        self.select(predicate, include_deleted).next().is_some()
    }

    /// Number of rows of `R` matching `predicate`.
    pub fn count<R: Record>(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> usize {
        self.select(predicate, include_deleted).count()
    }

    /// Row of `R` stored under `key`.
    #[must_use]
    pub fn get<R: Record>(&self, key: &R::Key) -> Option<Pooled<R>> {
        self.read_set(|set| set.get::<R>(key))
    }

    /// Rows of `R` matching `predicate`.
    pub fn find<R: Record>(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> Vec<Pooled<R>> {
        self.select(predicate, include_deleted).collect()
    }

    /// Every visible row of `R`.
    #[must_use]
    pub fn find_all<R: Record>(&self, include_deleted: bool) -> Vec<Pooled<R>> {
        self.read_set(|set| set.find_all::<R>(include_deleted))
    }

    /// First visible row of `R`.
    #[must_use]
    pub fn first_or_default<R: Record>(&self, include_deleted: bool) -> Option<Pooled<R>> {
        self.read_set(|set| set.first_or_default::<R>(include_deleted))
    }

    /// First row of `R` matching `predicate`.
    pub fn first_where<R: Record>(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> Option<Pooled<R>> {
        self.select(predicate, include_deleted).next()
    }

    /// Rows of `R`: live ones, or every row when `include_deleted` is set.
    #[must_use]
    pub fn assembly<R: Record>(&self, include_deleted: bool) -> Vec<Pooled<R>> {
        self.read_set(|set| set.assembly::<R>(include_deleted))
    }

    /// Clean rows of `R`.
    #[must_use]
    pub fn clean_assembly<R: Record>(&self) -> Vec<Pooled<R>> {
        self.read_set(ModelSet::clean_assembly::<R>)
    }

    /// Dirty rows of `R`.
    #[must_use]
    pub fn dirty_assembly<R: Record>(&self) -> Vec<Pooled<R>> {
        self.read_set(ModelSet::dirty_assembly::<R>)
    }

    /// New rows of `R`.
    #[must_use]
    pub fn new_assembly<R: Record>(&self) -> Vec<Pooled<R>> {
        self.read_set(ModelSet::new_assembly::<R>)
    }

    /// Rows of `R` marked deleted.
    #[must_use]
    pub fn deleted_assembly<R: Record>(&self) -> Vec<Pooled<R>> {
        self.read_set(ModelSet::deleted_assembly::<R>)
    }

    /// Every row of `R`, deleted ones included.
    #[must_use]
    pub fn total_assembly<R: Record>(&self) -> Vec<Pooled<R>> {
        self.read_set(ModelSet::total_assembly::<R>)
    }

    // =========================================================================
    // External data
    // =========================================================================

    /// Serializes one of this module's records.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a foreign record.
    pub fn package<R: Record>(&self, record: &Pooled<R>) -> RecordResult<PackageFuture> {
        self.check(record)?;
        Ok(ModelSet::package(record))
    }

    /// Creates a record of `R` from external data and attaches it as clean.
    ///
    /// The repository is not locked while the record's parse hook runs.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::parse`].
    pub async fn parse<R: Record>(&self, data: &Value) -> RecordResult<Option<Pooled<R>>> {
        if data.is_null() {
            return Ok(None);
        }
        let record = self.create::<R>()?;
        let parsed = parse_detached(&record, data).await;
        self.with_set(|set| set.table_mut::<R>()?.attach_parsed(record, parsed))
            .map(Some)
    }
}

impl std::fmt::Debug for ModelSetAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSetAgent")
            .field("module_id", &self.module_id)
            .finish_non_exhaustive()
    }
}
