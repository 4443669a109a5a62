//! # Model Table
//!
//! All records of one scheme within one set, keyed by primary key.
//!
//! Queries are linear scans in attach order. Tables hold thousands of rows,
//! not millions, so there are no secondary indexes.

use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;
use kiln_core::{CoreContext, Id, Pooled, ReferencePool};
use serde_json::Value;

use super::base::{parse_detached, PackageFuture, Record};
use super::meta::rollback;
use super::state::RecordState;
use crate::error::{RecordError, RecordResult};

/// Rows of one scheme in one set.
pub struct ModelTable<R: Record> {
    ctx: Arc<CoreContext>,
    set_id: Id,
    records: IndexMap<R::Key, Pooled<R>>,
}

fn visible<R: Record>(record: &R, include_deleted: bool) -> bool {
    include_deleted || !record.meta().state().is_deleted()
}

/// A delete whose hook has not run yet.
///
/// Tables unlink rows while the set is borrowed and hand back the deleted
/// hook (plus the release of rows that were never persisted) so it can run
/// once the set is no longer locked.
pub(crate) struct PendingDelete(Box<dyn FnOnce(&ReferencePool) -> RecordResult<()> + Send>);

impl PendingDelete {
    fn new<R: Record>(record: Pooled<R>, dispose: bool) -> Self {
        Self(Box::new(move |pool| {
            record.write().on_deleted();
            if dispose {
                pool.release(record)?;
            }
            Ok(())
        }))
    }

    pub(crate) fn run(self, pool: &ReferencePool) -> RecordResult<()> {
        (self.0)(pool)
    }
}

/// Runs every pending delete.
///
/// # Errors
///
/// The first failure; the rest still run.
pub(crate) fn run_pending(pending: impl IntoIterator<Item = PendingDelete>, pool: &ReferencePool) -> RecordResult<()> {
    let mut result = Ok(());
    for delete in pending {
        let ran = delete.run(pool);
        if result.is_ok() {
            result = ran;
        }
    }
    result
}

/// Runs the deletes of a whole-table delete, logging failures.
///
/// Returns how many rows were deleted.
pub(crate) fn run_deletes(pending: Vec<PendingDelete>, pool: &ReferencePool) -> usize {
    let deleted = pending.len();
    for delete in pending {
        if let Err(err) = delete.run(pool) {
            tracing::warn!(%err, "deleted hook failed");
        }
    }
    deleted
}

impl<R: Record> ModelTable<R> {
    /// Creates an empty table for the set `set_id`.
    #[must_use]
    pub fn new(ctx: Arc<CoreContext>, set_id: Id) -> Self {
        tracing::debug!(scheme = R::SCHEME, set_id, "allocated table");
        Self {
            ctx,
            set_id,
            records: IndexMap::new(),
        }
    }

    /// Set this table belongs to.
    #[inline]
    #[must_use]
    pub const fn set_id(&self) -> Id {
        self.set_id
    }

    /// Scheme tag of the rows.
    #[inline]
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        R::SCHEME
    }

    /// Number of rows, deleted ones included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Primary key of a record.
    #[must_use]
    pub fn primary_key(record: &Pooled<R>) -> R::Key {
        record.read().primary_key()
    }

    fn key_error(key: &R::Key) -> String {
        format!("{key:?}")
    }

    fn check_owner(&self, record: &Pooled<R>) -> RecordResult<()> {
        let actual = record.read().meta().set_id();
        if actual == self.set_id {
            Ok(())
        } else {
            Err(RecordError::IdentityMismatch {
                expected: self.set_id,
                actual,
            })
        }
    }

    fn is_stored(&self, key: &R::Key, record: &Pooled<R>) -> bool {
        self.records
            .get(key)
            .is_some_and(|stored| Pooled::ptr_eq(stored, record))
    }

    // =========================================================================
    // Creation and attachment
    // =========================================================================

    /// Acquires a `New` record stamped with this set. It is not visible to
    /// queries until attached.
    #[must_use]
    pub fn create(&self) -> Pooled<R> {
        Self::acquire_stamped(self.ctx.pool(), self.set_id)
    }

    /// [`ModelTable::create`] without borrowing a table.
    pub(crate) fn acquire_stamped(pool: &ReferencePool, set_id: Id) -> Pooled<R> {
        let record = pool.acquire::<R>();
        {
            let mut guard = record.write();
            let meta = guard.meta_mut();
            meta.stamp(set_id);
            meta.set_state(RecordState::New);
            guard.on_create();
        }
        record
    }

    /// Creates a record, lets `init` fill it (typically the primary key) and
    /// attaches it.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::attach`]; the record goes back to the pool.
    pub fn create_and_attach(&mut self, init: impl FnOnce(&mut R)) -> RecordResult<Pooled<R>> {
        let record = self.create();
        init(&mut record.write());
        if let Err(err) = self.attach(&record) {
            self.ctx.pool().release(record)?;
            return Err(err);
        }
        Ok(record)
    }

    /// Inserts a record by primary key.
    ///
    /// An absent key becomes `New`. A key whose row is marked `Delete` is
    /// resurrected as `Dirty`, replacing the stored object if a different one
    /// is passed. Attaching the row that is already stored is a no-op.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a record stamped with another set,
    /// `DuplicateRecord` when a different, live record holds the key.
    pub fn attach(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        self.check_owner(record)?;
        let key = record.read().primary_key();
        let Some(stored) = self.records.get(&key).cloned() else {
            record.write().meta_mut().set_state(RecordState::New);
            self.records.insert(key, record.clone());
            return Ok(());
        };

        let same = Pooled::ptr_eq(&stored, record);
        let stored_deleted = stored.read().meta().state().is_deleted();
        if !stored_deleted {
            if same {
                return Ok(());
            }
            return Err(RecordError::DuplicateRecord {
                scheme: R::SCHEME,
                key: Self::key_error(&key),
            });
        }

        record.write().meta_mut().set_state(RecordState::Dirty);
        if !same {
            if let Some(old) = self.records.insert(key, record.clone()) {
                self.ctx.pool().release(old)?;
            }
        }
        Ok(())
    }

    /// Attaches several records, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::attach`].
    pub fn attach_many<'a>(&mut self, records: impl IntoIterator<Item = &'a Pooled<R>>) -> RecordResult<()> {
        records.into_iter().try_for_each(|record| self.attach(record))
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Deletes a record.
    ///
    /// A `New` record was never persisted: it is disposed immediately. Any
    /// other record is marked `Delete` and stays queryable with deleted rows
    /// included until the next state reset.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a record stamped with another set, `NotFound`
    /// when a non-new record is not attached here.
    pub fn delete(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        match self.unlink(record)? {
            Some(pending) => pending.run(self.ctx.pool()),
            None => Ok(()),
        }
    }

    /// [`ModelTable::delete`] up to, not including, the deleted hook.
    pub(crate) fn unlink(&mut self, record: &Pooled<R>) -> RecordResult<Option<PendingDelete>> {
        self.check_owner(record)?;
        let (key, state) = {
            let guard = record.read();
            (guard.primary_key(), guard.meta().state())
        };
        match state {
            RecordState::New => {
                if self.is_stored(&key, record) {
                    self.records.shift_remove(&key);
                }
                Ok(Some(PendingDelete::new(record.clone(), true)))
            }
            RecordState::Delete => Ok(None),
            RecordState::Clean | RecordState::Dirty => {
                if !self.is_stored(&key, record) {
                    return Err(RecordError::NotFound {
                        scheme: R::SCHEME,
                        key: Self::key_error(&key),
                    });
                }
                record.write().meta_mut().set_state(RecordState::Delete);
                Ok(Some(PendingDelete::new(record.clone(), false)))
            }
        }
    }

    /// Deletes several records, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::delete`].
    pub fn delete_many<'a>(&mut self, records: impl IntoIterator<Item = &'a Pooled<R>>) -> RecordResult<()> {
        records.into_iter().try_for_each(|record| self.delete(record))
    }

    /// Deletes every live row. Failures are logged and skipped.
    ///
    /// Returns how many rows were deleted.
    pub fn delete_all(&mut self) -> usize {
        let pending = self.unlink_live();
        run_deletes(pending, self.ctx.pool())
    }

    /// [`ModelTable::delete_all`] up to the deleted hooks.
    pub(crate) fn unlink_live(&mut self) -> Vec<PendingDelete> {
        let mut pending = Vec::new();
        for record in self.assembly() {
            match self.unlink(&record) {
                Ok(Some(delete)) => pending.push(delete),
                Ok(None) => {}
                Err(err) => tracing::warn!(scheme = R::SCHEME, %err, "delete skipped"),
            }
        }
        pending
    }

    // =========================================================================
    // Resets
    // =========================================================================

    /// Discards changes to a record.
    ///
    /// A `New` record is deleted (its addition discarded); any other record
    /// has its tracked fields rolled back and becomes `Clean`.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a record stamped with another set, otherwise
    /// same as [`ModelTable::delete`] for new records.
    pub fn reset_data(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        match self.discard(record)? {
            Some(pending) => pending.run(self.ctx.pool()),
            None => Ok(()),
        }
    }

    /// [`ModelTable::reset_data`] up to the deleted hook of a new record.
    pub(crate) fn discard(&mut self, record: &Pooled<R>) -> RecordResult<Option<PendingDelete>> {
        self.check_owner(record)?;
        if record.read().meta().state() == RecordState::New {
            return self.unlink(record);
        }
        rollback(&mut *record.write(), R::meta_mut);
        Ok(None)
    }

    /// [`ModelTable::reset_data`] for several records.
    ///
    /// # Errors
    ///
    /// The first failure; the remaining records are not touched.
    pub fn reset_data_many<'a>(&mut self, records: impl IntoIterator<Item = &'a Pooled<R>>) -> RecordResult<()> {
        records.into_iter().try_for_each(|record| self.reset_data(record))
    }

    /// [`ModelTable::reset_data`] for every row.
    ///
    /// # Errors
    ///
    /// The first failure; remaining rows are still reset.
    pub fn reset_data_all(&mut self) -> RecordResult<()> {
        let (pending, result) = self.discard_rows();
        let ran = run_pending(pending, self.ctx.pool());
        result.and(ran)
    }

    /// [`ModelTable::reset_data_all`] up to the deleted hooks.
    pub(crate) fn discard_rows(&mut self) -> (Vec<PendingDelete>, RecordResult<()>) {
        let mut pending = Vec::new();
        let mut result = Ok(());
        for record in self.total_assembly() {
            match self.discard(&record) {
                Ok(delete) => pending.extend(delete),
                Err(err) if result.is_ok() => result = Err(err),
                Err(_) => {}
            }
        }
        (pending, result)
    }

    /// Accepts a record's current state as the new baseline.
    ///
    /// A `Delete` record is evicted and disposed; any other record keeps its
    /// values, drops its snapshot and becomes `Clean`.
    ///
    /// # Errors
    ///
    /// `IdentityMismatch` for a record stamped with another set, pool errors
    /// while disposing.
    pub fn reset_state(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        self.check_owner(record)?;
        if record.read().meta().state().is_deleted() {
            return self.dispose(record);
        }
        let mut guard = record.write();
        let meta = guard.meta_mut();
        meta.clear_snapshot();
        meta.set_state(RecordState::Clean);
        Ok(())
    }

    /// [`ModelTable::reset_state`] for several records.
    ///
    /// # Errors
    ///
    /// The first failure; the remaining records are not touched.
    pub fn reset_state_many<'a>(&mut self, records: impl IntoIterator<Item = &'a Pooled<R>>) -> RecordResult<()> {
        records.into_iter().try_for_each(|record| self.reset_state(record))
    }

    /// [`ModelTable::reset_state`] for every row.
    ///
    /// # Errors
    ///
    /// The first failure; remaining rows are still reset.
    pub fn reset_state_all(&mut self) -> RecordResult<()> {
        let mut result = Ok(());
        for record in self.total_assembly() {
            let reset = self.reset_state(&record);
            if result.is_ok() {
                result = reset;
            }
        }
        result
    }

    /// Removes a record without hooks and returns it to the pool.
    ///
    /// # Errors
    ///
    /// Pool errors while releasing.
    pub fn dispose(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        let key = record.read().primary_key();
        if self.is_stored(&key, record) {
            self.records.shift_remove(&key);
        }
        self.ctx.pool().release(record.clone())?;
        Ok(())
    }

    /// Disposes every row back to the pool.
    ///
    /// # Errors
    ///
    /// The first pool error; remaining rows are still disposed.
    pub fn clear(&mut self) -> RecordResult<()> {
        let mut result = Ok(());
        for (_, record) in self.records.drain(..) {
            if let Err(err) = self.ctx.pool().release(record) {
                if result.is_ok() {
                    result = Err(err.into());
                }
            }
        }
        result
    }

    /// Drops every row without hooks and without returning it to the pool.
    pub fn violence_clear(&mut self) {
        self.records.clear();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `record` is the row stored under its key.
    #[must_use]
    pub fn is_exist(&self, record: &Pooled<R>, include_deleted: bool) -> bool {
        let key = record.read().primary_key();
        self.records
            .get(&key)
            .filter(|stored| Pooled::ptr_eq(*stored, record))
            .is_some_and(|stored| visible(&*stored.read(), include_deleted))
    }

    /// Whether a row is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &R::Key, include_deleted: bool) -> bool {
        self.records
            .get(key)
            .is_some_and(|stored| visible(&*stored.read(), include_deleted))
    }

    /// Row stored under `key`, deleted rows included.
    #[must_use]
    pub fn get(&self, key: &R::Key) -> Option<Pooled<R>> {
        self.records.get(key).cloned()
    }

    /// Whether any row matches `predicate`.
    pub fn exists_where(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> bool {
        self.records.values().any(|record| {
            let record = record.read();
            visible(&*record, include_deleted) && predicate(&record)
        })
    }

    /// Number of rows matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> usize {
        self.records
            .values()
            .filter(|record| {
                let record = record.read();
                visible(&*record, include_deleted) && predicate(&record)
            })
            .count()
    }

    /// Rows matching `predicate`, in attach order.
    pub fn find(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> Vec<Pooled<R>> {
        self.records
            .values()
            .filter(|record| {
                let record = record.read();
                visible(&*record, include_deleted) && predicate(&record)
            })
            .cloned()
            .collect()
    }

    /// Every visible row, in attach order.
    #[must_use]
    pub fn find_all(&self, include_deleted: bool) -> Vec<Pooled<R>> {
        self.find(|_| true, include_deleted)
    }

    /// First visible row.
    #[must_use]
    pub fn first_or_default(&self, include_deleted: bool) -> Option<Pooled<R>> {
        self.first_where(|_| true, include_deleted)
    }

    /// First row matching `predicate`.
    pub fn first_where(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> Option<Pooled<R>> {
        self.records
            .values()
            .find(|record| {
                let record = record.read();
                visible(&*record, include_deleted) && predicate(&record)
            })
            .cloned()
    }

    fn in_state(&self, state: RecordState) -> Vec<Pooled<R>> {
        self.find(|record| record.meta().state() == state, true)
    }

    /// Live rows (everything not marked `Delete`).
    #[must_use]
    pub fn assembly(&self) -> Vec<Pooled<R>> {
        self.find_all(false)
    }

    /// Rows in state `Clean`.
    #[must_use]
    pub fn clean_assembly(&self) -> Vec<Pooled<R>> {
        self.in_state(RecordState::Clean)
    }

    /// Rows in state `Dirty`.
    #[must_use]
    pub fn dirty_assembly(&self) -> Vec<Pooled<R>> {
        self.in_state(RecordState::Dirty)
    }

    /// Rows in state `New`.
    #[must_use]
    pub fn new_assembly(&self) -> Vec<Pooled<R>> {
        self.in_state(RecordState::New)
    }

    /// Rows in state `Delete`.
    #[must_use]
    pub fn deleted_assembly(&self) -> Vec<Pooled<R>> {
        self.in_state(RecordState::Delete)
    }

    /// Every row, deleted ones included.
    #[must_use]
    pub fn total_assembly(&self) -> Vec<Pooled<R>> {
        self.records.values().cloned().collect()
    }

    // =========================================================================
    // External data
    // =========================================================================

    /// Serializes a record through its own [`Record::package`].
    pub fn package(record: &Pooled<R>) -> PackageFuture {
        record.read().package()
    }

    /// Creates a record, fills it from `data` and attaches it as `Clean`.
    ///
    /// `Value::Null` yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// `ParseFailed` when the record rejects the data, `DuplicateRecord` when
    /// its key is already stored.
    pub async fn parse(&mut self, data: &Value) -> RecordResult<Option<Pooled<R>>> {
        if data.is_null() {
            return Ok(None);
        }
        let record = self.create();
        let parsed = parse_detached(&record, data).await;
        self.attach_parsed(record, parsed).map(Some)
    }

    /// Second half of [`ModelTable::parse`], for callers that ran the parse
    /// hook themselves.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::parse`].
    pub(crate) fn attach_parsed(&mut self, record: Pooled<R>, parsed: RecordResult<bool>) -> RecordResult<Pooled<R>> {
        let key = record.read().primary_key();
        let rejected = match parsed {
            Ok(true) if self.records.contains_key(&key) => Some(RecordError::DuplicateRecord {
                scheme: R::SCHEME,
                key: Self::key_error(&key),
            }),
            Ok(true) => None,
            Ok(false) => Some(RecordError::ParseFailed {
                scheme: R::SCHEME,
                key: Self::key_error(&key),
            }),
            Err(err) => Some(err),
        };
        if let Some(err) = rejected {
            self.ctx.pool().release(record)?;
            return Err(err);
        }

        {
            let mut guard = record.write();
            let meta = guard.meta_mut();
            meta.clear_snapshot();
            meta.set_state(RecordState::Clean);
        }
        self.records.insert(key, record.clone());
        Ok(record)
    }
}

/// Object-safe view of a table, used by sets for whole-set operations.
pub(crate) trait ErasedTable: Send + Sync {
    fn scheme(&self) -> &'static str;
    fn row_count(&self, include_deleted: bool) -> usize;
    fn unlink_rows(&mut self) -> Vec<PendingDelete>;
    fn discard_rows(&mut self) -> (Vec<PendingDelete>, RecordResult<()>);
    fn reset_state_rows(&mut self) -> RecordResult<()>;
    fn dispose_rows(&mut self) -> RecordResult<()>;
    fn drop_rows(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<R: Record> ErasedTable for ModelTable<R> {
    fn scheme(&self) -> &'static str {
        R::SCHEME
    }

    fn row_count(&self, include_deleted: bool) -> usize {
        self.count(|_| true, include_deleted)
    }

    fn unlink_rows(&mut self) -> Vec<PendingDelete> {
        self.unlink_live()
    }

    fn discard_rows(&mut self) -> (Vec<PendingDelete>, RecordResult<()>) {
        ModelTable::discard_rows(self)
    }

    fn reset_state_rows(&mut self) -> RecordResult<()> {
        self.reset_state_all()
    }

    fn dispose_rows(&mut self) -> RecordResult<()> {
        self.clear()
    }

    fn drop_rows(&mut self) {
        self.violence_clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::meta::RecordMeta;
    use kiln_core::{CoreConfig, Poolable};

    #[derive(Default)]
    struct Slot {
        meta: RecordMeta<Slot>,
        index: u16,
        created: bool,
    }

    impl Poolable for Slot {
        fn clear(&mut self) {
            self.meta.clear();
            self.index = 0;
            self.created = false;
        }
    }

    impl Record for Slot {
        type Key = u16;
        const SCHEME: &'static str = "slot";

        fn primary_key(&self) -> u16 {
            self.index
        }

        fn meta(&self) -> &RecordMeta<Self> {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut RecordMeta<Self> {
            &mut self.meta
        }

        fn on_create(&mut self) {
            self.created = true;
        }
    }

    fn table() -> ModelTable<Slot> {
        let ctx = Arc::new(CoreContext::new(CoreConfig {
            strict_check: true,
            ..CoreConfig::default()
        }));
        ModelTable::new(ctx, 42)
    }

    #[test]
    fn test_create_stamps_and_runs_hook() {
        let table = table();
        let slot = table.create();
        let guard = slot.read();
        assert_eq!(guard.meta().set_id(), 42);
        assert_eq!(guard.meta().state(), RecordState::New);
        assert!(guard.created);
        assert!(table.is_empty());
    }

    #[test]
    fn test_delete_before_attach_returns_record_to_pool() {
        let mut table = table();
        let slot = table.create();
        slot.write().index = 2;

        table.delete(&slot).unwrap();
        let info = table.ctx.pool().info::<Slot>().unwrap();
        assert_eq!((info.using, info.released), (0, 1));

        let slot = table.create();
        table.reset_data(&slot).unwrap();
        assert_eq!(table.ctx.pool().info::<Slot>().unwrap().released, 2);
    }

    #[test]
    fn test_new_record_becomes_clean_on_state_reset() {
        let mut table = table();
        let slot = table.create_and_attach(|slot| slot.index = 1).unwrap();
        assert_eq!(slot.read().meta().state(), RecordState::New);

        table.reset_state(&slot).unwrap();
        assert_eq!(slot.read().meta().state(), RecordState::Clean);
        assert!(table.contains_key(&1, false));
    }

    #[test]
    fn test_delete_of_unattached_clean_record_fails() {
        let mut table = table();
        let slot = table.create();
        slot.write().index = 3;
        table.reset_state(&slot).unwrap();

        let err = table.delete(&slot).unwrap_err();
        assert!(matches!(err, RecordError::NotFound { scheme: "slot", .. }));
    }

    #[test]
    fn test_rows_of_another_set_are_rejected() {
        let mut table = table();
        let other = ModelTable::<Slot>::new(Arc::clone(&table.ctx), 7);
        let foreign = other.create();

        let mismatch = RecordError::IdentityMismatch {
            expected: 42,
            actual: 7,
        };
        assert_eq!(table.attach(&foreign), Err(mismatch.clone()));
        assert_eq!(table.delete(&foreign), Err(mismatch.clone()));
        assert_eq!(table.reset_data(&foreign), Err(mismatch.clone()));
        assert_eq!(table.reset_state(&foreign), Err(mismatch));
        assert!(table.is_empty());
        assert_eq!(foreign.read().meta().state(), RecordState::New);
    }

    #[test]
    fn test_failed_create_and_attach_returns_record_to_pool() {
        let mut table = table();
        table.create_and_attach(|slot| slot.index = 5).unwrap();
        let released = table.ctx.pool().info::<Slot>().map_or(0, |info| info.released);

        assert!(table.create_and_attach(|slot| slot.index = 5).is_err());
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.ctx.pool().info::<Slot>().map(|info| info.released),
            Some(released + 1)
        );
    }

    #[test]
    fn test_clear_disposes_every_row() {
        let mut table = table();
        for index in 0..4 {
            table.create_and_attach(|slot| slot.index = index).unwrap();
        }
        table.clear().unwrap();

        assert!(table.is_empty());
        let info = table.ctx.pool().info::<Slot>().unwrap();
        assert_eq!(info.unused, 4);
    }
}
