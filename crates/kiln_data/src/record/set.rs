//! # Model Set
//!
//! One module's record universe: a table per scheme, allocated on first use.

use std::any::TypeId;
use std::sync::Arc;

use indexmap::IndexMap;
use kiln_core::{CoreContext, Id, Pooled};
use serde_json::Value;

use super::base::{PackageFuture, Record};
use super::table::{run_deletes, run_pending, ErasedTable, ModelTable, PendingDelete};
use crate::error::{RecordError, RecordResult};

/// The tables of one set, keyed by scheme.
///
/// Read-only queries against a scheme with no table yet behave like an
/// empty table; they never allocate. Operations taking a record reject one
/// stamped with another set.
pub struct ModelSet {
    ctx: Arc<CoreContext>,
    id: Id,
    tables: IndexMap<TypeId, Box<dyn ErasedTable>>,
}

impl ModelSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new(ctx: Arc<CoreContext>, id: Id) -> Self {
        Self {
            ctx,
            id,
            tables: IndexMap::new(),
        }
    }

    /// Identity of the set (the owning module's id).
    #[inline]
    #[must_use]
    pub const fn id(&self) -> Id {
        self.id
    }

    /// Scheme tags of the allocated tables, in allocation order.
    #[must_use]
    pub fn schemes(&self) -> Vec<&'static str> {
        self.tables.values().map(|table| table.scheme()).collect()
    }

    /// Number of allocated tables.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Whether a table for `R` is allocated.
    #[must_use]
    pub fn is_exist<R: Record>(&self) -> bool {
        self.tables.contains_key(&TypeId::of::<R>())
    }

    /// Allocates the table for `R` if it does not exist yet.
    pub fn alloc<R: Record>(&mut self) {
        let (ctx, id) = (&self.ctx, self.id);
        self.tables
            .entry(TypeId::of::<R>())
            .or_insert_with(|| Box::new(ModelTable::<R>::new(Arc::clone(ctx), id)));
    }

    /// Disposes every row of `R` back to the pool and drops its table.
    ///
    /// # Errors
    ///
    /// Pool errors while disposing rows.
    pub fn free<R: Record>(&mut self) -> RecordResult<()> {
        match self.tables.shift_remove(&TypeId::of::<R>()) {
            Some(mut table) => table.dispose_rows(),
            None => Ok(()),
        }
    }

    /// [`ModelSet::free`] for every table.
    ///
    /// # Errors
    ///
    /// The first pool error; every table is still freed.
    pub fn free_all(&mut self) -> RecordResult<()> {
        let mut result = Ok(());
        for (_, mut table) in self.tables.drain(..) {
            let freed = table.dispose_rows();
            if result.is_ok() {
                result = freed;
            }
        }
        result
    }

    /// Drops every table and row without hooks and without pooling.
    pub fn violence_clear(&mut self) {
        for (_, mut table) in self.tables.drain(..) {
            table.drop_rows();
        }
    }

    /// Drops the table for `R` without hooks and without pooling.
    pub fn violence_clear_table<R: Record>(&mut self) {
        if let Some(mut table) = self.tables.shift_remove(&TypeId::of::<R>()) {
            table.drop_rows();
        }
    }

    /// The table for `R`, if allocated.
    #[must_use]
    pub fn table<R: Record>(&self) -> Option<&ModelTable<R>> {
        self.tables
            .get(&TypeId::of::<R>())?
            .as_any()
            .downcast_ref::<ModelTable<R>>()
    }

    /// The table for `R`, allocating it on first use.
    ///
    /// # Errors
    ///
    /// `Config` if the slot for `R` holds another table type, which means the
    /// set was corrupted.
    pub fn table_mut<R: Record>(&mut self) -> RecordResult<&mut ModelTable<R>> {
        self.alloc::<R>();
        self.tables
            .get_mut(&TypeId::of::<R>())
            .and_then(|table| table.as_any_mut().downcast_mut::<ModelTable<R>>())
            .ok_or_else(|| RecordError::Config(format!("table slot for {} holds another scheme", R::SCHEME)))
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Acquires a record of scheme `R` stamped with this set.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::table_mut`].
    pub fn create<R: Record>(&mut self) -> RecordResult<Pooled<R>> {
        Ok(self.table_mut::<R>()?.create())
    }

    /// Creates, fills and attaches a record of scheme `R`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::create_and_attach`].
    pub fn create_and_attach<R: Record>(&mut self, init: impl FnOnce(&mut R)) -> RecordResult<Pooled<R>> {
        self.table_mut::<R>()?.create_and_attach(init)
    }

    /// Attaches a record to its table.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::attach`].
    pub fn attach<R: Record>(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        self.table_mut::<R>()?.attach(record)
    }

    /// Attaches several records of one scheme.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::attach_many`].
    pub fn attach_many<'a, R: Record>(&mut self, records: impl IntoIterator<Item = &'a Pooled<R>>) -> RecordResult<()> {
        self.table_mut::<R>()?.attach_many(records)
    }

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::delete`].
    pub fn delete<R: Record>(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        self.table_mut::<R>()?.delete(record)
    }

    /// Deletes several records of one scheme.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::delete_many`].
    pub fn delete_many<'a, R: Record>(&mut self, records: impl IntoIterator<Item = &'a Pooled<R>>) -> RecordResult<()> {
        self.table_mut::<R>()?.delete_many(records)
    }

    /// Deletes every live row of `R`. Returns how many were deleted.
    pub fn delete_table<R: Record>(&mut self) -> usize {
        let pending = self.unlink_table::<R>();
        run_deletes(pending, self.ctx.pool())
    }

    /// Deletes every live row of every table, keeping the tables allocated.
    pub fn delete_all(&mut self) -> usize {
        let pending = self.unlink_all();
        run_deletes(pending, self.ctx.pool())
    }

    pub(crate) fn unlink_table<R: Record>(&mut self) -> Vec<PendingDelete> {
        self.tables
            .get_mut(&TypeId::of::<R>())
            .map(|table| table.unlink_rows())
            .unwrap_or_default()
    }

    pub(crate) fn unlink_all(&mut self) -> Vec<PendingDelete> {
        self.tables
            .values_mut()
            .flat_map(|table| table.unlink_rows())
            .collect()
    }

    /// Discards changes to a record.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::reset_data`].
    pub fn reset_data<R: Record>(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        self.table_mut::<R>()?.reset_data(record)
    }

    /// Discards changes to several records of one scheme.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::reset_data_many`].
    pub fn reset_data_many<'a, R: Record>(&mut self, records: impl IntoIterator<Item = &'a Pooled<R>>) -> RecordResult<()> {
        self.table_mut::<R>()?.reset_data_many(records)
    }

    /// Discards changes to every row of `R`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::reset_data_all`].
    pub fn reset_data_table<R: Record>(&mut self) -> RecordResult<()> {
        let (pending, result) = self.discard_table::<R>();
        let ran = run_pending(pending, self.ctx.pool());
        result.and(ran)
    }

    pub(crate) fn discard_table<R: Record>(&mut self) -> (Vec<PendingDelete>, RecordResult<()>) {
        match self.tables.get_mut(&TypeId::of::<R>()) {
            Some(table) => table.discard_rows(),
            None => (Vec::new(), Ok(())),
        }
    }

    /// Discards changes to every row of every table.
    ///
    /// # Errors
    ///
    /// The first failure; every table is still reset.
    pub fn reset_data_all(&mut self) -> RecordResult<()> {
        let (pending, result) = self.discard_all();
        let ran = run_pending(pending, self.ctx.pool());
        result.and(ran)
    }

    pub(crate) fn discard_all(&mut self) -> (Vec<PendingDelete>, RecordResult<()>) {
        let mut pending = Vec::new();
        let mut result = Ok(());
        for table in self.tables.values_mut() {
            let (deletes, reset) = table.discard_rows();
            pending.extend(deletes);
            if result.is_ok() {
                result = reset;
            }
        }
        (pending, result)
    }

    /// Accepts a record's current state as its baseline.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::reset_state`].
    pub fn reset_state<R: Record>(&mut self, record: &Pooled<R>) -> RecordResult<()> {
        self.table_mut::<R>()?.reset_state(record)
    }

    /// Accepts the current state of several records of one scheme.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::reset_state_many`].
    pub fn reset_state_many<'a, R: Record>(&mut self, records: impl IntoIterator<Item = &'a Pooled<R>>) -> RecordResult<()> {
        self.table_mut::<R>()?.reset_state_many(records)
    }

    /// Accepts the current state of every row of `R`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::reset_state_all`].
    pub fn reset_state_table<R: Record>(&mut self) -> RecordResult<()> {
        match self.tables.get_mut(&TypeId::of::<R>()) {
            Some(table) => table.reset_state_rows(),
            None => Ok(()),
        }
    }

    /// Accepts the current state of every row of every table.
    ///
    /// # Errors
    ///
    /// The first failure; every table is still reset.
    pub fn reset_state_all(&mut self) -> RecordResult<()> {
        let mut result = Ok(());
        for table in self.tables.values_mut() {
            let reset = table.reset_state_rows();
            if result.is_ok() {
                result = reset;
            }
        }
        result
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `record` is attached to its table here.
    #[must_use]
    pub fn is_exist_record<R: Record>(&self, record: &Pooled<R>, include_deleted: bool) -> bool {
        self.table::<R>()
            .is_some_and(|table| table.is_exist(record, include_deleted))
    }

    /// Whether any row of `R` matches `predicate`.
    pub fn exists_where<R: Record>(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> bool {
        self.table::<R>()
            .is_some_and(|table| table.exists_where(predicate, include_deleted))
    }

    /// Number of rows of `R` matching `predicate`.
    pub fn count<R: Record>(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> usize {
        self.table::<R>()
            .map_or(0, |table| table.count(predicate, include_deleted))
    }

    /// Row of `R` stored under `key`.
    #[must_use]
    pub fn get<R: Record>(&self, key: &R::Key) -> Option<Pooled<R>> {
        self.table::<R>()?.get(key)
    }

    /// Rows of `R` matching `predicate`.
    pub fn find<R: Record>(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> Vec<Pooled<R>> {
        self.table::<R>()
            .map(|table| table.find(predicate, include_deleted))
            .unwrap_or_default()
    }

    /// Every visible row of `R`.
    #[must_use]
    pub fn find_all<R: Record>(&self, include_deleted: bool) -> Vec<Pooled<R>> {
        self.table::<R>()
            .map(|table| table.find_all(include_deleted))
            .unwrap_or_default()
    }

    /// First visible row of `R`.
    #[must_use]
    pub fn first_or_default<R: Record>(&self, include_deleted: bool) -> Option<Pooled<R>> {
        self.table::<R>()?.first_or_default(include_deleted)
    }

    /// First row of `R` matching `predicate`.
    pub fn first_where<R: Record>(&self, predicate: impl Fn(&R) -> bool, include_deleted: bool) -> Option<Pooled<R>> {
        self.table::<R>()?.first_where(predicate, include_deleted)
    }

    /// Rows of `R`: live ones, or every row when `include_deleted` is set.
    #[must_use]
    pub fn assembly<R: Record>(&self, include_deleted: bool) -> Vec<Pooled<R>> {
        self.table::<R>()
            .map(|table| {
                if include_deleted {
                    table.total_assembly()
                } else {
                    table.assembly()
                }
            })
            .unwrap_or_default()
    }

    /// Clean rows of `R`.
    #[must_use]
    pub fn clean_assembly<R: Record>(&self) -> Vec<Pooled<R>> {
        self.table::<R>()
            .map(ModelTable::clean_assembly)
            .unwrap_or_default()
    }

    /// Dirty rows of `R`.
    #[must_use]
    pub fn dirty_assembly<R: Record>(&self) -> Vec<Pooled<R>> {
        self.table::<R>()
            .map(ModelTable::dirty_assembly)
            .unwrap_or_default()
    }

    /// New rows of `R`.
    #[must_use]
    pub fn new_assembly<R: Record>(&self) -> Vec<Pooled<R>> {
        self.table::<R>()
            .map(ModelTable::new_assembly)
            .unwrap_or_default()
    }

    /// Rows of `R` marked deleted.
    #[must_use]
    pub fn deleted_assembly<R: Record>(&self) -> Vec<Pooled<R>> {
        self.table::<R>()
            .map(ModelTable::deleted_assembly)
            .unwrap_or_default()
    }

    /// Every row of `R`, deleted ones included.
    #[must_use]
    pub fn total_assembly<R: Record>(&self) -> Vec<Pooled<R>> {
        self.table::<R>()
            .map(ModelTable::total_assembly)
            .unwrap_or_default()
    }

    /// Number of rows in the table registered for `type_id`.
    pub(crate) fn row_count(&self, type_id: TypeId, include_deleted: bool) -> usize {
        self.tables
            .get(&type_id)
            .map_or(0, |table| table.row_count(include_deleted))
    }

    // =========================================================================
    // External data
    // =========================================================================

    /// Serializes a record through its own hook.
    #[must_use]
    pub fn package<R: Record>(record: &Pooled<R>) -> PackageFuture {
        ModelTable::package(record)
    }

    /// Creates a record of `R` from external data and attaches it as clean.
    ///
    /// # Errors
    ///
    /// Same as [`ModelTable::parse`].
    pub async fn parse<R: Record>(&mut self, data: &Value) -> RecordResult<Option<Pooled<R>>> {
        self.table_mut::<R>()?.parse(data).await
    }
}

impl std::fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSet")
            .field("id", &self.id)
            .field("schemes", &self.schemes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::meta::RecordMeta;
    use crate::record::state::RecordState;
    use kiln_core::{CoreConfig, Poolable};

    #[derive(Default)]
    struct Quest {
        meta: RecordMeta<Quest>,
        id: u32,
    }

    impl Poolable for Quest {
        fn clear(&mut self) {
            self.meta.clear();
            self.id = 0;
        }
    }

    impl Record for Quest {
        type Key = u32;
        const SCHEME: &'static str = "quest";

        fn primary_key(&self) -> u32 {
            self.id
        }

        fn meta(&self) -> &RecordMeta<Self> {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut RecordMeta<Self> {
            &mut self.meta
        }
    }

    #[derive(Default)]
    struct Reward {
        meta: RecordMeta<Reward>,
        code: String,
    }

    impl Poolable for Reward {
        fn clear(&mut self) {
            self.meta.clear();
            self.code.clear();
        }
    }

    impl Record for Reward {
        type Key = String;
        const SCHEME: &'static str = "reward";

        fn primary_key(&self) -> String {
            self.code.clone()
        }

        fn meta(&self) -> &RecordMeta<Self> {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut RecordMeta<Self> {
            &mut self.meta
        }
    }

    fn set() -> ModelSet {
        ModelSet::new(Arc::new(CoreContext::default()), 7)
    }

    #[test]
    fn test_tables_are_allocated_lazily() {
        let mut set = set();
        assert!(set.table::<Quest>().is_none());
        assert!(set.find_all::<Quest>(true).is_empty());
        assert_eq!(set.table_count(), 0);

        set.create_and_attach::<Quest>(|quest| quest.id = 1).unwrap();
        set.alloc::<Reward>();
        assert_eq!(set.schemes(), vec!["quest", "reward"]);
        assert_eq!(set.table::<Quest>().map(ModelTable::len), Some(1));
    }

    #[test]
    fn test_whole_set_resets_cover_every_table() {
        let mut set = set();
        set.create_and_attach::<Quest>(|quest| quest.id = 1).unwrap();
        set.create_and_attach::<Reward>(|reward| reward.code = "gold".to_owned())
            .unwrap();

        set.reset_state_all().unwrap();
        assert_eq!(set.clean_assembly::<Quest>().len(), 1);
        assert_eq!(set.clean_assembly::<Reward>().len(), 1);

        assert_eq!(set.delete_all(), 2);
        set.reset_state_all().unwrap();
        assert_eq!(set.row_count(TypeId::of::<Quest>(), true), 0);
        assert_eq!(set.row_count(TypeId::of::<Reward>(), true), 0);
        assert_eq!(set.table_count(), 2);
    }

    #[test]
    fn test_reset_data_all_discards_new_rows() {
        let mut set = set();
        let quest = set.create_and_attach::<Quest>(|quest| quest.id = 2).unwrap();
        set.reset_data_all().unwrap();

        assert!(set.get::<Quest>(&2).is_none());
        assert_eq!(quest.read().meta().state(), RecordState::Clean);
    }

    #[test]
    fn test_records_of_another_set_are_rejected() {
        let ctx = Arc::new(CoreContext::default());
        let mut mine = ModelSet::new(Arc::clone(&ctx), 7);
        let mut theirs = ModelSet::new(ctx, 8);
        let quest = theirs.create_and_attach::<Quest>(|quest| quest.id = 3).unwrap();

        let mismatch = RecordError::IdentityMismatch {
            expected: 7,
            actual: 8,
        };
        assert_eq!(mine.attach(&quest), Err(mismatch.clone()));
        assert_eq!(mine.delete(&quest), Err(mismatch.clone()));
        assert_eq!(mine.reset_state(&quest), Err(mismatch));
        assert!(mine.find_all::<Quest>(true).is_empty());
        assert_eq!(theirs.new_assembly::<Quest>().len(), 1);
    }
}
