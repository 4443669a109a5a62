//! # Record Metadata
//!
//! Set identity, mutation state and the snapshot of overwritten field values.

use std::fmt;

use kiln_core::Id;

use super::state::RecordState;

type Restore<R> = Box<dyn FnOnce(&mut R) + Send + Sync>;

/// Bookkeeping embedded in every record.
///
/// Setters report writes through [`RecordMeta::track`]:
///
/// ```rust,ignore
/// pub fn set_count(&mut self, count: u32) {
///     let old = std::mem::replace(&mut self.count, count);
///     self.meta.track("count", old, |item, v| item.count = v);
/// }
/// ```
pub struct RecordMeta<R> {
    set_id: Id,
    state: RecordState,
    snapshot: Vec<(&'static str, Restore<R>)>,
}

impl<R: 'static> RecordMeta<R> {
    /// Set the record belongs to. `0` while pooled.
    #[inline]
    #[must_use]
    pub const fn set_id(&self) -> Id {
        self.set_id
    }

    /// Current mutation state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> RecordState {
        self.state
    }

    pub(crate) fn stamp(&mut self, set_id: Id) {
        self.set_id = set_id;
    }

    pub(crate) fn set_state(&mut self, state: RecordState) {
        self.state = state;
    }

    /// Records the value a field had before a write.
    ///
    /// Only the first write per field since the last baseline is kept, so a
    /// rollback always returns to the baseline. A clean record turns dirty.
    pub fn track<V>(&mut self, field: &'static str, original: V, restore: fn(&mut R, V))
    where
        V: Send + Sync + 'static,
    {
        if self.state == RecordState::Clean {
            self.state = RecordState::Dirty;
        }
        if self.is_tracked(field) {
            return;
        }
        self.snapshot
            .push((field, Box::new(move |record: &mut R| restore(record, original))));
    }

    /// Whether a field has been written since the last baseline.
    #[must_use]
    pub fn is_tracked(&self, field: &str) -> bool {
        self.snapshot.iter().any(|(name, _)| *name == field)
    }

    /// Names of the fields written since the last baseline, in write order.
    #[must_use]
    pub fn modified_fields(&self) -> Vec<&'static str> {
        self.snapshot.iter().map(|(name, _)| *name).collect()
    }

    /// Accepts the current values as the new baseline.
    pub fn clear_snapshot(&mut self) {
        self.snapshot.clear();
    }

    /// Resets to the pooled state.
    pub fn clear(&mut self) {
        self.set_id = 0;
        self.state = RecordState::Clean;
        self.snapshot.clear();
    }

    fn take_snapshot(&mut self) -> Vec<(&'static str, Restore<R>)> {
        std::mem::take(&mut self.snapshot)
    }
}

/// Restores every tracked field of `record` and marks it clean.
pub(crate) fn rollback<R: 'static>(record: &mut R, meta: fn(&mut R) -> &mut RecordMeta<R>) {
    let snapshot = meta(record).take_snapshot();
    for (_, restore) in snapshot.into_iter().rev() {
        restore(record);
    }
    let meta = meta(record);
    meta.snapshot.clear();
    meta.state = RecordState::Clean;
}

impl<R> Default for RecordMeta<R> {
    fn default() -> Self {
        Self {
            set_id: 0,
            state: RecordState::Clean,
            snapshot: Vec::new(),
        }
    }
}

impl<R: 'static> fmt::Debug for RecordMeta<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordMeta")
            .field("set_id", &self.set_id)
            .field("state", &self.state)
            .field("modified", &self.modified_fields())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Hero {
        meta: RecordMeta<Hero>,
        level: u32,
        name: String,
    }

    impl Hero {
        fn set_level(&mut self, level: u32) {
            let old = std::mem::replace(&mut self.level, level);
            self.meta.track("level", old, |hero, v| hero.level = v);
        }

        fn set_name(&mut self, name: &str) {
            let old = std::mem::replace(&mut self.name, name.to_owned());
            self.meta.track("name", old, |hero, v| hero.name = v);
        }
    }

    #[test]
    fn test_first_write_wins() {
        let mut hero = Hero::default();
        hero.set_level(2);
        hero.set_level(3);
        hero.set_name("ada");

        assert_eq!(hero.meta.state(), RecordState::Dirty);
        assert_eq!(hero.meta.modified_fields(), vec!["level", "name"]);

        rollback(&mut hero, |h| &mut h.meta);
        assert_eq!(hero.level, 0);
        assert_eq!(hero.name, "");
        assert_eq!(hero.meta.state(), RecordState::Clean);
        assert!(hero.meta.modified_fields().is_empty());
    }

    #[test]
    fn test_new_record_stays_new_on_write() {
        let mut hero = Hero::default();
        hero.meta.set_state(RecordState::New);
        hero.set_level(5);

        assert_eq!(hero.meta.state(), RecordState::New);
        assert!(hero.meta.is_tracked("level"));
    }
}
