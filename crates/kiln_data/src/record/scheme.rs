//! # Scheme Registry
//!
//! Tag-based access to tables for callers that only know a scheme by name,
//! such as tooling or data loaders.

use std::any::TypeId;
use std::collections::HashMap;

use super::base::Record;
use super::set::ModelSet;
use crate::error::{RecordError, RecordResult};

/// Table operations of one scheme, monomorphized at registration.
#[derive(Clone, Copy)]
pub struct SchemeEntry {
    tag: &'static str,
    type_id: TypeId,
    alloc: fn(&mut ModelSet),
    free: fn(&mut ModelSet) -> RecordResult<()>,
    count: fn(&ModelSet, bool) -> usize,
    delete: fn(&mut ModelSet) -> usize,
    reset_data: fn(&mut ModelSet) -> RecordResult<()>,
    reset_state: fn(&mut ModelSet) -> RecordResult<()>,
}

impl SchemeEntry {
    /// Builds the entry for scheme `R`.
    #[must_use]
    pub fn of<R: Record>() -> Self {
        Self {
            tag: R::SCHEME,
            type_id: TypeId::of::<R>(),
            alloc: ModelSet::alloc::<R>,
            free: ModelSet::free::<R>,
            count: |set, include_deleted| set.row_count(TypeId::of::<R>(), include_deleted),
            delete: ModelSet::delete_table::<R>,
            reset_data: ModelSet::reset_data_table::<R>,
            reset_state: ModelSet::reset_state_table::<R>,
        }
    }

    /// Tag of the scheme.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        self.tag
    }

    /// Allocates the scheme's table in `set`.
    pub fn alloc(&self, set: &mut ModelSet) {
        (self.alloc)(set);
    }

    /// Frees the scheme's table in `set`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::free`].
    pub fn free(&self, set: &mut ModelSet) -> RecordResult<()> {
        (self.free)(set)
    }

    /// Number of rows of the scheme in `set`.
    #[must_use]
    pub fn count(&self, set: &ModelSet, include_deleted: bool) -> usize {
        (self.count)(set, include_deleted)
    }

    /// Deletes every live row of the scheme in `set`.
    pub fn delete(&self, set: &mut ModelSet) -> usize {
        (self.delete)(set)
    }

    /// Discards changes to every row of the scheme in `set`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::reset_data_table`].
    pub fn reset_data(&self, set: &mut ModelSet) -> RecordResult<()> {
        (self.reset_data)(set)
    }

    /// Accepts the current state of every row of the scheme in `set`.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSet::reset_state_table`].
    pub fn reset_state(&self, set: &mut ModelSet) -> RecordResult<()> {
        (self.reset_state)(set)
    }
}

impl std::fmt::Debug for SchemeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemeEntry").field("tag", &self.tag).finish_non_exhaustive()
    }
}

/// Scheme tags mapped to their table operations.
#[derive(Debug, Default)]
pub struct SchemeRegistry {
    entries: HashMap<&'static str, SchemeEntry>,
}

impl SchemeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers scheme `R` under [`Record::SCHEME`].
    ///
    /// Registering the same type twice is a no-op.
    ///
    /// # Errors
    ///
    /// `Config` when another type already uses the tag.
    pub fn register<R: Record>(&mut self) -> RecordResult<()> {
        if let Some(existing) = self.entries.get(R::SCHEME) {
            if existing.type_id == TypeId::of::<R>() {
                return Ok(());
            }
            return Err(RecordError::Config(format!(
                "scheme tag {} is already registered to another type",
                R::SCHEME
            )));
        }
        self.entries.insert(R::SCHEME, SchemeEntry::of::<R>());
        tracing::debug!(scheme = R::SCHEME, "registered scheme");
        Ok(())
    }

    /// Entry registered under `tag`.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&SchemeEntry> {
        self.entries.get(tag)
    }

    /// Entry registered under `tag`, or a `Config` error naming it.
    ///
    /// # Errors
    ///
    /// `Config` when the tag is unknown.
    pub fn resolve(&self, tag: &str) -> RecordResult<&SchemeEntry> {
        self.get(tag)
            .ok_or_else(|| RecordError::Config(format!("unknown scheme tag {tag}")))
    }

    /// Whether `tag` is registered.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.entries.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Number of registered schemes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
