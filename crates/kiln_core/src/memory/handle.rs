//! # Generational Handles
//!
//! A handle remembers the identifier its object had when captured. Pooled
//! objects receive a fresh identifier every time they are reused, so a
//! mismatch means the slot now belongs to someone else.

use std::fmt;

use super::pooled::Pooled;
use crate::id::{Id, Identified};

/// Stale-safe reference to a pooled object.
///
/// # Example
///
/// ```rust,ignore
/// let mut target = Handle::from(&enemy);
/// // ... enemy is released and its slot reacquired for another entity ...
/// assert!(target.resolve().is_none());
/// ```
pub struct Handle<T> {
    target: Option<Pooled<T>>,
    id: Id,
}

impl<T: Identified> Handle<T> {
    /// Captures `target` with its current identifier.
    #[must_use]
    pub fn new(target: &Pooled<T>) -> Self {
        let id = target.read().id();
        Self {
            target: Some(target.clone()),
            id,
        }
    }

    /// A handle that resolves to nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self { target: None, id: 0 }
    }

    /// Identifier captured at construction.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> Id {
        self.id
    }

    /// Whether the captured object still carries the captured identifier.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|target| target.read().id() == self.id)
    }

    /// Returns the object if it is still the one that was captured.
    ///
    /// A stale handle drops its hold on the object and stays empty.
    pub fn resolve(&mut self) -> Option<&Pooled<T>> {
        if !self.is_alive() {
            self.target = None;
            return None;
        }
        self.target.as_ref()
    }

    /// Like [`Handle::resolve`], but returns an owned handle and never mutates.
    #[must_use]
    pub fn get(&self) -> Option<Pooled<T>> {
        if self.is_alive() {
            self.target.clone()
        } else {
            None
        }
    }
}

impl<T: Identified> From<&Pooled<T>> for Handle<T> {
    fn from(target: &Pooled<T>) -> Self {
        Self::new(target)
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            id: self.id,
        }
    }
}

impl<T: Identified> Default for Handle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("held", &self.target.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Poolable, ReferencePool};

    #[derive(Default)]
    struct Enemy {
        id: Id,
    }

    impl Identified for Enemy {
        fn id(&self) -> Id {
            self.id
        }
    }

    impl Poolable for Enemy {
        fn clear(&mut self) {
            self.id = 0;
        }
    }

    #[test]
    fn test_handle_resolves_live_object() {
        let pool = ReferencePool::new(true);
        let enemy = pool.acquire::<Enemy>();
        enemy.write().id = 11;

        let mut handle = Handle::from(&enemy);
        assert!(handle.resolve().is_some_and(|e| Pooled::ptr_eq(e, &enemy)));
        assert_eq!(handle.id(), 11);
    }

    #[test]
    fn test_handle_goes_stale_after_recycle() {
        let pool = ReferencePool::new(true);
        let enemy = pool.acquire::<Enemy>();
        enemy.write().id = 11;
        let mut handle = Handle::from(&enemy);

        pool.release(enemy).unwrap();
        let other = pool.acquire::<Enemy>();
        other.write().id = 12;

        assert!(handle.get().is_none());
        assert!(handle.resolve().is_none());
        // The hold is dropped: only `other` still points at the slot.
        assert_eq!(other.handle_count(), 1);
    }

    #[test]
    fn test_empty_handle() {
        let mut handle = Handle::<Enemy>::default();
        assert!(!handle.is_alive());
        assert!(handle.resolve().is_none());
    }
}
