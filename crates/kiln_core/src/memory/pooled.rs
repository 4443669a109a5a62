//! # Pooled Objects
//!
//! Shared cells handed out by the [`ReferencePool`](super::ReferencePool).

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::ReferencePool;
use crate::error::CoreResult;

/// A recyclable object.
///
/// `clear` must return the object to the state `Default` would produce,
/// dropping every reference it holds to other objects.
pub trait Poolable: Default + Send + Sync + 'static {
    /// Resets the object before it goes back on the free list.
    fn clear(&mut self);
}

/// Shared handle to a pooled object.
///
/// Cloning is cheap and yields another handle to the same slot. Two handles
/// denote the same slot when [`Pooled::ptr_eq`] holds.
pub struct Pooled<T>(Arc<RwLock<T>>);

impl<T> Pooled<T> {
    /// Wraps a value in a fresh slot.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Locks the object for reading.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    /// Locks the object for writing.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    /// Address of the slot, comparable across handle types.
    #[inline]
    #[must_use]
    pub fn slot_ptr(&self) -> *const () {
        Arc::as_ptr(&self.0).cast::<()>()
    }

    /// Whether both handles point at the same slot.
    #[inline]
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Whether two handles of possibly different types point at the same slot.
    #[inline]
    #[must_use]
    pub fn same_slot<U>(&self, other: &Pooled<U>) -> bool {
        std::ptr::eq(self.slot_ptr(), other.slot_ptr())
    }

    /// Number of live handles to this slot.
    #[inline]
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl<T> Clone for Pooled<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(value) => f.debug_tuple("Pooled").field(&*value).finish(),
            None => f.write_str("Pooled(<locked>)"),
        }
    }
}

/// Type-erased pooled object, used where the concrete type is only known at runtime.
pub trait AnyPooled: Send + Sync {
    /// `TypeId` of the pooled type (not of the handle).
    fn pooled_type_id(&self) -> TypeId;

    /// Name of the pooled type, for diagnostics.
    fn pooled_type_name(&self) -> &'static str;

    /// Converts into `Box<dyn Any>` holding the concrete [`Pooled<T>`].
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

    /// Releases the object into the collection of its own type.
    ///
    /// # Errors
    ///
    /// Fails like [`ReferencePool::release`].
    fn release_to(self: Box<Self>, pool: &ReferencePool) -> CoreResult<()>;
}

impl<T: Poolable> AnyPooled for Pooled<T> {
    fn pooled_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn pooled_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn release_to(self: Box<Self>, pool: &ReferencePool) -> CoreResult<()> {
        pool.release(*self)
    }
}
