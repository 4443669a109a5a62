//! # Reference Pool
//!
//! Per-type free lists for objects that are frequently acquired and released.
//!
//! The directory of collections sits behind one lock that is only taken on
//! first use of a type; each collection then has its own lock, so traffic on
//! one type never contends with another.

use std::any::{type_name, Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::pooled::{AnyPooled, Poolable, Pooled};
use crate::error::{CoreError, CoreResult};

/// Diagnostic counters for one registered type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolInfo {
    /// Name of the pooled type.
    pub type_name: &'static str,
    /// Objects sitting in the free list.
    pub unused: usize,
    /// Objects handed out and not yet released.
    pub using: usize,
    /// Total acquisitions.
    pub acquired: usize,
    /// Total releases.
    pub released: usize,
    /// Total objects constructed for this type.
    pub added: usize,
    /// Total objects dropped from the free list.
    pub removed: usize,
}

impl fmt::Display for PoolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: unused {}, using {}, acquired {}, released {}, added {}, removed {}",
            self.type_name,
            self.unused,
            self.using,
            self.acquired,
            self.released,
            self.added,
            self.removed
        )
    }
}

struct CollectionState<T> {
    free: VecDeque<Pooled<T>>,
    using: usize,
    acquired: usize,
    released: usize,
    added: usize,
    removed: usize,
}

/// Free list for one concrete type.
struct ReferenceCollection<T> {
    state: Mutex<CollectionState<T>>,
}

impl<T: Poolable> ReferenceCollection<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(CollectionState {
                free: VecDeque::new(),
                using: 0,
                acquired: 0,
                released: 0,
                added: 0,
                removed: 0,
            }),
        }
    }

    fn acquire(&self) -> Pooled<T> {
        let mut state = self.state.lock();
        state.using += 1;
        state.acquired += 1;
        if let Some(object) = state.free.pop_front() {
            return object;
        }
        state.added += 1;
        drop(state);

        tracing::trace!(type_name = type_name::<T>(), "pool miss, constructing");
        Pooled::new(T::default())
    }

    fn release(&self, object: Pooled<T>, strict_check: bool) -> CoreResult<()> {
        // Clearing may drop nested handles, keep it outside the collection lock.
        object.write().clear();

        let mut state = self.state.lock();
        if strict_check && state.free.iter().any(|free| Pooled::ptr_eq(free, &object)) {
            return Err(CoreError::DoubleRelease {
                type_name: type_name::<T>(),
            });
        }
        state.free.push_back(object);
        state.released += 1;
        state.using = state.using.saturating_sub(1);
        Ok(())
    }

    fn add(&self, count: usize) {
        let mut state = self.state.lock();
        state.added += count;
        state
            .free
            .extend((0..count).map(|_| Pooled::new(T::default())));
    }

    fn remove(&self, count: usize) {
        let mut state = self.state.lock();
        let count = count.min(state.free.len());
        state.removed += count;
        state.free.drain(..count).for_each(drop);
    }
}

/// Object-safe view of a collection, used for diagnostics and bulk operations.
trait CollectionSlot: Send + Sync {
    fn info(&self) -> PoolInfo;
    fn remove_all(&self);
    fn release_erased(&self, object: Box<dyn AnyPooled>, strict_check: bool) -> CoreResult<()>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Poolable> CollectionSlot for ReferenceCollection<T> {
    fn info(&self) -> PoolInfo {
        let state = self.state.lock();
        PoolInfo {
            type_name: type_name::<T>(),
            unused: state.free.len(),
            using: state.using,
            acquired: state.acquired,
            released: state.released,
            added: state.added,
            removed: state.removed,
        }
    }

    fn remove_all(&self) {
        let mut state = self.state.lock();
        state.removed += state.free.len();
        state.free.clear();
    }

    fn release_erased(&self, object: Box<dyn AnyPooled>, strict_check: bool) -> CoreResult<()> {
        if object.pooled_type_id() != TypeId::of::<T>() {
            return Err(CoreError::TypeMismatch {
                expected: type_name::<T>(),
                actual: object.pooled_type_name(),
            });
        }
        let object = object
            .into_any()
            .downcast::<Pooled<T>>()
            .map_err(|_| CoreError::InvalidArgument(format!("not a {}", type_name::<T>())))?;
        self.release(*object, strict_check)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Acquire/release cache keyed by concrete type.
///
/// # Thread Safety
///
/// All methods take `&self`; the pool can be shared behind an `Arc` and used
/// from background work.
///
/// # Example
///
/// ```rust,ignore
/// let pool = ReferencePool::new(true);
///
/// let bullet = pool.acquire::<Bullet>();
/// bullet.write().speed = 20.0;
///
/// // Cleared, then back on the free list
/// pool.release(bullet)?;
/// ```
pub struct ReferencePool {
    collections: Mutex<HashMap<TypeId, Arc<dyn CollectionSlot>>>,
    strict_check: AtomicBool,
}

impl ReferencePool {
    /// Creates an empty pool.
    ///
    /// # Arguments
    ///
    /// * `strict_check` - Reject releases of objects already in the free list
    #[must_use]
    pub fn new(strict_check: bool) -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            strict_check: AtomicBool::new(strict_check),
        }
    }

    /// Whether double releases are detected.
    #[inline]
    #[must_use]
    pub fn strict_check(&self) -> bool {
        self.strict_check.load(Ordering::Relaxed)
    }

    /// Enables or disables double-release detection.
    pub fn set_strict_check(&self, enabled: bool) {
        self.strict_check.store(enabled, Ordering::Relaxed);
    }

    /// Number of registered types.
    #[must_use]
    pub fn count(&self) -> usize {
        self.collections.lock().len()
    }

    /// Counters for every registered type.
    #[must_use]
    pub fn infos(&self) -> Vec<PoolInfo> {
        let slots: Vec<_> = self.collections.lock().values().cloned().collect();
        slots.iter().map(|slot| slot.info()).collect()
    }

    /// Counters for one type, if it was ever used.
    #[must_use]
    pub fn info<T: Poolable>(&self) -> Option<PoolInfo> {
        let slot = self.collections.lock().get(&TypeId::of::<T>()).cloned()?;
        Some(slot.info())
    }

    /// Drops every collection and its free objects.
    pub fn clear_all(&self) {
        let slots: Vec<_> = self.collections.lock().drain().map(|(_, slot)| slot).collect();
        for slot in &slots {
            slot.remove_all();
        }
        tracing::debug!(types = slots.len(), "reference pool cleared");
    }

    /// Takes an object from the free list, constructing one when it is empty.
    ///
    /// Never returns an object that is currently handed out.
    pub fn acquire<T: Poolable>(&self) -> Pooled<T> {
        self.with_collection::<T, _>(ReferenceCollection::acquire)
    }

    /// Clears an object and puts it back on the free list.
    ///
    /// # Errors
    ///
    /// `DoubleRelease` when strict checking is on and the object is already
    /// in the free list.
    pub fn release<T: Poolable>(&self, object: Pooled<T>) -> CoreResult<()> {
        let strict = self.strict_check();
        self.with_collection::<T, _>(|collection| collection.release(object, strict))
    }

    /// Releases a type-erased object into the collection of its own type.
    ///
    /// # Errors
    ///
    /// Fails like [`ReferencePool::release`].
    pub fn release_any(&self, object: Box<dyn AnyPooled>) -> CoreResult<()> {
        object.release_to(self)
    }

    /// Releases a type-erased object into the collection registered for `T`.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` when the object is not a `T`; `DoubleRelease` as for
    /// [`ReferencePool::release`].
    pub fn release_as<T: Poolable>(&self, object: Box<dyn AnyPooled>) -> CoreResult<()> {
        let slot = self.slot::<T>();
        slot.release_erased(object, self.strict_check())
    }

    /// Pre-constructs `count` objects into the free list.
    pub fn add<T: Poolable>(&self, count: usize) {
        self.with_collection::<T, _>(|collection| collection.add(count));
    }

    /// Drops up to `count` objects from the free list.
    pub fn remove<T: Poolable>(&self, count: usize) {
        self.with_collection::<T, _>(|collection| collection.remove(count));
    }

    /// Drops every free object of type `T`.
    pub fn remove_all<T: Poolable>(&self) {
        self.slot::<T>().remove_all();
    }

    fn slot<T: Poolable>(&self) -> Arc<dyn CollectionSlot> {
        let mut collections = self.collections.lock();
        Arc::clone(collections.entry(TypeId::of::<T>()).or_insert_with(|| {
            tracing::debug!(type_name = type_name::<T>(), "registered pool collection");
            Arc::new(ReferenceCollection::<T>::new())
        }))
    }

    fn with_collection<T: Poolable, R>(&self, f: impl FnOnce(&ReferenceCollection<T>) -> R) -> R {
        let slot = self.slot::<T>();
        match slot.as_any().downcast_ref::<ReferenceCollection<T>>() {
            Some(collection) => f(collection),
            // Keyed by TypeId::of::<T>, so the slot always holds a collection of T.
            None => unreachable!("pool collection registered under the wrong type"),
        }
    }
}

impl Default for ReferencePool {
    fn default() -> Self {
        Self::new(false)
    }
}

impl fmt::Debug for ReferencePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferencePool")
            .field("types", &self.count())
            .field("strict_check", &self.strict_check())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug)]
    struct Particle {
        life: u32,
    }

    impl Poolable for Particle {
        fn clear(&mut self) {
            self.life = 0;
        }
    }

    #[derive(Default)]
    struct Packet;

    impl Poolable for Packet {
        fn clear(&mut self) {}
    }

    #[test]
    fn test_acquire_constructs_when_empty() {
        let pool = ReferencePool::new(false);
        let a = pool.acquire::<Particle>();
        let b = pool.acquire::<Particle>();

        assert!(!Pooled::ptr_eq(&a, &b));
        let info = pool.info::<Particle>().unwrap();
        assert_eq!(info.added, 2);
        assert_eq!(info.using, 2);
        assert_eq!(info.unused, 0);
    }

    #[test]
    fn test_release_clears_and_recycles() {
        let pool = ReferencePool::new(false);
        let a = pool.acquire::<Particle>();
        a.write().life = 9;
        let keep = a.clone();
        pool.release(a).unwrap();

        let b = pool.acquire::<Particle>();
        assert!(Pooled::ptr_eq(&keep, &b));
        assert_eq!(b.read().life, 0);

        let info = pool.info::<Particle>().unwrap();
        assert_eq!(info.acquired, 2);
        assert_eq!(info.released, 1);
        assert_eq!(info.added, 1);
    }

    #[test]
    fn test_strict_check_rejects_double_release() {
        let pool = ReferencePool::new(true);
        let a = pool.acquire::<Particle>();
        pool.release(a.clone()).unwrap();

        let err = pool.release(a).unwrap_err();
        assert!(matches!(err, CoreError::DoubleRelease { .. }));
        assert_eq!(pool.info::<Particle>().unwrap().unused, 1);
    }

    #[test]
    fn test_double_release_unchecked_corrupts_free_list() {
        let pool = ReferencePool::new(false);
        let a = pool.acquire::<Particle>();
        pool.release(a.clone()).unwrap();
        pool.release(a).unwrap();

        assert_eq!(pool.info::<Particle>().unwrap().unused, 2);
    }

    #[test]
    fn test_add_and_remove() {
        let pool = ReferencePool::default();
        pool.add::<Particle>(10);
        pool.remove::<Particle>(3);

        let info = pool.info::<Particle>().unwrap();
        assert_eq!(info.unused, 7);
        assert_eq!(info.added, 10);
        assert_eq!(info.removed, 3);

        pool.remove_all::<Particle>();
        assert_eq!(pool.info::<Particle>().unwrap().unused, 0);
    }

    #[test]
    fn test_release_as_rejects_other_type() {
        let pool = ReferencePool::default();
        let packet: Box<dyn AnyPooled> = Box::new(pool.acquire::<Packet>());

        let err = pool.release_as::<Particle>(packet).unwrap_err();
        assert!(matches!(err, CoreError::TypeMismatch { .. }));
    }

    #[test]
    fn test_release_any_routes_by_type() {
        let pool = ReferencePool::default();
        let packet: Box<dyn AnyPooled> = Box::new(pool.acquire::<Packet>());
        pool.release_any(packet).unwrap();

        assert_eq!(pool.info::<Packet>().unwrap().unused, 1);
    }

    #[test]
    fn test_clear_all_forgets_types() {
        let pool = ReferencePool::default();
        pool.add::<Particle>(2);
        pool.add::<Packet>(2);
        assert_eq!(pool.count(), 2);
        assert_eq!(pool.infos().len(), 2);

        pool.clear_all();
        assert_eq!(pool.count(), 0);
    }
}
