//! # Component Helper
//!
//! Typed add/get/remove on a parent component.
//!
//! Write locks are taken one object at a time: the parent is never
//! write-locked while a child is. The cycle check in
//! [`ComponentHelper::attach_component`] read-locks one path from a node down
//! to a leaf at a time.

use std::any::type_name;

use super::node::{Awake, Component, ComponentSlot};
use crate::context::CoreContext;
use crate::error::{CoreError, CoreResult};
use crate::id::Id;
use crate::memory::{Pooled, ReferencePool};

/// Tree operations available on every pooled component.
pub trait ComponentHelper {
    /// Acquires a `T`, gives it a fresh identifier, attaches it as a child and
    /// runs its [`Awake`] hook with `args`.
    ///
    /// # Errors
    ///
    /// Same as [`ComponentHelper::add_component_with_id`].
    fn add_component<T, A>(&self, ctx: &CoreContext, args: A) -> CoreResult<Pooled<T>>
    where
        T: Awake<A>;

    /// Like [`ComponentHelper::add_component`] with an explicit identifier.
    /// An `id` of `0` means "generate one".
    ///
    /// # Errors
    ///
    /// `SelfParent` when `id` is the parent's own identifier and
    /// `DuplicateChild` when a child with `id` already exists. The acquired
    /// object goes back to the pool in both cases.
    fn add_component_with_id<T, A>(&self, ctx: &CoreContext, id: Id, args: A) -> CoreResult<Pooled<T>>
    where
        T: Awake<A>;

    /// First child of type `T`, in attach order.
    fn get_component<T: Component>(&self) -> Option<Pooled<T>>;

    /// All children of type `T`, in attach order. Empty when there are none.
    fn get_components<T: Component>(&self) -> Vec<Pooled<T>>;

    /// Child with identifier `id`, if it is a `T`.
    fn get_component_by_id<T: Component>(&self, id: Id) -> Option<Pooled<T>>;

    /// Detaches the child with identifier `id` and releases its subtree.
    ///
    /// Returns `false` when there was no such child.
    ///
    /// # Errors
    ///
    /// Pool errors raised while releasing.
    fn remove_component_by_id(&self, pool: &ReferencePool, id: Id) -> CoreResult<bool>;

    /// Detaches and releases every child of type `T`. Returns how many went.
    ///
    /// # Errors
    ///
    /// The first pool error met; all matching children are still released.
    fn remove_components<T: Component>(&self, pool: &ReferencePool) -> CoreResult<usize>;

    /// Detaches and releases `child` if it is owned here.
    ///
    /// # Errors
    ///
    /// Pool errors raised while releasing.
    fn remove_component_ref<T: Component>(&self, pool: &ReferencePool, child: &Pooled<T>) -> CoreResult<bool>;

    /// Number of direct children.
    fn child_count(&self) -> usize;

    /// Takes the child with identifier `id` out of the tree without releasing
    /// it, so it can be attached elsewhere.
    fn detach_component<T: Component>(&self, id: Id) -> Option<Pooled<T>>;

    /// Attaches a detached component as a child.
    ///
    /// # Errors
    ///
    /// `SelfParent` when `child` is this component, `AlreadyParented` when it
    /// has not been detached from its current parent, `Cycle` when this
    /// component sits inside `child`'s subtree and `DuplicateChild` when its
    /// identifier is taken here.
    fn attach_component<T: Component>(&self, child: &Pooled<T>) -> CoreResult<()>;
}

impl<P: Component> ComponentHelper for Pooled<P> {
    fn add_component<T, A>(&self, ctx: &CoreContext, args: A) -> CoreResult<Pooled<T>>
    where
        T: Awake<A>,
    {
        self.add_component_with_id(ctx, 0, args)
    }

    fn add_component_with_id<T, A>(&self, ctx: &CoreContext, id: Id, args: A) -> CoreResult<Pooled<T>>
    where
        T: Awake<A>,
    {
        let id = if id == 0 { ctx.ids().generate_id() } else { id };
        let parent_id = self.read().node().id;
        let child = ctx.pool().acquire::<T>();

        let rejected = if id == parent_id {
            Some(CoreError::SelfParent {
                type_name: type_name::<T>(),
                id,
            })
        } else if self.read().node().contains(id) {
            Some(CoreError::DuplicateChild {
                parent: parent_id,
                id,
            })
        } else {
            None
        };
        if let Some(err) = rejected {
            ctx.pool().release(child)?;
            return Err(err);
        }

        {
            let mut guard = child.write();
            let node = guard.node_mut();
            node.id = id;
            node.parent = Some(parent_id);
        }
        self.write()
            .node_mut()
            .children
            .insert(id, Box::new(child.clone()));
        child.write().awake(args);
        Ok(child)
    }

    fn get_component<T: Component>(&self) -> Option<Pooled<T>> {
        self.read()
            .node()
            .children
            .values()
            .find_map(|slot| slot.as_any().downcast_ref::<Pooled<T>>().cloned())
    }

    fn get_components<T: Component>(&self) -> Vec<Pooled<T>> {
        self.read()
            .node()
            .children
            .values()
            .filter_map(|slot| slot.as_any().downcast_ref::<Pooled<T>>().cloned())
            .collect()
    }

    fn get_component_by_id<T: Component>(&self, id: Id) -> Option<Pooled<T>> {
        self.read()
            .node()
            .children
            .get(&id)
            .and_then(|slot| slot.as_any().downcast_ref::<Pooled<T>>().cloned())
    }

    fn remove_component_by_id(&self, pool: &ReferencePool, id: Id) -> CoreResult<bool> {
        let removed = self.write().node_mut().children.shift_remove(&id);
        match removed {
            Some(slot) => {
                slot.release_tree(pool)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_components<T: Component>(&self, pool: &ReferencePool) -> CoreResult<usize> {
        let removed: Vec<Box<dyn ComponentSlot>> = {
            let mut parent = self.write();
            let children = &mut parent.node_mut().children;
            let ids: Vec<Id> = children
                .iter()
                .filter(|(_, slot)| slot.as_any().is::<Pooled<T>>())
                .map(|(id, _)| *id)
                .collect();
            ids.iter()
                .filter_map(|id| children.shift_remove(id))
                .collect()
        };

        let count = removed.len();
        let mut result = Ok(count);
        for slot in removed {
            if let Err(err) = slot.release_tree(pool) {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    fn remove_component_ref<T: Component>(&self, pool: &ReferencePool, child: &Pooled<T>) -> CoreResult<bool> {
        let id = child.read().node().id;
        let owned = self
            .read()
            .node()
            .children
            .get(&id)
            .and_then(|slot| slot.as_any().downcast_ref::<Pooled<T>>())
            .is_some_and(|slot| Pooled::ptr_eq(slot, child));
        if !owned {
            return Ok(false);
        }
        self.remove_component_by_id(pool, id)
    }

    fn child_count(&self) -> usize {
        self.read().node().child_count()
    }

    fn detach_component<T: Component>(&self, id: Id) -> Option<Pooled<T>> {
        let child = {
            let mut parent = self.write();
            let children = &mut parent.node_mut().children;
            let child = children
                .get(&id)?
                .as_any()
                .downcast_ref::<Pooled<T>>()?
                .clone();
            children.shift_remove(&id);
            child
        };
        child.write().node_mut().parent = None;
        Some(child)
    }

    fn attach_component<T: Component>(&self, child: &Pooled<T>) -> CoreResult<()> {
        let (child_id, existing) = {
            let child = child.read();
            (child.node().id, child.node().parent)
        };
        if self.same_slot(child) {
            return Err(CoreError::SelfParent {
                type_name: type_name::<T>(),
                id: child_id,
            });
        }

        let parent_id = self.read().node().id;
        if let Some(existing) = existing {
            return Err(CoreError::AlreadyParented {
                type_name: type_name::<T>(),
                id: child_id,
                attempted: parent_id,
                existing,
            });
        }
        if child.subtree_contains(self.slot_ptr()) {
            return Err(CoreError::Cycle {
                type_name: type_name::<T>(),
                id: child_id,
                parent: parent_id,
            });
        }

        {
            let mut parent = self.write();
            let children = &mut parent.node_mut().children;
            if children.contains_key(&child_id) {
                return Err(CoreError::DuplicateChild {
                    parent: parent_id,
                    id: child_id,
                });
            }
            children.insert(child_id, Box::new(child.clone()));
        }
        child.write().node_mut().parent = Some(parent_id);
        Ok(())
    }
}
