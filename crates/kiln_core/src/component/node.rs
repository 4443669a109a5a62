//! # Ownership Nodes
//!
//! The parent/child bookkeeping every component embeds.

use std::any::{type_name, Any, TypeId};
use std::fmt;

use indexmap::IndexMap;

use crate::error::CoreResult;
use crate::id::{Id, Identified};
use crate::memory::{Poolable, Pooled, ReferencePool};

/// A pooled object that can own and be owned by other components.
///
/// Implementors embed a [`Node`] and must call [`Node::clear`] from
/// [`Poolable::clear`].
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Weapon { node: Node, damage: u32 }
///
/// impl Identified for Weapon { fn id(&self) -> Id { self.node.id() } }
/// impl Poolable for Weapon {
///     fn clear(&mut self) { self.node.clear(); self.damage = 0; }
/// }
/// impl Component for Weapon {
///     fn node(&self) -> &Node { &self.node }
///     fn node_mut(&mut self) -> &mut Node { &mut self.node }
/// }
/// ```
pub trait Component: Poolable + Identified {
    /// Ownership bookkeeping.
    fn node(&self) -> &Node;

    /// Mutable ownership bookkeeping.
    fn node_mut(&mut self) -> &mut Node;
}

/// Initialization hook run right after a component joins the tree.
///
/// Arguments are passed as a tuple: `()`, `(A,)`, `(A, B)` up to
/// `(A, B, C, D)`.
pub trait Awake<Args = ()>: Component {
    /// Initializes the component.
    fn awake(&mut self, args: Args);
}

/// Type-erased child entry stored in a parent's [`Node`].
pub trait ComponentSlot: Send + Sync {
    /// Runtime type of the component.
    fn component_type_id(&self) -> TypeId;

    /// Name of the component type, for diagnostics.
    fn component_type_name(&self) -> &'static str;

    /// The concrete [`Pooled<T>`] behind this slot.
    fn as_any(&self) -> &dyn Any;

    /// Whether the pooled slot at `target` is this component or sits anywhere
    /// below it.
    fn subtree_contains(&self, target: *const ()) -> bool;

    /// Releases the component and its whole subtree, leaves first.
    ///
    /// # Errors
    ///
    /// The first pool error met; the rest of the subtree is still released.
    fn release_tree(self: Box<Self>, pool: &ReferencePool) -> CoreResult<()>;
}

impl<T: Component> ComponentSlot for Pooled<T> {
    fn component_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn component_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn subtree_contains(&self, target: *const ()) -> bool {
        std::ptr::eq(self.slot_ptr(), target)
            || self
                .read()
                .node()
                .children
                .values()
                .any(|child| child.subtree_contains(target))
    }

    fn release_tree(self: Box<Self>, pool: &ReferencePool) -> CoreResult<()> {
        let children = std::mem::take(&mut self.write().node_mut().children);
        let mut result = Ok(());
        for (_, child) in children {
            let released = child.release_tree(pool);
            if result.is_ok() {
                result = released;
            }
        }
        let released = pool.release(*self);
        result.and(released)
    }
}

/// Identity, parent link and owned children of a component.
#[derive(Default)]
pub struct Node {
    pub(crate) id: Id,
    pub(crate) parent: Option<Id>,
    pub(crate) children: IndexMap<Id, Box<dyn ComponentSlot>>,
}

impl Node {
    /// Identifier assigned when the component joined the tree. `0` while pooled.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> Id {
        self.id
    }

    /// Identifier of the owning component.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<Id> {
        self.parent
    }

    /// Number of direct children.
    #[inline]
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Identifiers of direct children, in attach order.
    pub fn child_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.children.keys().copied()
    }

    /// Whether a direct child with this identifier exists.
    #[must_use]
    pub fn contains(&self, id: Id) -> bool {
        self.children.contains_key(&id)
    }

    /// Forgets identity, parent and children.
    ///
    /// Children still attached here are dropped, not released. Remove them
    /// through the tree API first if they should go back to the pool.
    pub fn clear(&mut self) {
        self.id = 0;
        self.parent = None;
        self.children.clear();
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish()
    }
}
