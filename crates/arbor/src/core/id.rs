use std::{fmt, hash, marker::PhantomData};

use slotmap::new_key_type;

use crate::{
    control::Control,
    error::Result,
    invalidate::{InvalidationReason, InvalidationReport},
    tree::Tree,
};

new_key_type! {
    /// Identifier of a node in a [`Tree`]. Ids are never reused, so a stale
    /// id fails lookups instead of reaching a different node.
    pub struct NodeId;
}

/// A node id that remembers its control type.
pub struct TypedId<T> {
    /// Untyped node identifier.
    id: NodeId,
    /// Marker for the control type.
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedId<T> {
    /// Wrap an untyped node identifier. The type is checked on access.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// The untyped identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl<T: Control> TypedId<T> {
    /// Borrow the control.
    pub fn get<'a>(&self, tree: &'a Tree) -> Result<&'a T> {
        tree.control::<T>(self.id)
    }

    /// Modify the control and invalidate its node.
    pub fn update<R>(
        &self,
        tree: &mut Tree,
        reason: InvalidationReason,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        tree.update::<T, R>(self.id, reason, f)
    }

    /// Invalidate the node.
    pub fn invalidate(&self, tree: &mut Tree, reason: InvalidationReason) -> InvalidationReport {
        tree.invalidate(self.id, reason)
    }
}

impl<T> fmt::Debug for TypedId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedId").field(&self.id).finish()
    }
}

impl<T> Clone for TypedId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedId<T> {}

impl<T> PartialEq for TypedId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for TypedId<T> {}

impl<T> hash::Hash for TypedId<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> From<TypedId<T>> for NodeId {
    fn from(value: TypedId<T>) -> Self {
        value.id
    }
}
