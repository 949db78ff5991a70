use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

/// A single-threaded, reference-counted resource with interior mutability.
///
/// The world keeps every resident chunk in an `StResource`. Iterators clone the
/// handle of the chunk they are positioned in, which pins it: the store never
/// evicts a chunk whose handle is held elsewhere. The clone is dropped as soon
/// as the iterator moves on, so pinning lasts exactly as long as the position.
///
/// # Type Parameters
/// - `T`: The type of the contained resource
///
/// # Examples
///
/// ```
/// use voxel_world::core::StResource;
///
/// let resource = StResource::new(vec![1, 2, 3]);
/// let pinned = resource.clone();
///
/// // All clones share the same underlying data
/// pinned.get_mut().push(4);
/// assert_eq!(resource.get().len(), 4);
/// assert!(resource.is_shared());
///
/// drop(pinned);
/// assert!(!resource.is_shared());
/// ```
///
/// # Panics
/// - `get_mut` panics while any `get` guard is alive, and vice versa
///
/// # Performance Considerations
/// - No atomic reference counting; not usable across thread boundaries
pub struct StResource<T> {
    resource: Rc<RefCell<T>>,
}

impl<T> StResource<T> {
    /// Creates a new `StResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Rc::new(RefCell::new(resource)),
        }
    }

    /// Returns a guard that allows reading the contained value.
    ///
    /// # Panics
    /// Panics if a mutable guard is currently held.
    pub fn get(&self) -> Ref<'_, T> {
        self.resource.borrow()
    }

    /// Returns a guard that allows modifying the contained value.
    ///
    /// # Panics
    /// Panics if any other guard is currently held.
    pub fn get_mut(&self) -> RefMut<'_, T> {
        self.resource.borrow_mut()
    }

    /// Number of live handles to this resource, including `self`.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.resource)
    }

    /// Whether another handle to this resource is alive.
    pub fn is_shared(&self) -> bool {
        self.handle_count() > 1
    }

    /// Whether two handles point at the same resource.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.resource, &other.resource)
    }
}

impl<T> Clone for StResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_and_count() {
        let a = StResource::new(5);
        assert_eq!(a.handle_count(), 1);
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        *b.get_mut() += 1;
        assert_eq!(*a.get(), 6);
        assert_eq!(a.handle_count(), 2);
        drop(b);
        assert!(!a.is_shared());
    }
}
