//! Scoped root handles.
//!
//! A [`ScopedRoot`] is the convention higher layers use to keep a
//! working value alive across allocation points: construction
//! registers the handle's slot with the allocator's root set,
//! `Drop` deregisters it on every exit path, unwinds included.
//!
//! The slot is boxed so its address stays stable when the handle
//! itself is moved.

use conch_core::{Elem, PCell};

use crate::alloc::Allocator;

/// A rooted `Elem` slot tied to an allocator for its lifetime.
///
/// The collector reads the slot's current value at trace time, and the
/// shifting allocator rewrites it in place when the referenced cell
/// relocates, so reads through [`ScopedRoot::get`] are always current.
pub struct ScopedRoot<'a, A: Allocator + ?Sized> {
    alloc: &'a A,
    slot: Box<Elem>,
}

impl<'a, A: Allocator + ?Sized> ScopedRoot<'a, A> {
    /// Root `value` for the lifetime of the handle.
    pub fn new(alloc: &'a A, value: Elem) -> Self {
        let mut slot = Box::new(value);
        alloc.roots().add_root(&mut *slot);
        Self { alloc, slot }
    }

    /// The current (collector-maintained) value.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Elem {
        *self.slot
    }

    /// Replace the rooted value.
    #[inline]
    pub fn set(&mut self, value: Elem) {
        *self.slot = value;
    }

    /// The current value as a cell handle.
    #[inline]
    #[must_use]
    pub fn pcell(&self) -> PCell {
        self.get().as_pcell()
    }

    /// The allocator this handle is registered with.
    #[inline]
    #[must_use]
    pub fn allocator(&self) -> &'a A {
        self.alloc
    }
}

impl<A: Allocator + ?Sized> Clone for ScopedRoot<'_, A> {
    /// A copy registers its own slot, so both handles keep the value
    /// alive independently.
    fn clone(&self) -> Self {
        Self::new(self.alloc, self.get())
    }
}

impl<A: Allocator + ?Sized> Drop for ScopedRoot<'_, A> {
    fn drop(&mut self) {
        self.alloc.roots().del_root(&mut *self.slot);
    }
}

impl<A: Allocator + ?Sized> std::fmt::Debug for ScopedRoot<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScopedRoot({:?})", self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_alloc::TestAllocator;

    #[test]
    fn test_registers_and_deregisters() {
        let alloc = TestAllocator::new(8);
        {
            let root = ScopedRoot::new(&alloc, Elem::from_byte(1));
            assert_eq!(alloc.roots().len(), 1);
            assert_eq!(root.get(), Elem::from_byte(1));
        }
        assert!(alloc.roots().is_empty());
    }

    #[test]
    fn test_clone_registers_second_slot() {
        let alloc = TestAllocator::new(8);
        let root = ScopedRoot::new(&alloc, Elem::from_byte(2));
        let copy = root.clone();
        assert_eq!(alloc.roots().len(), 2);
        assert_eq!(copy.get(), root.get());
        drop(root);
        assert_eq!(alloc.roots().len(), 1);
        drop(copy);
        assert!(alloc.roots().is_empty());
    }

    #[test]
    fn test_survives_moves() {
        let alloc = TestAllocator::new(8);
        let root = ScopedRoot::new(&alloc, Elem::from_byte(3));
        let moved = root;
        assert_eq!(moved.get(), Elem::from_byte(3));
        assert_eq!(alloc.roots().len(), 1);
    }
}
