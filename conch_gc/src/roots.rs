//! Root tracking.
//!
//! Roots are the starting points for tracing: addresses of `Elem`
//! storage outside the heap whose current values the collector must
//! treat as live. The set stores raw slot addresses; values are read
//! through them only at trace time, so a root may be rewritten freely
//! between collections.

use std::cell::RefCell;

use conch_core::Elem;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// A registered root slot. Hashes by address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct Slot(*mut Elem);

/// Registry of live `Elem` locations outside the heap.
///
/// Single-threaded; interior mutability lets the allocator register
/// temporaries while callers hold shared references to it.
#[derive(Default)]
pub struct RootSet {
    slots: RefCell<FxHashSet<Slot>>,
}

impl RootSet {
    /// Create an empty root set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a slot. Registering the same address twice is a
    /// programming error (checked in debug builds); registrations must
    /// come in balanced add/del pairs.
    pub fn add_root(&self, slot: *mut Elem) {
        let inserted = self.slots.borrow_mut().insert(Slot(slot));
        debug_assert!(inserted, "root {slot:p} registered twice");
    }

    /// Deregister a slot. Removing an unregistered address is a
    /// programming error (checked in debug builds).
    pub fn del_root(&self, slot: *mut Elem) {
        let removed = self.slots.borrow_mut().remove(&Slot(slot));
        debug_assert!(removed, "root {slot:p} was not registered");
    }

    /// Number of registered slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// True when no slots are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    /// Read the current value of every registered slot.
    ///
    /// Slot addresses are guaranteed valid by the registration
    /// contract: a slot outlives its registration.
    pub(crate) fn live_values(&self) -> Vec<Elem> {
        self.slots
            .borrow()
            .iter()
            .map(|s| unsafe { *s.0 })
            .collect()
    }

    /// Rewrite every slot currently holding `from` to hold `to`.
    /// Used by the shifting allocator while relocating a cell.
    pub(crate) fn forward(&self, from: Elem, to: Elem) {
        for s in self.slots.borrow().iter() {
            unsafe {
                if *s.0 == from {
                    *s.0 = to;
                }
            }
        }
    }
}

/// Scratch registration of call-transient roots.
///
/// `new_cell` pins its `head`/`tail` arguments and the caller's
/// `extra_roots` through one of these; `Drop` deregisters on every
/// exit path, error returns included.
pub(crate) struct TempRoots<'a> {
    roots: &'a RootSet,
    slots: SmallVec<[*mut Elem; 8]>,
}

impl<'a> TempRoots<'a> {
    pub(crate) fn new(roots: &'a RootSet) -> Self {
        Self {
            roots,
            slots: SmallVec::new(),
        }
    }

    /// Pin a local value for the rest of the call.
    pub(crate) fn pin(&mut self, value: &mut Elem) {
        self.pin_raw(value);
    }

    /// Pin a caller-supplied slot for the rest of the call.
    pub(crate) fn pin_raw(&mut self, slot: *mut Elem) {
        self.roots.add_root(slot);
        self.slots.push(slot);
    }
}

impl Drop for TempRoots<'_> {
    fn drop(&mut self) {
        for &slot in self.slots.iter().rev() {
            self.roots.del_root(slot);
        }
    }
}
