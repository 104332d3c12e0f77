//! The shifting allocator.
//!
//! Purpose-built to make missing roots observable: on every single
//! allocation, every previously allocated cell is reallocated at a new
//! address, registered roots and interior cell fields are forwarded,
//! and the old storage is freed. A handle held across an allocation
//! without being rooted immediately goes stale, so root bugs fail in
//! the test suite instead of corrupting a long-lived heap.

use std::cell::RefCell;

use conch_core::{Cell, ConchError, Elem, PCell, Result};
use rustc_hash::FxHashSet;

use crate::alloc::Allocator;
use crate::roots::{RootSet, TempRoots};
use crate::stats::HeapStats;
use crate::trace;

/// Mutable heap state, kept behind one `RefCell`.
struct TestHeap {
    allocated: FxHashSet<*mut Cell>,
    gc_count: usize,
    stats: HeapStats,
}

/// An allocator that relocates the entire heap on every allocation.
pub struct TestAllocator {
    ncells: usize,
    roots: RootSet,
    heap: RefCell<TestHeap>,
}

impl TestAllocator {
    /// Create a heap with room for `ncells` cells.
    #[must_use]
    pub fn new(ncells: usize) -> Self {
        assert!(ncells > 0, "allocator must allocate at least one cell");
        Self {
            ncells,
            roots: RootSet::new(),
            heap: RefCell::new(TestHeap {
                allocated: FxHashSet::default(),
                gc_count: 0,
                stats: HeapStats::default(),
            }),
        }
    }

    /// True while `p` names a cell this allocator currently owns.
    /// Diagnostic hook for the root-detector tests.
    #[must_use]
    pub fn contains(&self, p: PCell) -> bool {
        self.heap.borrow().allocated.contains(&p.as_ptr())
    }

    /// Reallocate every live cell at a new address, forwarding
    /// registered roots and interior references, then free the old
    /// storage.
    fn shift(&self) {
        let snapshot: Vec<*mut Cell> = self.heap.borrow().allocated.iter().copied().collect();
        for old in snapshot {
            let moved = unsafe { *old };
            let new = Box::into_raw(Box::new(moved));
            let from = Elem::from(PCell::from_raw(old));
            let to = Elem::from(PCell::from_raw(new));
            {
                let mut heap = self.heap.borrow_mut();
                heap.allocated.remove(&old);
                heap.allocated.insert(new);
                for &q in heap.allocated.iter() {
                    unsafe {
                        if (*q).head == from {
                            (*q).head = to;
                        }
                        if (*q).tail == from {
                            (*q).tail = to;
                        }
                    }
                }
            }
            self.roots.forward(from, to);
            drop(unsafe { Box::from_raw(old) });
        }
    }

    /// Mark from the registered roots and free everything unmarked.
    fn collect_now(&self) {
        let live = trace::mark_live(&self.roots.live_values());
        let mut heap = self.heap.borrow_mut();
        let before = heap.allocated.len();
        let dead: Vec<*mut Cell> = heap
            .allocated
            .iter()
            .copied()
            .filter(|&p| !live.contains(&(p as usize)))
            .collect();
        for p in dead {
            heap.allocated.remove(&p);
            drop(unsafe { Box::from_raw(p) });
        }
        heap.gc_count += 1;
        heap.stats.collections += 1;
        heap.stats.freed_by_last_gc = before - heap.allocated.len();
    }
}

impl Allocator for TestAllocator {
    fn new_cell(&self, mut head: Elem, mut tail: Elem, extra_roots: &[*mut Elem]) -> Result<PCell> {
        let mut temps = TempRoots::new(&self.roots);
        temps.pin(&mut head);
        temps.pin(&mut tail);
        for &slot in extra_roots {
            temps.pin_raw(slot);
        }

        if self.heap.borrow().allocated.len() == self.ncells {
            self.collect_now();
            if self.heap.borrow().allocated.len() == self.ncells {
                return Err(ConchError::OutOfMemory);
            }
        }

        let raw = Box::into_raw(Box::new(Cell::new(head, tail)));
        {
            let mut heap = self.heap.borrow_mut();
            heap.allocated.insert(raw);
            heap.stats.cells_allocated += 1;
        }
        let mut e = Elem::from(PCell::from_raw(raw));
        temps.pin(&mut e);

        self.shift();

        if self.heap.borrow().allocated.len() == self.ncells {
            self.collect_now();
        }

        Ok(e.as_pcell())
    }

    fn gc(&self) {
        self.collect_now();
    }

    fn gc_count(&self) -> usize {
        self.heap.borrow().gc_count
    }

    fn num_allocated(&self) -> usize {
        self.heap.borrow().allocated.len()
    }

    fn capacity(&self) -> usize {
        self.ncells
    }

    fn roots(&self) -> &RootSet {
        &self.roots
    }

    fn stats(&self) -> HeapStats {
        self.heap.borrow().stats
    }
}

impl Drop for TestAllocator {
    fn drop(&mut self) {
        for &p in self.heap.borrow().allocated.iter() {
            drop(unsafe { Box::from_raw(p) });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::ScopedRoot;

    fn byte(b: u8) -> Elem {
        Elem::from_byte(b)
    }

    #[test]
    fn test_fresh_allocator() {
        let alloc = TestAllocator::new(4);
        assert_eq!(alloc.num_allocated(), 0);
        assert_eq!(alloc.gc_count(), 0);
        assert_eq!(alloc.capacity(), 4);
    }

    #[test]
    fn test_new_cell_contents() {
        let alloc = TestAllocator::new(4);
        let p = alloc.new_cell(byte(1), byte(2), &[]).unwrap();
        assert_eq!(p.head(), byte(1));
        assert_eq!(p.tail(), byte(2));
        assert_eq!(alloc.num_allocated(), 1);
        assert!(alloc.contains(p));
    }

    #[test]
    fn test_every_allocation_moves_every_cell() {
        let alloc = TestAllocator::new(8);
        let mut root = ScopedRoot::new(&alloc, Elem::null());
        let first = alloc.new_cell(byte(1), byte(2), &[]).unwrap();
        root.set(Elem::from(first));

        let _second = alloc.new_cell(byte(3), byte(4), &[]).unwrap();

        // The rooted handle was forwarded to a fresh address; the raw
        // copy captured before the allocation is stale.
        assert_ne!(root.get(), Elem::from(first));
        assert!(alloc.contains(root.pcell()));
        assert_eq!(root.pcell().head(), byte(1));
        assert_eq!(root.pcell().tail(), byte(2));
    }

    #[test]
    fn test_extra_roots_are_forwarded() {
        let alloc = TestAllocator::new(8);
        let p = alloc.new_cell(byte(1), byte(2), &[]).unwrap();
        let mut local = Elem::from(p);

        let _q = alloc.new_cell(byte(3), byte(4), &[&mut local]).unwrap();

        assert_ne!(local, Elem::from(p));
        assert!(alloc.contains(local.as_pcell()));
        assert_eq!(local.as_pcell().head(), byte(1));
    }

    #[test]
    fn test_gc_frees_unrooted() {
        let alloc = TestAllocator::new(8);
        for b in 0..5 {
            alloc.new_cell(byte(b), byte(b), &[]).unwrap();
        }
        assert_eq!(alloc.num_allocated(), 5);

        alloc.gc();
        assert_eq!(alloc.num_allocated(), 0);
        assert_eq!(alloc.gc_count(), 1);
    }

    #[test]
    fn test_gc_keeps_rooted_chain() {
        let alloc = TestAllocator::new(8);
        let mut root = ScopedRoot::new(&alloc, Elem::null());
        for b in 0..3 {
            let p = alloc.new_cell(byte(b), root.get(), &[]).unwrap();
            root.set(Elem::from(p));
        }
        alloc.gc();
        assert_eq!(alloc.num_allocated(), 3);

        // Chain contents intact, newest first.
        let mut e = root.get();
        for b in (0..3).rev() {
            let p = e.as_pcell();
            assert_eq!(p.head(), byte(b));
            e = p.tail();
        }
        assert!(e.is_null());
    }

    #[test]
    fn test_full_heap_collects_then_reuses() {
        // One-cell heap: dropping the only reference lets the next
        // allocation succeed after an implicit collection.
        let alloc = TestAllocator::new(1);
        let _stale = alloc.new_cell(byte(0), byte(0), &[]).unwrap();
        let p = alloc.new_cell(byte(7), byte(8), &[]).unwrap();
        assert_eq!(p.head(), byte(7));
        assert_eq!(alloc.num_allocated(), 1);
        assert!(alloc.gc_count() >= 1);
    }

    #[test]
    fn test_out_of_memory_when_all_rooted() {
        let alloc = TestAllocator::new(2);
        let mut r1 = ScopedRoot::new(&alloc, Elem::null());
        let mut r2 = ScopedRoot::new(&alloc, Elem::null());
        r1.set(Elem::from(alloc.new_cell(byte(1), byte(1), &[]).unwrap()));
        r2.set(Elem::from(alloc.new_cell(byte(2), byte(2), &[]).unwrap()));

        let err = alloc.new_cell(byte(3), byte(3), &[]).unwrap_err();
        assert_eq!(err, ConchError::OutOfMemory);

        // The failed call left the rooted cells untouched.
        assert_eq!(alloc.num_allocated(), 2);
        assert_eq!(r1.pcell().head(), byte(1));
        assert_eq!(r2.pcell().head(), byte(2));
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let alloc = TestAllocator::new(4);
        let mut root = ScopedRoot::new(&alloc, Elem::null());
        for b in 0..20u8 {
            // Keep a two-cell chain alive, let the rest die.
            if b % 3 == 0 {
                root.set(Elem::null());
            }
            let p = alloc.new_cell(byte(b), root.get(), &[]).unwrap();
            root.set(Elem::from(p));
            assert!(alloc.num_allocated() <= alloc.capacity());
        }
    }

    #[test]
    fn test_gc_count_monotone() {
        let alloc = TestAllocator::new(4);
        let mut last = alloc.gc_count();
        for _ in 0..5 {
            alloc.gc();
            let now = alloc.gc_count();
            assert!(now > last);
            last = now;
        }
    }

    #[test]
    fn test_stats_track_churn() {
        let alloc = TestAllocator::new(8);
        for b in 0..6 {
            alloc.new_cell(byte(b), byte(b), &[]).unwrap();
        }
        alloc.gc();
        let stats = alloc.stats();
        assert_eq!(stats.cells_allocated, 6);
        assert!(stats.collections >= 1);
        assert_eq!(stats.freed_by_last_gc, 6);
    }
}
