//! The production allocator: a fixed page of cell slots and a free
//! list threaded through them.
//!
//! Cells never move once allocated, so handles held across a
//! collection stay valid exactly when rooted. A free slot is
//! reinterpreted as [`FreeSlot`], whose first word points at the next
//! free slot; the overlay is possible because a free slot is exactly
//! one cell wide.

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::cell::RefCell;
use std::ptr;

use conch_core::{Cell, ConchError, Elem, PCell, Result};

use crate::alloc::Allocator;
use crate::roots::{RootSet, TempRoots};
use crate::stats::HeapStats;
use crate::trace;

/// A free slot, overlaid on unallocated cell storage.
#[repr(C)]
struct FreeSlot {
    next: *mut FreeSlot,
    _pad: usize,
}

const _: () = assert!(
    std::mem::size_of::<FreeSlot>() == std::mem::size_of::<Cell>(),
    "free slot must exactly overlay a cell"
);

/// The raw cell page. One allocation, cell-aligned, freed with the
/// allocator.
struct Page {
    base: *mut Cell,
    layout: Layout,
    ncells: usize,
}

impl Page {
    fn new(ncells: usize) -> Self {
        let layout = Layout::array::<Cell>(ncells).expect("page layout overflow");
        let base = unsafe { alloc_zeroed(layout) }.cast::<Cell>();
        if base.is_null() {
            handle_alloc_error(layout);
        }
        debug_assert!(
            base as usize % std::mem::align_of::<Cell>() == 0,
            "page not cell aligned"
        );
        Self {
            base,
            layout,
            ncells,
        }
    }

    #[inline]
    fn slot(&self, index: usize) -> *mut Cell {
        debug_assert!(index < self.ncells);
        unsafe { self.base.add(index) }
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        unsafe { dealloc(self.base.cast::<u8>(), self.layout) };
    }
}

/// Mutable heap state, kept behind one `RefCell`.
struct SimpleHeap {
    free_list: *mut FreeSlot,
    gc_count: usize,
    stats: HeapStats,
}

/// Fixed-page mark-sweep allocator. Cells are address-stable.
pub struct SimpleAllocator {
    ncells: usize,
    roots: RootSet,
    page: Page,
    heap: RefCell<SimpleHeap>,
}

impl SimpleAllocator {
    /// Create a heap with room for `ncells` cells.
    #[must_use]
    pub fn new(ncells: usize) -> Self {
        assert!(ncells > 0, "allocator must allocate at least one cell");
        let this = Self {
            ncells,
            roots: RootSet::new(),
            page: Page::new(ncells),
            heap: RefCell::new(SimpleHeap {
                free_list: ptr::null_mut(),
                gc_count: 0,
                stats: HeapStats::default(),
            }),
        };
        // The initial sweep threads every slot into the free list; it
        // is not an observable collection.
        this.collect_now();
        let mut heap = this.heap.borrow_mut();
        heap.gc_count = 0;
        heap.stats = HeapStats::default();
        drop(heap);
        this
    }

    /// Mark from the registered roots, then rebuild the free list from
    /// the unmarked slots in one pass over the page.
    fn collect_now(&self) {
        let live = trace::mark_live(&self.roots.live_values());
        let mut heap = self.heap.borrow_mut();
        let old_free = free_len(heap.free_list);

        let mut free: *mut FreeSlot = ptr::null_mut();
        let mut nfree = 0usize;
        for index in (0..self.ncells).rev() {
            let slot = self.page.slot(index);
            if !live.contains(&(slot as usize)) {
                let fs = slot.cast::<FreeSlot>();
                unsafe { ptr::write(fs, FreeSlot { next: free, _pad: 0 }) };
                free = fs;
                nfree += 1;
            }
        }

        heap.free_list = free;
        heap.gc_count += 1;
        heap.stats.collections += 1;
        heap.stats.freed_by_last_gc = nfree - old_free;
    }
}

/// Length of a free list.
fn free_len(mut slot: *mut FreeSlot) -> usize {
    let mut n = 0;
    while !slot.is_null() {
        slot = unsafe { (*slot).next };
        n += 1;
    }
    n
}

impl Allocator for SimpleAllocator {
    fn new_cell(&self, mut head: Elem, mut tail: Elem, extra_roots: &[*mut Elem]) -> Result<PCell> {
        let mut temps = TempRoots::new(&self.roots);
        temps.pin(&mut head);
        temps.pin(&mut tail);
        for &slot in extra_roots {
            temps.pin_raw(slot);
        }

        if self.heap.borrow().free_list.is_null() {
            self.collect_now();
        }

        let slot = {
            let mut heap = self.heap.borrow_mut();
            if heap.free_list.is_null() {
                return Err(ConchError::OutOfMemory);
            }
            let fs = heap.free_list;
            heap.free_list = unsafe { (*fs).next };
            heap.stats.cells_allocated += 1;
            fs.cast::<Cell>()
        };
        unsafe { ptr::write(slot, Cell::new(head, tail)) };
        let p = PCell::from_raw(slot);

        // The pop may have drained the list; collect eagerly so the
        // next allocation starts with whatever is reclaimable. The new
        // cell is pinned and address-stable.
        if self.heap.borrow().free_list.is_null() {
            let mut e = Elem::from(p);
            self.roots.add_root(&mut e);
            self.collect_now();
            self.roots.del_root(&mut e);
        }

        Ok(p)
    }

    fn gc(&self) {
        self.collect_now();
    }

    fn gc_count(&self) -> usize {
        self.heap.borrow().gc_count
    }

    fn num_allocated(&self) -> usize {
        self.ncells - free_len(self.heap.borrow().free_list)
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
