//! The allocator interface both heap strategies implement.

use conch_core::{Elem, PCell, Result};

use crate::roots::RootSet;
use crate::stats::HeapStats;

/// A fixed-capacity cell heap with precise collection.
///
/// # Contract for [`Allocator::new_cell`]
///
/// 1. `head` and `tail` must be valid at call time; the allocator pins
///    them for the duration of the call, so the cells they reference
///    survive (and are forwarded by) any internal collection.
/// 2. Every `Elem` location named in `extra_roots` is treated as an
///    additional root on top of the registered set for the duration of
///    the call; its current value stays live and, under the shifting
///    allocator, is rewritten in place when its cell moves.
/// 3. The returned handle is live at return time.
/// 4. Any *other* handle not transitively reachable from the
///    registered roots or `extra_roots` must be considered invalid
///    after the call: the shifting allocator has already relocated or
///    freed it.
pub trait Allocator {
    /// Allocate a cell holding `{head, tail}`.
    ///
    /// May run a collection first; fails with
    /// [`ConchError::OutOfMemory`](conch_core::ConchError::OutOfMemory)
    /// only if no free cell exists even after collecting.
    fn new_cell(&self, head: Elem, tail: Elem, extra_roots: &[*mut Elem]) -> Result<PCell>;

    /// Run a full collection now.
    fn gc(&self);

    /// Number of collections completed. Monotonically non-decreasing;
    /// zero on a fresh allocator.
    fn gc_count(&self) -> usize;

    /// Current number of live (non-free) cells.
    fn num_allocated(&self) -> usize;

    /// Fixed cell capacity chosen at construction.
    fn capacity(&self) -> usize;

    /// The registry of rooted `Elem` locations.
    fn roots(&self) -> &RootSet;

    /// Lifetime counters for this heap.
    fn stats(&self) -> HeapStats;
}
