//! The mark phase shared by both allocators.
//!
//! Marking is a depth-first walk over cell pointers with an explicit
//! work stack. Membership in the mark set is decided at push time, so
//! the stack never holds more than one entry per heap cell and cyclic
//! structures terminate.

use conch_core::{Elem, PCell};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// Compute the set of live cell addresses reachable from `seeds`.
pub(crate) fn mark_live(seeds: &[Elem]) -> FxHashSet<usize> {
    let mut live = FxHashSet::default();
    let mut work: SmallVec<[PCell; 64]> = SmallVec::new();

    let mut visit = |e: Elem, live: &mut FxHashSet<usize>, work: &mut SmallVec<[PCell; 64]>| {
        if e.is_pcell() && !e.is_null() {
            let p = e.as_pcell();
            if live.insert(p.addr()) {
                work.push(p);
            }
        }
    };

    for &seed in seeds {
        visit(seed, &mut live, &mut work);
    }
    while let Some(p) = work.pop() {
        visit(p.head(), &mut live, &mut work);
        visit(p.tail(), &mut live, &mut work);
    }
    live
}
