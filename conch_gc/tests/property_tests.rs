//! Property-based tests for the cell heap.
//!
//! Random interleavings of allocation, collection, and root dropping
//! are replayed against a shadow model; every rooted value must keep
//! dereferencing to the content it was written with.

use conch_core::{ConchError, Elem};
use conch_gc::{Allocator, ScopedRoot, SimpleAllocator, TestAllocator};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    /// Cons a byte onto the rooted chain.
    Push(u8),
    /// Force a collection.
    Gc,
    /// Drop the chain root, turning the whole chain into garbage.
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => any::<u8>().prop_map(Op::Push),
        2 => Just(Op::Gc),
        1 => Just(Op::Clear),
    ]
}

fn run_ops<A: Allocator>(alloc: &A, ops: &[Op]) {
    let mut shadow: Vec<u8> = Vec::new();
    let mut chain = ScopedRoot::new(alloc, Elem::null());

    for op in ops {
        match op {
            Op::Push(b) => {
                let result = alloc.new_cell(Elem::from_byte(*b), chain.get(), &[]);
                if shadow.len() == alloc.capacity() {
                    // Everything is rooted: collection cannot help.
                    assert_eq!(result.unwrap_err(), ConchError::OutOfMemory);
                } else {
                    chain.set(Elem::from(result.unwrap()));
                    shadow.push(*b);
                }
            }
            Op::Gc => alloc.gc(),
            Op::Clear => {
                chain.set(Elem::null());
                shadow.clear();
            }
        }

        // Capacity invariant holds at every step.
        assert!(alloc.num_allocated() <= alloc.capacity());

        // Root soundness: the rooted chain spells out the shadow.
        let mut e = chain.get();
        for &b in shadow.iter().rev() {
            let p = e.as_pcell();
            assert_eq!(p.head().as_byte(), b);
            e = p.tail();
        }
        assert!(e.is_null());
    }

    // Collector liveness: after a final collection only the rooted
    // chain remains.
    alloc.gc();
    assert_eq!(alloc.num_allocated(), shadow.len());
}

proptest! {
    #[test]
    fn root_soundness_under_shifting(ops in prop::collection::vec(op_strategy(), 1..80)) {
        run_ops(&TestAllocator::new(48), &ops);
    }

    #[test]
    fn root_soundness_on_fixed_page(ops in prop::collection::vec(op_strategy(), 1..200)) {
        run_ops(&SimpleAllocator::new(48), &ops);
    }

    #[test]
    fn gc_count_is_monotone(rounds in 1usize..20) {
        let alloc = SimpleAllocator::new(8);
        let mut last = alloc.gc_count();
        for _ in 0..rounds {
            alloc.gc();
            prop_assert!(alloc.gc_count() > last);
            last = alloc.gc_count();
        }
    }
}
