//! Contract tests run against both allocator strategies through the
//! `Allocator` trait, so the two heaps cannot drift apart.

use conch_core::{structural_eq, Elem};
use conch_gc::{Allocator, ScopedRoot, SimpleAllocator, TestAllocator};

fn byte(b: u8) -> Elem {
    Elem::from_byte(b)
}

/// Build `[0 [3 3] 2]`: cons(0, cons(cons(3, 3), 2)).
fn build_sample<A: Allocator>(alloc: &A) -> ScopedRoot<'_, A> {
    let mut root = ScopedRoot::new(alloc, Elem::null());

    let inner = alloc.new_cell(byte(3), byte(3), &[]).unwrap();
    root.set(Elem::from(inner));

    let mid = alloc.new_cell(root.get(), byte(2), &[]).unwrap();
    root.set(Elem::from(mid));

    let top = alloc.new_cell(byte(0), root.get(), &[]).unwrap();
    root.set(Elem::from(top));
    root
}

fn check_sample_shape(e: Elem) {
    let top = e.as_pcell();
    assert_eq!(top.head(), byte(0));
    let mid = top.tail().as_pcell();
    assert_eq!(mid.tail(), byte(2));
    let inner = mid.head().as_pcell();
    assert_eq!(inner.head(), byte(3));
    assert_eq!(inner.tail(), byte(3));
}

fn nested_tree_survives_collection<A: Allocator>(alloc: &A) {
    let root = build_sample(alloc);
    assert_eq!(alloc.num_allocated(), 3);

    alloc.gc();
    assert_eq!(alloc.num_allocated(), 3);
    check_sample_shape(root.get());
}

fn collection_reclaims_exactly_the_unrooted<A: Allocator>(alloc: &A) {
    let root = build_sample(alloc);
    // Unrooted garbage alongside the live tree.
    for b in 0..4 {
        alloc.new_cell(byte(b), byte(b), &[]).unwrap();
    }
    assert_eq!(alloc.num_allocated(), 7);

    alloc.gc();
    assert_eq!(alloc.num_allocated(), 3);
    check_sample_shape(root.get());
}

fn clones_of_a_root_pin_independently<A: Allocator>(alloc: &A) {
    let root = build_sample(alloc);
    let copy = root.clone();
    drop(root);

    alloc.gc();
    assert_eq!(alloc.num_allocated(), 3);
    check_sample_shape(copy.get());
}

fn shared_substructure_is_counted_once<A: Allocator>(alloc: &A) {
    let mut root = ScopedRoot::new(alloc, Elem::null());
    let shared = alloc.new_cell(byte(3), byte(3), &[]).unwrap();
    root.set(Elem::from(shared));
    let top = alloc.new_cell(root.get(), root.get(), &[]).unwrap();
    root.set(Elem::from(top));

    alloc.gc();
    assert_eq!(alloc.num_allocated(), 2);

    let p = root.pcell();
    assert_eq!(p.head(), p.tail());
    assert!(structural_eq(p.head(), p.tail()));
}

macro_rules! contract_tests {
    ($module:ident, $make:expr) => {
        mod $module {
            use super::*;

            #[test]
            fn test_nested_tree_survives_collection() {
                nested_tree_survives_collection(&$make);
            }

            #[test]
            fn test_collection_reclaims_exactly_the_unrooted() {
                collection_reclaims_exactly_the_unrooted(&$make);
            }

            #[test]
            fn test_clones_of_a_root_pin_independently() {
                clones_of_a_root_pin_independently(&$make);
            }

            #[test]
            fn test_shared_substructure_is_counted_once() {
                shared_substructure_is_counted_once(&$make);
            }
        }
    };
}

contract_tests!(shifting, TestAllocator::new(16));
contract_tests!(page, SimpleAllocator::new(16));
