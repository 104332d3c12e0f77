//! Allocation and collection throughput on the fixed-page heap.

use conch_core::Elem;
use conch_gc::{Allocator, ScopedRoot, SimpleAllocator};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_chain_alloc(c: &mut Criterion) {
    c.bench_function("alloc_chain_4096", |b| {
        let alloc = SimpleAllocator::new(8192);
        b.iter(|| {
            let mut root = ScopedRoot::new(&alloc, Elem::null());
            for i in 0..4096u32 {
                let p = alloc
                    .new_cell(Elem::from_byte(i as u8), root.get(), &[])
                    .unwrap();
                root.set(Elem::from(p));
            }
            black_box(root.get());
        });
    });
}

fn bench_collect_half_live(c: &mut Criterion) {
    c.bench_function("collect_half_live_8192", |b| {
        let alloc = SimpleAllocator::new(8192);
        let mut root = ScopedRoot::new(&alloc, Elem::null());
        for i in 0..4096u32 {
            let p = alloc
                .new_cell(Elem::from_byte(i as u8), root.get(), &[])
                .unwrap();
            root.set(Elem::from(p));
        }
        b.iter(|| alloc.gc());
    });
}

criterion_group!(benches, bench_chain_alloc, bench_collect_half_live);
criterion_main!(benches);
