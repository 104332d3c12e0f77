//! # Conch Garbage Collector
//!
//! A fixed-capacity cell heap with precise, root-tracked mark-and-sweep
//! collection.
//!
//! # Architecture
//!
//! Two allocator strategies share one interface ([`Allocator`]):
//!
//! - [`TestAllocator`]: relocates every live cell on every single
//!   allocation. Any handle held across an allocation without being
//!   rooted immediately dangles, so missing roots surface in tests
//!   instead of shipping.
//!
//! - [`SimpleAllocator`]: a fixed page of cell slots threaded with a
//!   free list. Cells never move; collection rebuilds the free list
//!   from the unmarked slots.
//!
//! Both collectors mark from the same [`RootSet`]: a registry of
//! `Elem` locations outside the heap whose current values are treated
//! as live. Higher layers pin working values with [`ScopedRoot`] (or,
//! for call-transient values, the `extra_roots` argument of
//! [`Allocator::new_cell`]) and never touch the registry directly.
//!
//! # Safety
//!
//! The heap requires that:
//! - Every handle held across a call that may collect is reachable
//!   from a registered root or an `extra_roots` slot.
//! - Registered slots outlive their registration (the scoped handle
//!   guarantees this; manual registration must too).
//! - A single allocator instance stays on one thread.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

mod alloc;
mod handle;
mod roots;
mod simple_alloc;
mod stack;
mod stats;
mod test_alloc;
mod trace;

pub use alloc::Allocator;
pub use handle::ScopedRoot;
pub use roots::RootSet;
pub use simple_alloc::SimpleAllocator;
pub use stack::CellStack;
pub use stats::HeapStats;
pub use test_alloc::TestAllocator;
