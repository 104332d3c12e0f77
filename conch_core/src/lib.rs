//! # Conch Core
//!
//! Value model shared by every layer of the Conch cell runtime.
//!
//! The whole runtime computes over exactly one kind of storage: the
//! two-field [`Cell`]. A [`Cell`] holds a pair of [`Elem`]s, and an
//! [`Elem`] is a single tagged machine word that is either a byte atom
//! in `0..=255` or a pointer to another cell ([`PCell`], possibly null).
//! Cells are created only by an allocator (see `conch_gc`) and are never
//! mutated after they are published to callers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod elem;
pub mod error;

pub use elem::{structural_eq, Cell, Elem, PCell};
pub use error::{ConchError, Result};

/// Crate version, surfaced by the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
