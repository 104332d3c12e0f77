//! # Conch Stream
//!
//! The external text format: a reader that parses bracketed byte
//! sequences into heap cells, and a printer that walks a cell graph
//! back out to text.
//!
//! Both directions are iterative. Nesting depth in the input or the
//! data never translates into native call-stack depth: the printer
//! keeps an explicit stack of pending tails, and the reader works in
//! two phases over collector-aware cell stacks.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod printer;
pub mod reader;

pub use cursor::Cursor;
pub use printer::{deep_string, flat_string, PrintMode, Printer};
pub use reader::{parse_one, Reader};
