//! Iterative reader for the bracketed cell notation.
//!
//! ```text
//! elem  := byte | '[' elems ']'
//! elems := elem { ws elem }
//! byte  := decimal in [0, 255]
//! ```
//!
//! A sequence `[a b c]` is the right-nested chain `cons(a, cons(b, c))`;
//! every list therefore has at least two elements, and `[]` and `[x]`
//! are syntax errors.
//!
//! Parsing is two-phase so nesting depth never consumes native stack:
//!
//! 1. [`Reader::parse_elems`] matches brackets iteratively and builds
//!    each list *reversed*, keeping in-progress outer lists on a
//!    [`CellStack`].
//! 2. [`Reader::reverse_and_reduce`] walks the reversed spine and
//!    rebuilds it with correct orientation and nesting, again with
//!    explicit cell stacks.
//!
//! All working values live in scoped roots or cell stacks, so the
//! reader is safe on the shifting allocator: every intermediate cell is
//! forwarded under its feet and nothing dangles.

use conch_core::{ConchError, Elem, PCell, Result};
use conch_gc::{Allocator, CellStack, ScopedRoot};

use crate::cursor::Cursor;

/// Streaming parser producing cells on `alloc`.
pub struct Reader<'a, 's, A: Allocator + ?Sized> {
    alloc: &'a A,
    cursor: Cursor<'s>,
}

impl<'a, 's, A: Allocator + ?Sized> Reader<'a, 's, A> {
    /// A reader over `source`, allocating from `alloc`.
    pub fn new(alloc: &'a A, source: &'s str) -> Self {
        Self {
            alloc,
            cursor: Cursor::new(source),
        }
    }

    /// Parse one element.
    ///
    /// The returned value is unrooted; callers must pin it before the
    /// next allocation on `alloc`.
    pub fn read(&mut self) -> Result<Elem> {
        self.cursor.skip_whitespace();
        if self.cursor.is_eof() {
            return Err(ConchError::syntax("Unexpected end of input"));
        }
        let c = self.cursor.first();
        if c == '[' {
            self.cursor.bump();
            let reversed = self.parse_elems()?;
            let cell = self.reverse_and_reduce(reversed)?;
            Ok(Elem::from(cell))
        } else if c.is_ascii_digit() {
            Ok(Elem::from_byte(self.parse_byte()?))
        } else {
            Err(ConchError::syntax(format!("Unexpected '{c}'")))
        }
    }

    /// Require that only whitespace remains.
    pub fn expect_end(&mut self) -> Result<()> {
        self.cursor.skip_whitespace();
        if self.cursor.is_eof() {
            Ok(())
        } else {
            Err(ConchError::syntax(format!(
                "unexpected character after expression '{}'",
                self.cursor.first()
            )))
        }
    }

    /// Phase 1: consume up to the matching `]`, building every list
    /// reversed as it reads. In-progress outer lists wait on a cell
    /// stack, so only heap cells track the nesting depth.
    fn parse_elems(&mut self) -> Result<PCell> {
        let alloc = self.alloc;
        let mut tail = ScopedRoot::new(alloc, Elem::null());
        let mut tails = CellStack::new(alloc);

        loop {
            self.cursor.skip_whitespace();
            if self.cursor.is_eof() {
                return Err(ConchError::syntax_eos("Unexpected end of input"));
            }
            let c = self.cursor.first();
            match c {
                ']' => {
                    self.cursor.bump();
                    let done = tail.get();
                    if done.is_null() {
                        return Err(ConchError::syntax("Unexpected empty cell"));
                    }
                    if done.as_pcell().tail().is_null() {
                        return Err(ConchError::syntax("Unexpected singleton"));
                    }
                    match tails.pop() {
                        None => return Ok(done.as_pcell()),
                        Some(outer) => {
                            // The finished (still reversed) sublist
                            // becomes one element of the enclosing
                            // list.
                            tail.set(outer);
                            let cell = alloc.new_cell(done, tail.get(), &[])?;
                            tail.set(Elem::from(cell));
                        }
                    }
                }
                '[' => {
                    self.cursor.bump();
                    tails.push(tail.get())?;
                    tail.set(Elem::null());
                }
                c if c.is_ascii_digit() => {
                    let b = self.parse_byte()?;
                    let cell = alloc.new_cell(Elem::from_byte(b), tail.get(), &[])?;
                    tail.set(Elem::from(cell));
                }
                other => {
                    return Err(ConchError::syntax(format!("Unexpected '{other}'")));
                }
            }
        }
    }

    /// Phase 2: re-orient a reversed list (and every nested reversed
    /// list inside it) into the final right-nested chain.
    fn reverse_and_reduce(&mut self, reversed: PCell) -> Result<PCell> {
        let alloc = self.alloc;
        let mut p = ScopedRoot::new(alloc, Elem::from(reversed));
        let mut tail = ScopedRoot::new(alloc, Elem::null());
        let mut pcells = CellStack::new(alloc);
        let mut tails = CellStack::new(alloc);

        loop {
            if p.get().is_null() {
                if pcells.is_empty() {
                    break;
                }
                // A nested list is fully reduced in `tail`; resume the
                // enclosing spine with it as one element.
                debug_assert!(tail.get().is_pcell(), "reduced sublist must be a cell");
                let head = tail.get();
                p.set(pcells.pop().expect("spine stack underflow"));
                tail.set(tails.pop().expect("tail stack underflow"));
                if tail.get().is_null() {
                    tail.set(head);
                } else {
                    let cell = alloc.new_cell(head, tail.get(), &[])?;
                    tail.set(Elem::from(cell));
                }
            } else {
                let spine = p.get().as_pcell();
                debug_assert!(spine.tail().is_pcell(), "reversed spine must be cell-tailed");
                let head = spine.head();
                if head.is_pcell() {
                    // Descend into a nested reversed list, parking the
                    // rest of this spine and the chain built so far.
                    pcells.push(spine.tail())?;
                    tails.push(tail.get())?;
                    // The pushes may have relocated the heap; re-read
                    // through the root before descending.
                    p.set(p.get().as_pcell().head());
                    tail.set(Elem::null());
                } else {
                    if tail.get().is_null() {
                        tail.set(head);
                    } else {
                        let cell = alloc.new_cell(head, tail.get(), &[])?;
                        tail.set(Elem::from(cell));
                    }
                    p.set(p.get().as_pcell().tail());
                }
            }
        }

        debug_assert!(tails.is_empty(), "spine and tail stacks out of step");
        Ok(tail.get().as_pcell())
    }

    /// Parse a decimal byte literal at the cursor.
    fn parse_byte(&mut self) -> Result<u8> {
        let start = self.cursor.pos();
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let digits = self.cursor.slice_from(start);
        match digits.parse::<u32>() {
            Ok(value) if value < 256 => Ok(value as u8),
            _ => Err(ConchError::syntax("Malformed byte")),
        }
    }
}

/// Parse exactly one element from `input`, rejecting trailing text.
///
/// The returned value is unrooted; callers must pin it before the next
/// allocation on `alloc`.
pub fn parse_one<A: Allocator + ?Sized>(alloc: &A, input: &str) -> Result<Elem> {
    let mut reader = Reader::new(alloc, input);
    let elem = reader.read()?;
    reader.expect_end()?;
    Ok(elem)
}
