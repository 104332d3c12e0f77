//! Iterative printer for cell graphs.
//!
//! Nesting depth becomes entries on an explicit stack of pending
//! tails, never native stack frames. Each pending tail remembers how
//! many brackets remain open for it; flat mode elides the brackets of
//! right-nested tails, deep mode closes every one.
//!
//! The printer allocates nothing on the heap it prints from, so it can
//! run at any point without disturbing the collector.

use std::fmt::{self, Write};

use conch_core::Elem;
use smallvec::SmallVec;

/// How right-nested tails are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintMode {
    /// `[a [b c]]` prints as `[a b c]`: the classical list-tail
    /// elision.
    #[default]
    Flat,
    /// Every cell gets its own brackets: `[a [b c]]`.
    Deep,
}

/// A pending right tail and the number of brackets it still owes.
#[derive(Clone, Copy)]
struct PendingTail {
    elem: Elem,
    len: usize,
}

/// Formatter for the external notation.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    mode: PrintMode,
}

impl Printer {
    /// A printer in the given mode.
    #[must_use]
    pub fn new(mode: PrintMode) -> Self {
        Self { mode }
    }

    /// Render `elem` into `out`.
    ///
    /// Byte atoms print bare; cell graphs print bracketed. Null prints
    /// as the literal token `<null>`, which only appears when a client
    /// has placed null somewhere the reader never produces it.
    pub fn write(&self, out: &mut impl Write, elem: Elem) -> fmt::Result {
        if elem.is_byte() {
            return write!(out, "{}", elem.as_byte());
        }
        out.write_char('[')?;
        self.format(out, elem)?;
        out.write_char(']')
    }

    /// Render `elem` into a fresh string.
    #[must_use]
    pub fn render(&self, elem: Elem) -> String {
        let mut s = String::new();
        self.write(&mut s, elem)
            .expect("formatting to a String cannot fail");
        s
    }

    fn format(&self, out: &mut impl Write, start: Elem) -> fmt::Result {
        let deep = self.mode == PrintMode::Deep;
        let mut tails: SmallVec<[PendingTail; 16]> = SmallVec::new();
        let mut tail = PendingTail {
            elem: start,
            len: 0,
        };

        loop {
            if tail.elem.is_byte() || tail.elem.is_null() {
                if tail.elem.is_null() {
                    out.write_str("<null>")?;
                } else {
                    write!(out, "{}", tail.elem.as_byte())?;
                }
                if deep {
                    for _ in 0..tail.len {
                        out.write_char(']')?;
                    }
                }
                match tails.pop() {
                    None => return Ok(()),
                    Some(next) => {
                        out.write_str("] ")?;
                        tail = next;
                        if deep && tail.elem.is_pcell() {
                            out.write_char('[')?;
                        }
                    }
                }
            } else {
                let p = tail.elem.as_pcell();
                let (head, rest) = (p.head(), p.tail());
                if head.is_pcell() {
                    let len = if rest.is_pcell() { tail.len + 1 } else { tail.len };
                    tails.push(PendingTail { elem: rest, len });
                    out.write_char('[')?;
                    tail = PendingTail { elem: head, len: 0 };
                } else {
                    write!(out, "{} ", head.as_byte())?;
                    if rest.is_pcell() {
                        tail = PendingTail {
                            elem: rest,
                            len: tail.len + 1,
                        };
                        if deep {
                            out.write_char('[')?;
                        }
                    } else {
                        tail = PendingTail {
                            elem: rest,
                            len: tail.len,
                        };
                    }
                }
            }
        }
    }
}

/// Render in flat mode.
#[must_use]
pub fn flat_string(elem: Elem) -> String {
    Printer::new(PrintMode::Flat).render(elem)
}

/// Render in deep mode.
#[must_use]
pub fn deep_string(elem: Elem) -> String {
    Printer::new(PrintMode::Deep).render(elem)
}
