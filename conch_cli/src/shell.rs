//! The interactive shell.
//!
//! Lines accumulate in a buffer until they form a syntactically
//! complete expression: an incomplete parse surfaces as the
//! recoverable end-of-input error, which switches the prompt to
//! `... ` instead of reporting anything. A line starting with `:` is
//! a command.
//!
//! [`Shell::eval_line`] is the whole brain and is plain string in,
//! [`Response`] out, so tests drive it without a terminal.

use conch_core::ConchError;
use conch_gc::Allocator;
use conch_stream::{PrintMode, Printer, Reader};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Primary and continuation prompts.
const PROMPT: &str = ">>> ";
const PROMPT_MORE: &str = "... ";

/// What a processed buffer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Blank input; nothing to show.
    Empty,
    /// The buffer is an incomplete expression; keep accumulating.
    More,
    /// End the session.
    Quit,
    /// Rendering of a parsed expression.
    Value(String),
    /// Output of a `:`-command.
    Info(String),
}

/// Shell state: one allocator and the current print mode.
pub struct Shell<'a> {
    alloc: &'a dyn Allocator,
    mode: PrintMode,
}

impl<'a> Shell<'a> {
    /// A shell evaluating on `alloc`.
    pub fn new(alloc: &'a dyn Allocator, mode: PrintMode) -> Self {
        Self { alloc, mode }
    }

    /// Process one accumulated input buffer.
    pub fn eval_line(&mut self, input: &str) -> conch_core::Result<Response> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Response::Empty);
        }
        if let Some(rest) = trimmed.strip_prefix(':') {
            return self.command(rest);
        }

        let mut reader = Reader::new(self.alloc, input);
        let elem = match reader.read() {
            Ok(elem) => elem,
            Err(err) if err.is_eos() => return Ok(Response::More),
            Err(err) => return Err(err),
        };
        reader.expect_end()?;
        // Safe to render unrooted: printing allocates nothing.
        Ok(Response::Value(Printer::new(self.mode).render(elem)))
    }

    fn command(&mut self, rest: &str) -> conch_core::Result<Response> {
        let mut words = rest.split_whitespace();
        let Some(name) = words.next() else {
            return Err(ConchError::syntax("Expected command after ':'"));
        };
        let arg = words.next();
        if words.next().is_some() {
            return Err(ConchError::syntax(format!(
                "too many arguments for ':{name}'"
            )));
        }

        match (name, arg) {
            ("quit" | "exit", None) => Ok(Response::Quit),
            ("gc", None) => {
                self.alloc.gc();
                Ok(Response::Info(format!(
                    "collected; {} cells live",
                    self.alloc.num_allocated()
                )))
            }
            ("stats", None) => {
                let stats = self.alloc.stats();
                Ok(Response::Info(format!(
                    "cells:       {} / {} live\n\
                     allocations: {} total\n\
                     collections: {} (last freed {})",
                    self.alloc.num_allocated(),
                    self.alloc.capacity(),
                    stats.cells_allocated,
                    stats.collections,
                    stats.freed_by_last_gc,
                )))
            }
            ("mode", None) => Ok(Response::Info(format!("print mode: {}", mode_name(self.mode)))),
            ("mode", Some("flat")) => {
                self.mode = PrintMode::Flat;
                Ok(Response::Info("print mode: flat".into()))
            }
            ("mode", Some("deep")) => {
                self.mode = PrintMode::Deep;
                Ok(Response::Info("print mode: deep".into()))
            }
            ("mode", Some(other)) => Err(ConchError::syntax(format!(
                "unknown print mode '{other}'"
            ))),
            ("quit" | "exit" | "gc" | "stats", Some(_)) => Err(ConchError::syntax(format!(
                "too many arguments for ':{name}'"
            ))),
            (name, _) => Err(ConchError::Command(name.to_string())),
        }
    }
}

fn mode_name(mode: PrintMode) -> &'static str {
    match mode {
        PrintMode::Flat => "flat",
        PrintMode::Deep => "deep",
    }
}

/// Format an error the way the loop reports it.
pub fn report(err: &ConchError) -> String {
    match err {
        ConchError::Syntax { message, .. } => format!("Syntax: {message}"),
        ConchError::Command(_) => format!("Command: {err}"),
        ConchError::OutOfMemory => format!("Error: {err}"),
    }
}

/// Run the interactive loop until `:quit`, `:exit`, or end of input.
pub fn run(shell: &mut Shell<'_>, quiet: bool) -> Result<(), ReadlineError> {
    if !quiet {
        println!("conch {} - type :quit to leave", conch_core::VERSION);
    }

    let mut rl = DefaultEditor::new()?;
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { PROMPT } else { PROMPT_MORE };
        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => return Ok(()),
            Err(err) => return Err(err),
        };
        buffer.push_str(&line);
        buffer.push('\n');

        match shell.eval_line(&buffer) {
            Ok(Response::More) => continue,
            Ok(Response::Quit) => return Ok(()),
            Ok(Response::Empty) => {}
            Ok(Response::Value(text) | Response::Info(text)) => println!("{text}"),
            Err(err) => println!("{}", report(&err)),
        }
        let _ = rl.add_history_entry(buffer.trim_end());
        buffer.clear();
    }
}
