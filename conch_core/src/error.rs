//! Error type shared across the runtime.
//!
//! Every fallible operation in the workspace returns [`ConchError`].
//! The `eos` flag on syntax errors is load-bearing: it tells an
//! interactive driver that the input ran out mid-expression and more
//! lines may complete it, instead of reporting a hard error.

use thiserror::Error;

/// Convenience result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ConchError>;

/// All runtime error kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConchError {
    /// The allocator found no free cell, even after a collection.
    /// Fatal for the current allocator instance.
    #[error("out of memory: no free cell after collection")]
    OutOfMemory,

    /// Malformed external text.
    #[error("{message}")]
    Syntax {
        /// Human-readable description of the problem.
        message: String,
        /// True when the input was exhausted inside an expression;
        /// an interactive caller may supply more input and retry.
        eos: bool,
    },

    /// Unknown shell command.
    #[error("Unknown command '{0}'")]
    Command(String),
}

impl ConchError {
    /// A hard syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
            eos: false,
        }
    }

    /// A recoverable end-of-input syntax error.
    pub fn syntax_eos(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
            eos: true,
        }
    }

    /// True for the recoverable incomplete-input case.
    #[must_use]
    pub fn is_eos(&self) -> bool {
        matches!(self, Self::Syntax { eos: true, .. })
    }
}
