//! Command-line argument parser.
//!
//! Hand-rolled for zero-overhead startup; the flag set is small enough
//! that a parser generator would cost more than it saves.

/// Default heap capacity in cells.
pub const DEFAULT_CELLS: usize = 4096;

/// What the binary should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Interactive shell: `conch` with no arguments.
    Repl,
    /// Evaluate one expression and exit: `conch -e "[1 2]"`.
    Eval(String),
    /// Print help and exit.
    PrintHelp,
    /// Print version and exit.
    PrintVersion,
}

/// Parsed command-line arguments.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// What to execute.
    pub mode: ExecutionMode,
    /// Heap capacity in cells (`-n` / `--cells`).
    pub cells: usize,
    /// Start in deep print mode (`--deep`).
    pub deep: bool,
    /// Suppress the banner (`-q` / `--quiet`).
    pub quiet: bool,
    /// Run on the shifting allocator (`--shifting`), which relocates
    /// the heap on every allocation. Slow; useful for flushing out
    /// root bugs in client code.
    pub shifting: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Repl,
            cells: DEFAULT_CELLS,
            deep: false,
            quiet: false,
            shifting: false,
        }
    }
}

impl CliArgs {
    /// Parse arguments (program name already stripped).
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.mode = ExecutionMode::PrintHelp,
                "-V" | "--version" => parsed.mode = ExecutionMode::PrintVersion,
                "-q" | "--quiet" => parsed.quiet = true,
                "--deep" => parsed.deep = true,
                "--shifting" => parsed.shifting = true,
                "-n" | "--cells" => {
                    let value = args
                        .next()
                        .ok_or_else(|| format!("{arg} requires a value"))?;
                    parsed.cells = value
                        .parse::<usize>()
                        .ok()
                        .filter(|&n| n > 0)
                        .ok_or_else(|| format!("invalid cell count '{value}'"))?;
                }
                "-e" | "--eval" => {
                    let expr = args
                        .next()
                        .ok_or_else(|| format!("{arg} requires an expression"))?;
                    parsed.mode = ExecutionMode::Eval(expr);
                }
                other => return Err(format!("unknown option '{other}'")),
            }
        }
        Ok(parsed)
    }
}

/// Usage text for `--help` and argument errors.
pub fn usage() -> String {
    format!(
        "conch {} - interactive cell runtime\n\
         \n\
         Usage: conch [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 -e, --eval EXPR  Evaluate one expression and exit\n\
         \x20 -n, --cells N    Heap capacity in cells (default {DEFAULT_CELLS})\n\
         \x20     --deep       Print every pair with its own brackets\n\
         \x20     --shifting   Use the shifting allocator (root-bug detector)\n\
         \x20 -q, --quiet      Suppress the banner\n\
         \x20 -h, --help       Print this help\n\
         \x20 -V, --version    Print version",
        conch_core::VERSION
    )
}
