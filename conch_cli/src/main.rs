//! Conch: an interactive cell runtime.

mod args;
mod shell;

use std::process::ExitCode;

use conch_gc::{Allocator, SimpleAllocator, TestAllocator};
use conch_stream::PrintMode;

use args::{CliArgs, ExecutionMode};
use shell::{Response, Shell};

/// Successful execution.
const EXIT_SUCCESS: u8 = 0;
/// Evaluation or I/O error.
const EXIT_ERROR: u8 = 1;
/// Command-line usage error.
const EXIT_USAGE_ERROR: u8 = 2;

fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("conch: {message}");
            eprintln!("{}", args::usage());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    match &args.mode {
        ExecutionMode::PrintHelp => {
            println!("{}", args::usage());
            ExitCode::from(EXIT_SUCCESS)
        }
        ExecutionMode::PrintVersion => {
            println!("conch {}", conch_core::VERSION);
            ExitCode::from(EXIT_SUCCESS)
        }
        ExecutionMode::Eval(expr) => run_eval(&args, expr),
        ExecutionMode::Repl => run_repl(&args),
    }
}

fn make_allocator(args: &CliArgs) -> Box<dyn Allocator> {
    if args.shifting {
        Box::new(TestAllocator::new(args.cells))
    } else {
        Box::new(SimpleAllocator::new(args.cells))
    }
}

fn print_mode(args: &CliArgs) -> PrintMode {
    if args.deep {
        PrintMode::Deep
    } else {
        PrintMode::Flat
    }
}

fn run_eval(args: &CliArgs, expr: &str) -> ExitCode {
    let alloc = make_allocator(args);
    let mut shell = Shell::new(alloc.as_ref(), print_mode(args));
    match shell.eval_line(expr) {
        Ok(Response::Value(text) | Response::Info(text)) => {
            println!("{text}");
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(Response::Empty | Response::Quit) => ExitCode::from(EXIT_SUCCESS),
        Ok(Response::More) => {
            eprintln!("Syntax: Unexpected end of input");
            ExitCode::from(EXIT_ERROR)
        }
        Err(err) => {
            eprintln!("{}", shell::report(&err));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run_repl(args: &CliArgs) -> ExitCode {
    let alloc = make_allocator(args);
    let mut shell = Shell::new(alloc.as_ref(), print_mode(args));
    match shell::run(&mut shell, args.quiet) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("conch: {err}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
