//! A small interactive command-line shell.
//!
//! This crate implements a single-command-per-line shell: built-in commands
//! (`exit`, `pwd`, `cd`, `help`, `history`) run in-process, anything else is
//! launched as a child process, optionally in the background with a trailing
//! `&`. A fixed-depth history ring keeps the most recent commands and makes
//! them recallable by logical index (`!N`) or as "repeat last" (`!!`).
//!
//! The main entry point is [`Shell`], which owns the session state and runs
//! the prompt/read/dispatch loop. The public modules [`history`] and
//! [`lexer`] expose the history ring and the command-line parser for reuse
//! and testing.

mod builtin;
pub mod command;
mod external;
pub mod history;
mod interpreter;
pub mod lexer;
pub mod session;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Shell`] for the high-level API.
pub use interpreter::Shell;
