//! A small POSIX-style command interpreter.
//!
//! Command lines are read from a terminal, a script file or a pipe, split
//! into segments joined by `;`, `&&` and `||`, expanded (aliases, then
//! `$NAME`, `$?` and `$$`), and run either as a builtin or as an external
//! program found through `PATH`. The status of each segment decides whether
//! the next one runs.
//!
//! The main entry point is [`Interpreter`], which owns the [`SessionState`]
//! (environment, aliases, history, last status) for the life of a session.
//! Pipelines, redirections, background jobs, globbing and quote removal are
//! not supported.

mod alias;
mod builtin;
mod chain;
pub mod command;
mod config;
mod env;
mod error;
mod expand;
mod external;
mod history;
mod input;
mod interpreter;
mod io_adapters;
mod session;
pub mod signals;
mod vars;

pub use alias::AliasStore;
pub use builtin::BuiltinRegistry;
pub use chain::{ChainOp, CommandChain, CommandSegment, split_chain};
pub use config::ShellConfig;
pub use env::Environment;
pub use error::ShellError;
pub use expand::{expand, tokenize};
pub use external::{Resolution, find_command_path};
pub use history::{HISTORY_FILE, HISTORY_MAX, HistoryEntry, HistoryStore};
pub use input::{EditorSource, LineSource, ReadOutcome, ReaderSource};
pub use interpreter::Interpreter;
pub use io_adapters::MemWriter;
pub use session::{InputSource, SessionState};
