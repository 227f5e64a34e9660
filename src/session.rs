use std::path::PathBuf;

use crate::alias::AliasStore;
use crate::command::ExitCode;
use crate::env::Environment;
use crate::history::HistoryStore;

/// Where command lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A terminal driven through the line editor.
    Interactive,
    /// Standard input that is not a terminal.
    Stdin,
    /// A script file given on the command line.
    Script(PathBuf),
}

/// Mutable state threaded through every command of a session.
#[derive(Debug)]
pub struct SessionState {
    pub env: Environment,
    pub aliases: AliasStore,
    pub history: HistoryStore,
    /// Status of the last executed segment, always in `[0, 255]`.
    pub last_status: ExitCode,
    /// Set by `exit`; the loop stops as soon as it sees it.
    pub pending_exit: Option<ExitCode>,
    /// Working directory before the last successful `cd`.
    pub previous_dir: Option<PathBuf>,
    /// Arguments the shell itself was started with.
    pub argv: Vec<String>,
    pub pid: u32,
    /// Lines read from the source so far; used in diagnostics.
    pub line_count: usize,
    /// Diagnostics printed so far.
    pub error_count: usize,
}

impl SessionState {
    pub fn new(env: Environment, argv: Vec<String>) -> Self {
        let previous_dir = env
            .get_var("OLDPWD")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);
        Self {
            env,
            aliases: AliasStore::new(),
            history: HistoryStore::new(),
            last_status: 0,
            pending_exit: None,
            previous_dir,
            argv,
            pid: std::process::id(),
            line_count: 0,
            error_count: 0,
        }
    }

    /// Name used as the prefix of diagnostics.
    pub fn program_name(&self) -> &str {
        self.argv.first().map_or("hsh", String::as_str)
    }

    /// Record a segment's status, folded into the exit-status range.
    pub fn record_status(&mut self, status: ExitCode) {
        self.last_status = fold_status(status);
    }
}

/// Fold any integer status into `[0, 255]` the way process exit codes wrap.
pub fn fold_status(status: ExitCode) -> ExitCode {
    status.rem_euclid(256)
}
