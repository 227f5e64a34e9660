use std::path::PathBuf;

use crate::env::Environment;
use crate::history::{HISTORY_FILE, HISTORY_MAX};
use crate::session::InputSource;

/// Runtime settings of a session, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub source: InputSource,
    pub prompt: String,
    /// `None` disables history persistence.
    pub history_path: Option<PathBuf>,
    pub history_max: usize,
}

impl ShellConfig {
    /// Settings for reading from `source`, with the history file placed in
    /// the `HOME` directory of `env`.
    pub fn new(source: InputSource, env: &Environment) -> Self {
        Self {
            source,
            prompt: "$ ".to_string(),
            history_path: env
                .get_var("HOME")
                .filter(|home| !home.is_empty())
                .map(|home| PathBuf::from(home).join(HISTORY_FILE)),
            history_max: HISTORY_MAX,
        }
    }

    /// Whether prompts are shown and interrupts are caught.
    pub fn is_interactive(&self) -> bool {
        self.source == InputSource::Interactive
    }

    /// The prompt to show before each read; empty when not interactive.
    pub fn prompt(&self) -> &str {
        if self.is_interactive() { &self.prompt } else { "" }
    }
}
