use std::path::PathBuf;

use crate::command::ExitCode;

/// Errors raised while running a command line.
///
/// Every variant except [`ShellError::ScriptOpen`] is recovered by the
/// session loop: it is reported on the error stream and converted into the
/// status returned by [`ShellError::status`].
#[derive(thiserror::Error, Debug)]
pub enum ShellError {
    #[error("Syntax error: \"{0}\" unexpected")]
    Syntax(String),

    #[error("Illegal number: {0}")]
    IllegalNumber(String),

    #[error("{0}")]
    Lookup(String),

    #[error("not found")]
    NotFound,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("can't cd to {path}: {reason}", reason = os_reason(.source))]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Spawn(#[source] std::io::Error),

    #[error("{0}")]
    Wait(#[source] std::io::Error),

    #[error("{0}")]
    Usage(String),

    #[error("Cannot open {path}")]
    ScriptOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ShellError {
    /// Status recorded for the segment that failed with this error.
    pub fn status(&self) -> ExitCode {
        match self {
            ShellError::Syntax(_) | ShellError::IllegalNumber(_) | ShellError::ChangeDir { .. } => 2,
            ShellError::Lookup(_) | ShellError::Usage(_) => 1,
            ShellError::NotFound => 127,
            ShellError::PermissionDenied | ShellError::Spawn(_) | ShellError::Wait(_) => 126,
            ShellError::ScriptOpen { source, .. } => match source.kind() {
                std::io::ErrorKind::PermissionDenied => 126,
                std::io::ErrorKind::NotFound => 127,
                _ => 1,
            },
        }
    }
}

/// The operating system's description of `err`, without the
/// `(os error N)` suffix that `io::Error` appends.
fn os_reason(err: &std::io::Error) -> String {
    let text = err.to_string();
    match text.rfind(" (os error ") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}

/// Status for an arbitrary command failure, preferring the typed status when
/// the chain carries a [`ShellError`].
pub fn status_of(err: &anyhow::Error) -> ExitCode {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ShellError>())
        .map_or(1, ShellError::status)
}
