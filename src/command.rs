use crate::session::SessionState;
use anyhow::Result;
use std::fmt::Display;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// What the session loop should do after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Record the status and carry on.
    Status(ExitCode),
    /// Terminate the session with this exit code.
    Exit(ExitCode),
}

/// Output streams handed to in-process commands.
///
/// External programs inherit the shell's own standard streams instead, so
/// whatever is buffered here must be flushed before a child is spawned.
pub struct Streams<'a> {
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

impl Streams<'_> {
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.stdout.flush()?;
        self.stderr.flush()
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command.
    fn execute(
        self: Box<Self>,
        io: &mut Streams<'_>,
        state: &mut SessionState,
    ) -> Result<CommandOutcome>;
}

/// Factory that creates a command instance from its arguments.
pub trait CommandFactory {
    /// Name the command is invoked by.
    fn name(&self) -> &'static str;

    /// Build the command for the given arguments (not including the name).
    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand>;
}

/// Print a diagnostic in the `<prog>: <line>: <command>: <message>` layout
/// and count it against the session.
pub fn report_error(
    stderr: &mut dyn Write,
    state: &mut SessionState,
    command: &str,
    message: impl Display,
) -> std::io::Result<()> {
    report(stderr, state, format_args!("{command}: {message}"))
}

/// Print a diagnostic that is not tied to a command, such as a syntax error.
pub fn report(
    stderr: &mut dyn Write,
    state: &mut SessionState,
    message: impl Display,
) -> std::io::Result<()> {
    state.error_count += 1;
    writeln!(
        stderr,
        "{}: {}: {}",
        state.program_name(),
        state.line_count,
        message
    )
}
