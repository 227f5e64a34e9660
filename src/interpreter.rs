//! The session loop that ties splitting, expansion and dispatch together.

use crate::builtin::BuiltinRegistry;
use crate::chain::{CommandSegment, split_chain};
use crate::command::{CommandOutcome, ExecutableCommand, ExitCode, Streams, report, report_error};
use crate::config::ShellConfig;
use crate::error::{ShellError, status_of};
use crate::expand::{expand, tokenize};
use crate::external::{ExternalCommand, Resolution, find_command_path};
use crate::history::HistoryStore;
use crate::input::{LineSource, ReadOutcome};
use crate::session::SessionState;
use std::fmt::Display;
use std::io::Write;

/// The session loop: reads lines, splits them into chains, and runs each
/// segment as a builtin or an external program.
///
/// Example
/// ```
/// use hsh::{Environment, Interpreter, SessionState, ShellConfig, InputSource};
///
/// let env: Environment = [("PATH", "/bin:/usr/bin")].into_iter().collect();
/// let config = ShellConfig::new(InputSource::Stdin, &Environment::default());
/// let mut sh = Interpreter::new(config, SessionState::new(env, vec!["hsh".into()]));
/// assert_eq!(sh.execute_line("setenv GREETING hi && unsetenv NOPE"), None);
/// assert_eq!(sh.state().env.get_var("GREETING"), Some("hi"));
/// assert_eq!(sh.execute_line("exit 7"), Some(7));
/// ```
pub struct Interpreter {
    state: SessionState,
    builtins: BuiltinRegistry,
    config: ShellConfig,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl Interpreter {
    /// Create a session writing to the process's standard streams.
    ///
    /// When the configuration names a history file it is loaded now. A file
    /// that exists but cannot be read is left untouched: the session starts
    /// with an empty history and does not save it on exit.
    pub fn new(mut config: ShellConfig, mut state: SessionState) -> Self {
        let loaded = config.history_path.as_deref().map(HistoryStore::load);
        match loaded {
            Some(Ok(history)) => state.history = history,
            Some(Err(e)) => {
                if let Some(path) = config.history_path.take() {
                    tracing::warn!("failed to read history from {}: {e}", path.display());
                }
            }
            None => {}
        }
        Self {
            state,
            builtins: BuiltinRegistry::default(),
            config,
            stdout: Box::new(std::io::stdout()),
            stderr: Box::new(std::io::stderr()),
        }
    }

    /// Redirect builtin output and diagnostics. External programs keep
    /// writing to the inherited descriptors.
    pub fn with_output(mut self, stdout: Box<dyn Write>, stderr: Box<dyn Write>) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Read and execute lines until end of input or `exit`, then save the
    /// history. Returns the exit code for the shell process.
    pub fn run(&mut self, source: &mut dyn LineSource) -> ExitCode {
        loop {
            self.flush_output();
            let outcome = match source.read_line(self.config.prompt()) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!("failed to read input: {e:#}");
                    ReadOutcome::Eof
                }
            };

            match outcome {
                ReadOutcome::Line(line) => {
                    self.state.line_count += 1;
                    if !line.trim().is_empty() {
                        source.accepted(&line);
                    }
                    if self.execute_line(&line).is_some() {
                        break;
                    }
                }
                ReadOutcome::Interrupted => {
                    if self.config.is_interactive() {
                        self.write_stdout("\n");
                    }
                }
                ReadOutcome::Eof => {
                    if self.config.is_interactive() {
                        self.write_stdout("\n");
                    }
                    break;
                }
            }
        }

        self.finish();
        self.state.pending_exit.unwrap_or(self.state.last_status)
    }

    /// Execute one raw input line.
    ///
    /// Returns the requested exit code once a builtin asked the session to
    /// terminate; remaining segments of the line are not run.
    pub fn execute_line(&mut self, line: &str) -> Option<ExitCode> {
        let chain = match split_chain(line) {
            Ok(chain) => chain,
            Err(e) => {
                self.diagnose(None, &e);
                self.state.record_status(e.status());
                return None;
            }
        };
        if chain.is_empty() {
            return None;
        }

        self.state.history.push(line);

        for segment in &chain {
            if !segment.op.should_run(self.state.last_status) {
                tracing::debug!(target: "commands", "skipping {:?} after status {}", segment.text, self.state.last_status);
                continue;
            }

            match self.execute_segment(segment) {
                CommandOutcome::Status(status) => self.state.record_status(status),
                CommandOutcome::Exit(code) => {
                    self.state.record_status(code);
                    self.state.pending_exit = Some(self.state.last_status);
                    return self.state.pending_exit;
                }
            }
        }
        None
    }

    fn execute_segment(&mut self, segment: &CommandSegment) -> CommandOutcome {
        if let Some(stray) = segment.stray {
            let err = ShellError::Syntax(stray.to_string());
            self.diagnose(None, &err);
            return CommandOutcome::Status(err.status());
        }

        let argv = tokenize(&expand(&segment.text, &self.state));
        if argv.is_empty() {
            return CommandOutcome::Status(0);
        }
        self.run_command(&argv)
    }

    /// Dispatch an argument vector: builtins first, then a `PATH` search.
    fn run_command(&mut self, argv: &[String]) -> CommandOutcome {
        let name = argv[0].as_str();
        let args: Vec<&str> = argv[1..].iter().map(String::as_str).collect();

        let command: Box<dyn ExecutableCommand> = match self.builtins.lookup(name) {
            Some(factory) => {
                tracing::debug!(target: "commands", "builtin {name} {args:?}");
                factory.create(&args)
            }
            None => match find_command_path(self.state.env.get_var("PATH"), name) {
                Resolution::Found(path) => Box::new(ExternalCommand::new(
                    path,
                    argv.to_vec(),
                    self.state.env.materialize(),
                )),
                Resolution::NotExecutable(_) => return self.fail(name, ShellError::PermissionDenied),
                Resolution::NotFound => return self.fail(name, ShellError::NotFound),
            },
        };

        let mut io = Streams {
            stdout: &mut *self.stdout,
            stderr: &mut *self.stderr,
        };
        match command.execute(&mut io, &mut self.state) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.diagnose(Some(name), format!("{e:#}"));
                CommandOutcome::Status(status_of(&e))
            }
        }
    }

    fn fail(&mut self, name: &str, err: ShellError) -> CommandOutcome {
        tracing::debug!(target: "commands", "{name}: {err}");
        self.diagnose(Some(name), &err);
        CommandOutcome::Status(err.status())
    }

    fn diagnose(&mut self, command: Option<&str>, message: impl Display) {
        let written = match command {
            Some(command) => report_error(&mut *self.stderr, &mut self.state, command, message),
            None => report(&mut *self.stderr, &mut self.state, message),
        };
        if let Err(e) = written {
            tracing::warn!("failed to write diagnostic: {e}");
        }
    }

    fn write_stdout(&mut self, text: &str) {
        if let Err(e) = self.stdout.write_all(text.as_bytes()) {
            tracing::warn!("failed to write output: {e}");
        }
    }

    fn flush_output(&mut self) {
        if let Err(e) = self.stdout.flush().and_then(|()| self.stderr.flush()) {
            tracing::warn!("failed to flush output: {e}");
        }
    }

    /// Flush output and rewrite the history file.
    pub fn finish(&mut self) {
        self.flush_output();
        if let Some(path) = &self.config.history_path {
            if let Err(e) = self.state.history.save(path, self.config.history_max) {
                tracing::warn!("failed to write history to {}: {e}", path.display());
            }
        }
    }
}
