//! Commands executed inside the shell process.
//!
//! Each builtin is an `argh` argument struct. Parse failures and `--help`
//! turn into a command that reports usage instead of running.

use crate::alias::{self, AliasOperand};
use crate::command::{
    CommandFactory, CommandOutcome, ExecutableCommand, Streams, report_error,
};
use crate::error::{ShellError, status_of};
use crate::session::{SessionState, fold_status};
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use indexmap::IndexMap;
use std::env;
use std::io::Write;
use std::marker::PhantomData;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "exit" or "cd".
    fn name() -> &'static str;

    /// Executes the command against the session state.
    ///
    /// Errors are reported by the caller and turned into a status.
    fn execute(self, io: &mut Streams<'_>, state: &mut SessionState) -> Result<CommandOutcome>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        io: &mut Streams<'_>,
        state: &mut SessionState,
    ) -> Result<CommandOutcome> {
        match <T as BuiltinCommand>::execute(*self, io, state) {
            Ok(x) => Ok(x),
            Err(e) => {
                report_error(io.stderr, state, T::name(), &e)?;
                Ok(CommandOutcome::Status(status_of(&e)))
            }
        }
    }
}

/// Result of argument parsing that did not produce a command: either the
/// requested `--help` text or a usage error.
struct InvalidArgs {
    name: &'static str,
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        io: &mut Streams<'_>,
        state: &mut SessionState,
    ) -> Result<CommandOutcome> {
        if self.is_error {
            let usage = ShellError::Usage(self.output.trim_end().to_string());
            report_error(io.stderr, state, self.name, &usage)?;
            Ok(CommandOutcome::Status(usage.status()))
        } else {
            io.stdout.write_all(self.output.as_bytes())?;
            Ok(CommandOutcome::Status(0))
        }
    }
}

/// Factory for the builtin `T`.
pub(crate) struct Factory<T> {
    _phantom: PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand> {
        // Operands such as `-` (for `cd`) must not be mistaken for flags.
        let argv: Vec<&str> = if matches!(args, ["--help"]) {
            args.to_vec()
        } else {
            std::iter::once("--").chain(args.iter().copied()).collect()
        };

        match T::from_args(&[T::name()], &argv) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                name: T::name(),
                output,
                is_error: status.is_err(),
            }),
        }
    }
}

/// Name-to-factory table of the builtins.
pub struct BuiltinRegistry {
    commands: IndexMap<&'static str, Box<dyn CommandFactory>>,
}

impl BuiltinRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            commands: IndexMap::new(),
        }
    }

    /// Add a factory, replacing any builtin registered under the same name.
    pub fn register(&mut self, factory: Box<dyn CommandFactory>) {
        self.commands.insert(factory.name(), factory);
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn CommandFactory> {
        self.commands.get(name).map(Box::as_ref)
    }
}

impl Default for BuiltinRegistry {
    /// Registry with every builtin of the shell:
    /// `exit`, `cd`, `help`, `alias`, `history`, `env`, `setenv`, `unsetenv`.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Factory::<Exit>::default()));
        registry.register(Box::new(Factory::<Cd>::default()));
        registry.register(Box::new(Factory::<Help>::default()));
        registry.register(Box::new(Factory::<Alias>::default()));
        registry.register(Box::new(Factory::<History>::default()));
        registry.register(Box::new(Factory::<Env>::default()));
        registry.register(Box::new(Factory::<Setenv>::default()));
        registry.register(Box::new(Factory::<Unsetenv>::default()));
        registry
    }
}

#[derive(FromArgs)]
/// Exit the shell with the given status, or with the last recorded status.
pub struct Exit {
    #[argh(positional, greedy)]
    /// exit status; only the first operand is used.
    pub args: Vec<String>,
}

/// Parse an `exit` operand: an optional `+` followed by decimal digits that
/// fit in an `i32`.
fn parse_exit_code(arg: &str) -> Option<i32> {
    let digits = arg.strip_prefix('+').unwrap_or(arg);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _io: &mut Streams<'_>, state: &mut SessionState) -> Result<CommandOutcome> {
        match self.args.first() {
            None => Ok(CommandOutcome::Exit(state.last_status)),
            Some(arg) => match parse_exit_code(arg) {
                Some(code) => Ok(CommandOutcome::Exit(fold_status(code))),
                None => Err(ShellError::IllegalNumber(arg.clone()).into()),
            },
        }
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; `-` returns to the previous directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, io: &mut Streams<'_>, state: &mut SessionState) -> Result<CommandOutcome> {
        let (target, announce) = match self.target.as_deref() {
            None | Some("") => match state.env.get_var("HOME") {
                Some(home) => (PathBuf::from(home), false),
                None => return Err(ShellError::Lookup("HOME not set".into()).into()),
            },
            Some("-") => match &state.previous_dir {
                Some(prev) => (prev.clone(), true),
                None => return Err(ShellError::Lookup("OLDPWD not set".into()).into()),
            },
            Some(path) => (PathBuf::from(path), false),
        };

        let old_dir = env::current_dir().ok();
        env::set_current_dir(&target).map_err(|source| ShellError::ChangeDir {
            path: target.clone(),
            source,
        })?;
        let new_dir = env::current_dir().unwrap_or(target);

        if let Some(old) = old_dir {
            state.env.set_var("OLDPWD", old.to_string_lossy());
            state.previous_dir = Some(old);
        }
        state.env.set_var("PWD", new_dir.to_string_lossy());

        if announce {
            writeln!(io.stdout, "{}", new_dir.display())?;
        }
        Ok(CommandOutcome::Status(0))
    }
}

const HELP_TEXT: &str = "\
Built-in commands:
  exit [n]               leave the shell with status n (default: last status)
  cd [dir | -]           change directory (default: $HOME, -: previous)
  help                   show this text
  alias [name[=value]]   define or show aliases
  history                list previously entered commands
  env                    print the environment
  setenv name [value]    set an environment variable
  unsetenv name          remove an environment variable

Commands can be chained with `;`, `&&` and `||`.
Other commands are looked up in the directories listed in $PATH.
";

#[derive(FromArgs)]
/// Print usage of the builtin commands.
pub struct Help {
    #[argh(positional, greedy)]
    /// ignored.
    pub _topics: Vec<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, io: &mut Streams<'_>, _state: &mut SessionState) -> Result<CommandOutcome> {
        io.stdout.write_all(HELP_TEXT.as_bytes())?;
        Ok(CommandOutcome::Status(0))
    }
}

#[derive(FromArgs)]
/// Define aliases with name=value, show them by name, or list all of them.
pub struct Alias {
    #[argh(positional, greedy)]
    /// definitions (name=value) or names to show.
    pub args: Vec<String>,
}

impl BuiltinCommand for Alias {
    fn name() -> &'static str {
        "alias"
    }

    fn execute(self, io: &mut Streams<'_>, state: &mut SessionState) -> Result<CommandOutcome> {
        if self.args.is_empty() {
            for (name, value) in state.aliases.iter() {
                writeln!(io.stdout, "{name}='{value}'")?;
            }
            return Ok(CommandOutcome::Status(0));
        }

        let mut status = 0;
        for operand in alias::parse_operands(&self.args) {
            match operand {
                AliasOperand::Define { name, value } => state.aliases.set(name, value),
                AliasOperand::Show(name) => match state.aliases.get(&name) {
                    Some(value) => writeln!(io.stdout, "{name}='{value}'")?,
                    None => {
                        let missing = ShellError::Lookup(format!("{name} not found"));
                        report_error(io.stderr, state, Self::name(), &missing)?;
                        status = missing.status();
                    }
                },
            }
        }
        Ok(CommandOutcome::Status(status))
    }
}

#[derive(FromArgs)]
/// List the command history, oldest first.
pub struct History {}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, io: &mut Streams<'_>, state: &mut SessionState) -> Result<CommandOutcome> {
        for entry in state.history.entries() {
            writeln!(io.stdout, "{:5}  {}", entry.number, entry.text)?;
        }
        Ok(CommandOutcome::Status(0))
    }
}

#[derive(FromArgs)]
/// Print the environment, one name=value per line.
pub struct Env {}

impl BuiltinCommand for Env {
    fn name() -> &'static str {
        "env"
    }

    fn execute(self, io: &mut Streams<'_>, state: &mut SessionState) -> Result<CommandOutcome> {
        for (name, value) in state.env.iter() {
            writeln!(io.stdout, "{name}={value}")?;
        }
        Ok(CommandOutcome::Status(0))
    }
}

#[derive(FromArgs)]
/// Set an environment variable, overwriting any previous value.
pub struct Setenv {
    #[argh(positional)]
    /// variable name.
    pub name: String,

    #[argh(positional)]
    /// new value; empty when omitted.
    pub value: Option<String>,
}

impl BuiltinCommand for Setenv {
    fn name() -> &'static str {
        "setenv"
    }

    fn execute(self, _io: &mut Streams<'_>, state: &mut SessionState) -> Result<CommandOutcome> {
        if self.name.is_empty() || self.name.contains('=') {
            return Err(ShellError::Usage(format!("{}: bad variable name", self.name)).into());
        }
        state.env.set_var(self.name, self.value.unwrap_or_default());
        Ok(CommandOutcome::Status(0))
    }
}

#[derive(FromArgs)]
/// Remove an environment variable. Removing an unset name succeeds.
pub struct Unsetenv {
    #[argh(positional)]
    /// variable name.
    pub name: String,
}

impl BuiltinCommand for Unsetenv {
    fn name() -> &'static str {
        "unsetenv"
    }

    fn execute(self, _io: &mut Streams<'_>, state: &mut SessionState) -> Result<CommandOutcome> {
        state.env.unset_var(&self.name);
        Ok(CommandOutcome::Status(0))
    }
}
