use crate::command::{CommandOutcome, ExecutableCommand, ExitCode, Streams};
use crate::error::ShellError;
use crate::session::SessionState;
use anyhow::Result;
use nix::unistd::{AccessFlags, access};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Outcome of looking a command name up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An executable file to run.
    Found(PathBuf),
    /// A path-qualified name that exists but cannot be executed.
    NotExecutable(PathBuf),
    NotFound,
}

/// Resolve a command name the way the shell does.
///
/// - A name containing `/` is used as-is and must be an executable file.
/// - Any other name is tried in each directory of `search_paths` (the value
///   of `PATH`), in order; an empty entry stands for the current directory.
/// - An empty name or an unset `PATH` resolves to nothing.
pub fn find_command_path(search_paths: Option<&str>, name: &str) -> Resolution {
    if name.is_empty() {
        return Resolution::NotFound;
    }

    if name.contains('/') {
        let path = Path::new(name);
        return if is_executable(path) {
            Resolution::Found(path.to_path_buf())
        } else if path.exists() {
            Resolution::NotExecutable(path.to_path_buf())
        } else {
            Resolution::NotFound
        };
    }

    search_paths
        .and_then(|paths| find_in_path(paths, name))
        .map_or(Resolution::NotFound, Resolution::Found)
}

fn find_in_path(search_paths: &str, cmd: &str) -> Option<PathBuf> {
    search_paths
        .split(':')
        .map(|dir| if dir.is_empty() { Path::new(".") } else { Path::new(dir) })
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

/// Command that is not a builtin.
pub struct ExternalCommand {
    path: PathBuf,
    argv: Vec<String>,
    environment: Vec<String>,
}

impl ExternalCommand {
    /// `argv[0]` is passed to the child unchanged; `environment` holds
    /// `name=value` strings as produced by `Environment::materialize`.
    pub fn new(path: PathBuf, argv: Vec<String>, environment: Vec<String>) -> Self {
        Self {
            path,
            argv,
            environment,
        }
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        io: &mut Streams<'_>,
        _state: &mut SessionState,
    ) -> Result<CommandOutcome> {
        // The child writes straight to the inherited descriptors.
        io.flush()?;

        let mut cmd = std::process::Command::new(&self.path);
        if let Some((arg0, rest)) = self.argv.split_first() {
            cmd.arg0(arg0).args(rest);
        }
        cmd.env_clear().envs(
            self.environment
                .iter()
                .filter_map(|entry| entry.split_once('=')),
        );

        tracing::debug!(target: "commands", "spawning {} {:?}", self.path.display(), self.argv);
        let mut child = cmd.spawn().map_err(ShellError::Spawn)?;
        let exit_status = child.wait().map_err(ShellError::Wait)?;
        let code = decode_status(exit_status);
        tracing::debug!(target: "commands", "{} exited with {}", self.path.display(), code);
        Ok(CommandOutcome::Status(code))
    }
}

/// Exit code of a normally terminated child, or `128 + signal` for one
/// killed by a signal.
pub fn decode_status(exit_status: ExitStatus) -> ExitCode {
    match exit_status.code() {
        Some(x) => x,
        None => terminated_by_signal(exit_status),
    }
}

fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    if let Some(signal) = exit_status.signal() {
        128 + signal
    } else if exit_status.core_dumped() {
        255
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn make_script(dir: &Path, name: &str, body: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    fn run(path: PathBuf, argv: &[&str], env: &Environment) -> CommandOutcome {
        let mut state = SessionState::new(env.clone(), vec!["hsh".into()]);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut io = Streams {
            stdout: &mut out,
            stderr: &mut err,
        };
        let cmd = ExternalCommand::new(
            path,
            argv.iter().map(|s| s.to_string()).collect(),
            env.materialize(),
        );
        Box::new(cmd).execute(&mut io, &mut state).unwrap()
    }

    #[test]
    fn absolute_existing_true() {
        assert_eq!(
            find_command_path(Some("/nowhere"), "/bin/sh"),
            Resolution::Found(PathBuf::from("/bin/sh"))
        );
    }

    #[test]
    fn absolute_nonexisting() {
        assert_eq!(find_command_path(Some("/bin"), "/bin/nonexisting"), Resolution::NotFound);
    }

    #[test]
    fn single_component_found_in_path() {
        match find_command_path(Some("/nonexistent_dir:/bin"), "sh") {
            Resolution::Found(path) => assert_eq!(path, PathBuf::from("/bin/sh")),
            other => panic!("expected to find sh in /bin, got {other:?}"),
        }
    }

    #[test]
    fn single_component_not_found_in_path() {
        assert_eq!(find_command_path(Some("/bin"), "nonexisting"), Resolution::NotFound);
        assert_eq!(find_command_path(None, "sh"), Resolution::NotFound);
    }

    #[test]
    fn empty_name_is_none() {
        assert_eq!(find_command_path(Some("/bin"), ""), Resolution::NotFound);
    }

    #[test]
    fn first_executable_candidate_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_script(first.path(), "tool", "exit 0", 0o644);
        let wanted = make_script(second.path(), "tool", "exit 0", 0o755);

        let search = format!("{}:{}", first.path().display(), second.path().display());
        assert_eq!(find_command_path(Some(&search), "tool"), Resolution::Found(wanted));
    }

    #[test]
    fn path_qualified_without_exec_bit() {
        let dir = tempfile::tempdir().unwrap();
        let script = make_script(dir.path(), "plain", "exit 0", 0o644);
        let name = script.to_string_lossy().to_string();
        assert_eq!(find_command_path(Some("/bin"), &name), Resolution::NotExecutable(script));
    }

    #[test]
    fn exit_code_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let script = make_script(dir.path(), "code", "exit 3", 0o755);
        let env: Environment = [("PATH", "/bin:/usr/bin")].into_iter().collect();
        assert_eq!(run(script, &["code"], &env), CommandOutcome::Status(3));
    }

    #[test]
    fn signal_death_is_128_plus_signal() {
        let dir = tempfile::tempdir().unwrap();
        let script = make_script(dir.path(), "killself", "kill -TERM $$", 0o755);
        let env: Environment = [("PATH", "/bin:/usr/bin")].into_iter().collect();
        assert_eq!(run(script, &["killself"], &env), CommandOutcome::Status(128 + 15));
    }

    #[test]
    fn child_sees_materialized_environment_only() {
        let dir = tempfile::tempdir().unwrap();
        let script = make_script(
            dir.path(),
            "envcheck",
            r#"[ "$GREETING" = hi ] && [ -z "$HSH_UNRELATED_VAR" ]"#,
            0o755,
        );
        let env: Environment = [("PATH", "/bin:/usr/bin"), ("GREETING", "hi")]
            .into_iter()
            .collect();
        assert_eq!(run(script, &["envcheck"], &env), CommandOutcome::Status(0));
    }
}
