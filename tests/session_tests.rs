use hsh::{
    Environment, InputSource, Interpreter, MemWriter, ReaderSource, SessionState, ShellConfig,
};
use std::fs;
use std::io::Cursor;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

fn interpreter(history_path: Option<&Path>) -> (Interpreter, MemWriter, MemWriter) {
    let env: Environment = [("PATH", "/bin:/usr/bin")].into_iter().collect();
    let mut config = ShellConfig::new(InputSource::Stdin, &Environment::default());
    config.history_path = history_path.map(Path::to_path_buf);

    let out = MemWriter::new();
    let err = MemWriter::new();
    let sh = Interpreter::new(config, SessionState::new(env, vec!["hsh".into()]))
        .with_output(Box::new(out.clone()), Box::new(err.clone()));
    (sh, out, err)
}

fn run_script(sh: &mut Interpreter, script: &str) -> i32 {
    sh.run(&mut ReaderSource::new(Cursor::new(script.to_string())))
}

#[test]
fn test_exit_code_of_sole_exit() {
    let (mut sh, _, _) = interpreter(None);
    assert_eq!(run_script(&mut sh, "exit 7\n"), 7);
}

#[test]
fn test_final_status_is_last_command() {
    let (mut sh, _, _) = interpreter(None);
    assert_eq!(run_script(&mut sh, "true\nfalse\n"), 1);

    let (mut sh, _, _) = interpreter(None);
    assert_eq!(run_script(&mut sh, "false\ntrue\n"), 0);
}

#[test]
fn test_exit_stops_reading_lines() {
    let (mut sh, _, _) = interpreter(None);
    assert_eq!(run_script(&mut sh, "exit 3\nsetenv NEVER yes\n"), 3);
    assert_eq!(sh.state().env.get_var("NEVER"), None);
}

#[test]
fn test_bad_exit_then_more_commands() {
    let (mut sh, out, err) = interpreter(None);
    let code = run_script(&mut sh, "exit abc\nsetenv AFTER yes\nenv\n");
    assert_eq!(code, 0);
    assert_eq!(err.contents(), "hsh: 1: exit: Illegal number: abc\n");
    assert_eq!(out.contents(), "PATH=/bin:/usr/bin\nAFTER=yes\n");
}

#[test]
fn test_line_numbers_in_diagnostics() {
    let (mut sh, _, err) = interpreter(None);
    let code = run_script(&mut sh, "# header\n\nnosuch_cmd_hsh_test\n");
    assert_eq!(code, 127);
    assert_eq!(err.contents(), "hsh: 3: nosuch_cmd_hsh_test: not found\n");
    assert_eq!(sh.state().line_count, 3);
    assert_eq!(sh.state().error_count, 1);
}

#[test]
fn test_alias_body_expands_at_execution_time() {
    let (mut sh, out, _) = interpreter(None);
    run_script(
        &mut sh,
        "setenv TARGET first\nalias show='setenv COPY $TARGET'\nsetenv TARGET second\nshow\nenv\n",
    );
    assert_eq!(sh.state().env.get_var("COPY"), Some("second"));
    assert!(out.contents().ends_with("COPY=second\n"));
}

#[test]
fn test_invalid_utf8_line_does_not_end_session() {
    let (mut sh, _, _) = interpreter(None);
    let input: &[u8] = b"setenv A 1\nsetenv CAFE caf\xe9\nsetenv B 2\n";
    let code = sh.run(&mut ReaderSource::new(Cursor::new(input)));
    assert_eq!(code, 0);
    assert_eq!(sh.state().env.get_var("CAFE"), Some("caf\u{fffd}"));
    assert_eq!(sh.state().env.get_var("B"), Some("2"));
    assert_eq!(sh.state().line_count, 3);
}

#[test]
fn test_history_with_invalid_utf8_is_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".shell_history");
    fs::write(&path, b"echo one\necho caf\xe9\n").unwrap();

    let (mut sh, out, _) = interpreter(Some(&path));
    run_script(&mut sh, "history\n");
    assert_eq!(
        out.contents(),
        "    1  echo one\n    2  echo caf\u{fffd}\n    3  history\n"
    );
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "echo one\necho caf\u{fffd}\nhistory\n"
    );
}

#[test]
fn test_unreadable_history_file_is_left_alone() {
    if nix::unistd::geteuid().is_root() {
        // root reads the file regardless of its mode
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".shell_history");
    fs::write(&path, "echo precious\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

    let (mut sh, out, _) = interpreter(Some(&path));
    run_script(&mut sh, "history\n");
    assert_eq!(out.contents(), "    1  history\n");

    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "echo precious\n");
}

#[test]
fn test_alias_defined_on_command_line() {
    let (mut sh, _, _) = interpreter(None);
    let code = run_script(&mut sh, "alias nope=\"false --really\"\nnope\n");
    assert_eq!(sh.state().aliases.get("nope"), Some("false --really"));
    assert_eq!(code, 1);
}

#[test]
fn test_history_numbering_continues_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".shell_history");

    let (mut first, _, _) = interpreter(Some(&path));
    run_script(&mut first, "true\ntrue ; false\n\n# not recorded\ntrue\n");
    assert_eq!(fs::read_to_string(&path).unwrap(), "true\ntrue ; false\ntrue\n");

    let (mut second, out, _) = interpreter(Some(&path));
    run_script(&mut second, "history\n");
    assert_eq!(
        out.contents(),
        "    1  true\n    2  true ; false\n    3  true\n    4  history\n"
    );
}

#[test]
fn test_history_file_is_capped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".shell_history");

    let mut config = ShellConfig::new(InputSource::Stdin, &Environment::default());
    config.history_path = Some(path.clone());
    config.history_max = 2;
    let mut sh = Interpreter::new(config, SessionState::new(Environment::default(), vec!["hsh".into()]))
        .with_output(Box::new(MemWriter::new()), Box::new(MemWriter::new()));

    run_script(&mut sh, "setenv A 1\nsetenv B 2\nsetenv C 3\n");
    assert_eq!(fs::read_to_string(&path).unwrap(), "setenv B 2\nsetenv C 3\n");
}
