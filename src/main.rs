use argh::FromArgs;
use hsh::{
    EditorSource, Environment, InputSource, Interpreter, ReaderSource, SessionState, ShellConfig,
    ShellError,
};
use std::fs::File;
use std::io::{BufReader, IsTerminal};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Log target that can be switched to debug level from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TraceTarget {
    Commands,
    Expansion,
    Parse,
    History,
}

impl TraceTarget {
    fn target(self) -> &'static str {
        match self {
            TraceTarget::Commands => "commands",
            TraceTarget::Expansion => "expansion",
            TraceTarget::Parse => "parse",
            TraceTarget::History => "history",
        }
    }
}

impl FromStr for TraceTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commands" => Ok(TraceTarget::Commands),
            "expansion" => Ok(TraceTarget::Expansion),
            "parse" => Ok(TraceTarget::Parse),
            "history" => Ok(TraceTarget::History),
            other => Err(format!(
                "unknown log target `{other}` (expected commands, expansion, parse or history)"
            )),
        }
    }
}

#[derive(FromArgs)]
/// A minimal POSIX-style command interpreter.
struct Args {
    #[argh(option)]
    /// enable debug logging for a target: commands, expansion, parse or history. May be repeated.
    log: Vec<TraceTarget>,

    #[argh(positional)]
    /// script to run instead of reading commands from standard input.
    script: Option<PathBuf>,
}

fn init_tracing(targets: &[TraceTarget]) {
    let filter = tracing_subscriber::filter::Targets::new()
        .with_default(tracing_subscriber::filter::LevelFilter::WARN)
        .with_targets(targets.iter().map(|t| (t.target(), tracing::Level::DEBUG)));

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_filter(filter);

    if tracing_subscriber::registry().with(layer).try_init().is_err() {
        eprintln!("warning: failed to initialize tracing.");
    }
}

fn main() {
    let argv: Vec<String> = std::env::args().collect();
    let args: Args = argh::from_env();
    init_tracing(&args.log);

    let env = Environment::from_process();

    let source = match &args.script {
        Some(path) => InputSource::Script(path.clone()),
        None if std::io::stdin().is_terminal() => InputSource::Interactive,
        None => InputSource::Stdin,
    };

    // Open the script before anything else so a bad path fails fast.
    let script = match &args.script {
        Some(path) => match File::open(path) {
            Ok(file) => Some(file),
            Err(source) => {
                let err = ShellError::ScriptOpen {
                    path: path.clone(),
                    source,
                };
                // Only a missing script is reported; other failures exit quietly.
                if err.status() == 127 {
                    let prog = argv.first().map_or("hsh", String::as_str);
                    eprintln!("{prog}: 0: {err}");
                }
                std::process::exit(err.status());
            }
        },
        None => None,
    };

    let config = ShellConfig::new(source, &env);
    let interactive = config.is_interactive();
    let mut shell = Interpreter::new(config, SessionState::new(env, argv));

    let code = match script {
        Some(file) => shell.run(&mut ReaderSource::new(BufReader::new(file))),
        None if interactive => {
            if let Err(e) = hsh::signals::catch_interrupts() {
                tracing::warn!("failed to install SIGINT handler: {e}");
            }
            match EditorSource::new() {
                Ok(mut editor) => shell.run(&mut editor),
                Err(e) => {
                    tracing::warn!("line editor unavailable, reading plain stdin: {e:#}");
                    shell.run(&mut ReaderSource::new(std::io::stdin().lock()))
                }
            }
        }
        None => shell.run(&mut ReaderSource::new(std::io::stdin().lock())),
    };

    std::process::exit(code);
}
