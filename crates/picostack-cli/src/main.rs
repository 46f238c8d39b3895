mod dispatch;

use clap::error::ErrorKind;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use picostack_core::action::{Action, USAGE};
use picostack_core::Deescalation;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "picostack",
    about = "Start and stop the picostack daemon",
    version,
    override_usage = "picostack [OPTIONS] {start|stop}"
)]
pub(crate) struct Cli {
    /// YAML config file (default: /etc/picostack/lifecycle.yaml if present)
    #[arg(long, env = "PICOSTACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Control binary to delegate to
    #[arg(long, env = "PICOSTACK_BINARY")]
    pub binary: Option<PathBuf>,

    /// User the control binary runs as
    #[arg(long, env = "PICOSTACK_USER")]
    pub user: Option<String>,

    /// Group the control binary runs as
    #[arg(long, env = "PICOSTACK_GROUP")]
    pub group: Option<String>,

    /// Lock marker touched on every start/stop
    #[arg(long, env = "PICOSTACK_LOCK_FILE")]
    pub lock_file: Option<PathBuf>,

    /// How to switch identity: sudo or none
    #[arg(long, env = "PICOSTACK_DEESCALATION")]
    pub deescalation: Option<Deescalation>,

    /// Exit non-zero when a control call fails
    #[arg(
        long,
        env = "PICOSTACK_STRICT",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub strict: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// start or stop
    pub action: Option<String>,

    /// Ignored, like anything after the action in an init script call
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprint!("{e}");
            usage()
        }
    };

    init_logging(cli.verbose);
    if !cli.rest.is_empty() {
        tracing::debug!(ignored = ?cli.rest, "extra arguments after the action");
    }

    let Some(action) = cli.action.as_deref().and_then(Action::parse) else {
        tracing::debug!(arg = ?cli.action, "unrecognized action");
        usage();
    };

    match dispatch::run(&cli, action) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn usage() -> ! {
    println!("{USAGE}");
    std::process::exit(1);
}

/// Logs go to stderr; stdout carries only status lines and usage.
/// `-v` enables the dispatcher's own targets; `RUST_LOG` can add more.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for target in ["picostack", "picostack_core"] {
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
