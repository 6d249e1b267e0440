//! authsource - inspect and maintain a credential source registry.
//!
//! Builds the registry the same way a service would (environment variables
//! first, then `configs/auth/`), runs one command against it, and prints the
//! result as JSON on stdout. Logs go to stderr.

mod config;

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use authsource_core::{AuthIndex, AuthSource};
use serde::Serialize;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;

// ============================================================================
// Constants
// ============================================================================

/// Log filter when neither `RUST_LOG` nor the config file sets one
const DEFAULT_LOG_FILTER: &str = "info";

const USAGE: &str = "\
Usage: authsource [--dir PATH] [COMMAND]

Commands:
  status       Print discovered, available and invalid sources (default)
  show <N>     Print the credential record for index N
  remove <N>   Delete the credential file for index N
  reload       Force a full re-validation, then print status";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Status,
    Show(String),
    Remove(String),
    Reload,
    Help,
}

#[derive(Debug)]
struct Args {
    dir: Option<PathBuf>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut dir = None;
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dir" => {
                let path = iter.next().context("--dir requires a path")?;
                dir = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                return Ok(Args {
                    dir,
                    command: Command::Help,
                })
            }
            _ => rest.push(arg.as_str()),
        }
    }

    let command = match rest.as_slice() {
        [] | ["status"] => Command::Status,
        ["reload"] => Command::Reload,
        ["show", index] => Command::Show(index.to_string()),
        ["remove", index] => Command::Remove(index.to_string()),
        ["show"] | ["remove"] => bail!("missing account index\n\n{}", USAGE),
        other => bail!("unrecognized arguments: {}\n\n{}", other.join(" "), USAGE),
    };

    Ok(Args { dir, command })
}

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes buffered log lines on drop and must be held
/// until the process exits.
fn init_tracing(default_filter: &str) -> WorkerGuard {
    // RUST_LOG wins over the configured default
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{}", out);
    Ok(())
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found).
    // Must happen before the registry picks its mode.
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args)?;
    if args.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load()?;
    if let Some(dir) = args.dir {
        config.source.auth_dir = dir;
    }

    let _guard = init_tracing(config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER));
    info!("authsource starting");

    let mut source = AuthSource::new(&config.source);

    match args.command {
        Command::Status | Command::Help => print_json(&source.status())?,
        Command::Reload => {
            source.reload(true);
            print_json(&source.status())?;
        }
        Command::Show(raw) => {
            let index: AuthIndex = raw.parse()?;
            match source.get_record(index) {
                Some(record) => print_json(&record)?,
                None => bail!("no available credential source for account #{}", index),
            }
        }
        Command::Remove(raw) => {
            let removal = source
                .remove_raw(&raw)
                .with_context(|| format!("Failed to remove account #{}", raw))?;
            print_json(&removal)?;
        }
    }

    Ok(())
}
