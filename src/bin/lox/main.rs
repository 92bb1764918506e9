//! The `lox` command: runs a script, or starts a REPL when none is given.

mod file;
mod repl;
mod style;

use std::{path::PathBuf, process::ExitCode};

use clap::{error::ErrorKind, Parser};
use lox::Lox;
use tracing_subscriber::{filter::LevelFilter, fmt::Layer, prelude::*, EnvFilter};

// Exit statuses, as in sysexits.h
const EX_USAGE: u8 = 64;
const EX_NOINPUT: u8 = 66;
const EX_SOFTWARE: u8 = 70;

/// Environment variable holding the log filter, e.g. `LOX_LOG=lox=debug`.
const LOG_ENV: &str = "LOX_LOG";

/// A tree-walking interpreter for the Lox language.
#[derive(Parser, Debug)]
#[command(name = "lox", version)]
struct Args {
    /// The script to run. Starts an interactive prompt when omitted
    script: Option<PathBuf>,

    /// Print diagnostics without colours
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            let _ = error.print();
            return match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EX_USAGE),
            };
        }
    };

    init_tracing();

    if args.no_color {
        colored::control::set_override(false);
    }

    let mut lox = Lox::with_formatter(style::render);

    match args.script {
        Some(path) => file::run(&mut lox, &path),
        None => match repl::run(&mut lox) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("{error}");
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let subscriber = tracing_subscriber::registry().with(
        Layer::new()
            .with_writer(std::io::stderr)
            .with_filter(filter),
    );

    if let Err(error) = subscriber.try_init() {
        eprintln!("Failed to set up logging: {error}");
    }
}
