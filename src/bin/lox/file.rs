use std::{fs, path::Path, process::ExitCode, time::Instant};

use lox::Lox;
use tracing::debug;

use crate::{EX_NOINPUT, EX_SOFTWARE};

/// Runs the script at `path`, printing its output and then any diagnostics.
pub fn run(lox: &mut Lox, path: &Path) -> ExitCode {
    // Invalid UTF-8 is replaced rather than rejected
    let source = match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(error) => {
            eprintln!("Could not read {}: {error}", path.display());
            return ExitCode::from(EX_NOINPUT);
        }
    };

    let start = Instant::now();
    let output = lox.run(&source);
    debug!(elapsed = ?start.elapsed(), path = %path.display(), "ran script");

    for line in output {
        println!("{line}");
    }

    if lox.has_errors() {
        for error in lox.formatted_errors() {
            eprint!("{error}");
        }
        return ExitCode::from(EX_SOFTWARE);
    }

    ExitCode::SUCCESS
}
