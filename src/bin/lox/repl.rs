use lox::Lox;
use rustyline::{error::ReadlineError, Config, DefaultEditor};

const PROMPT: &str = ">> ";
const HISTORY_SIZE: usize = 1000;

/// Reads and runs one line at a time until `exit` or the end of input.
/// Declarations persist from one line to the next.
pub fn run(lox: &mut Lox) -> Result<(), ReadlineError> {
    let config = Config::builder()
        .max_history_size(HISTORY_SIZE)?
        .history_ignore_dups(true)?
        .build();
    let mut rl = DefaultEditor::with_config(config)?;

    println!("lox: Lox interpreter - v{}", env!("CARGO_PKG_VERSION"));
    println!("To exit, press Ctrl+d or type \"exit\"");

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                if line == "exit" {
                    return Ok(());
                }

                for output in lox.run(line) {
                    println!("{output}");
                }
                for error in lox.formatted_errors() {
                    eprint!("{error}");
                }
            }
            // Ctrl-C drops the line being edited
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!();
                return Ok(());
            }
            Err(error) => return Err(error),
        }
    }
}
