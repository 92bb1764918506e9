use std::fmt::Write;

use colored::Colorize;
use lox::report::{annotate, margin_width, Diagnostic};

/// Renders a diagnostic like the library's plain formatter, with the tag, margin and markers coloured.
pub fn render(diagnostic: &Diagnostic, source: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "error:".red().bold(), diagnostic.message.bold());

    if let Some(position) = diagnostic.position {
        let width = margin_width(&position);
        let bar = "|".blue().bold();

        for line in annotate(position, source) {
            let number = format!("{:<width$}", line.number);
            let _ = writeln!(out, "{} {bar} {}", number.blue().bold(), line.text);
            let _ = writeln!(
                out,
                "{:width$} {bar} {}{}",
                "",
                " ".repeat(line.start),
                line.marker().red().bold()
            );
        }
    }

    out
}
