use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use crate::{
    ast::Parser,
    lex::Lexer,
    report::{Diagnostic, ErrorReporter, Formatter},
    rt::TreeWalker,
};

/// A Lox session: runs sources one after another over the same global environment.
#[derive(Debug, Clone, Default)]
pub struct Lox {
    reporter: ErrorReporter,
    walker: TreeWalker,
}

impl Lox {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session whose diagnostics are rendered by `formatter`.
    pub fn with_formatter(formatter: Formatter) -> Self {
        Lox {
            reporter: ErrorReporter::with_formatter(formatter),
            walker: TreeWalker::new(),
        }
    }

    /// Lexes, parses and interprets `source`, stopping at the first stage that reports errors.
    ///
    /// Returns the lines printed by the program. If it failed at runtime these are the lines printed before
    /// the failure. Errors from a previous run are discarded first.
    pub fn run(&mut self, source: &str) -> Vec<String> {
        self.reporter.clear();
        self.reporter.set_source(source);

        let Lox { reporter, walker } = self;

        let Some(tokens) = guarded("lexing", reporter, |reporter| {
            Lexer::new(source).scan(reporter)
        }) else {
            return Vec::new();
        };

        let Some(statements) = guarded("parsing", reporter, |reporter| {
            Parser::new(&tokens).parse_with(reporter)
        }) else {
            return Vec::new();
        };

        let output = guarded("interpreting", reporter, |reporter| {
            walker.interpret(&statements, reporter)
        });

        match output {
            Some(output) => output,
            None => {
                walker.unwind();
                walker.take_output()
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        self.reporter.has_errors()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.reporter.diagnostics()
    }

    /// The diagnostics of the last run, rendered with the session's formatter.
    pub fn formatted_errors(&self) -> Vec<String> {
        self.reporter.formatted()
    }
}

/// Runs one stage of the pipeline, turning a panic inside it into a reported error.
fn guarded<T>(
    stage: &str,
    reporter: &mut ErrorReporter,
    f: impl FnOnce(&mut ErrorReporter) -> Option<T>,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(|| f(reporter))) {
        Ok(result) => {
            if result.is_none() {
                debug!(stage, "stage reported errors");
            }
            result
        }
        Err(_) => {
            error!(stage, "stage panicked");
            reporter.error(format!("Unexpected error while {stage}"), None);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_lexing_errors() {
        let mut lox = Lox::new();
        let output = lox.run("print 1; print @;");

        assert!(output.is_empty());
        assert_eq!(lox.diagnostics().len(), 1);
        assert_eq!(lox.diagnostics()[0].message, "Unexpected character '@'.");
    }

    #[test]
    fn stops_at_parsing_errors() {
        let mut lox = Lox::new();
        let output = lox.run("print 1; print 2");

        assert!(output.is_empty());
        assert_eq!(
            lox.diagnostics()[0].message,
            "Expected ';' after value at end."
        );
    }

    #[test]
    fn panics_are_reported() {
        let mut reporter = ErrorReporter::new();
        let result: Option<()> = guarded("interpreting", &mut reporter, |_| panic!("boom"));

        assert!(result.is_none());
        assert_eq!(
            reporter.diagnostics(),
            [Diagnostic {
                message: "Unexpected error while interpreting".to_string(),
                position: None,
            }]
        );
    }
}
