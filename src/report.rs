use std::fmt::{Display, Write};

use crate::span::SourcePosition;

/// Errors that may point at a region of the source.
pub trait Positioned {
    fn position(&self) -> Option<SourcePosition>;
}

/// A single reported error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub position: Option<SourcePosition>,
}

/// Renders a diagnostic against the source text it was reported for.
pub type Formatter = fn(&Diagnostic, &str) -> String;

/// Collects the diagnostics of every stage of a run.
///
/// The reporter keeps its own copy of the source being run so that diagnostics can be
/// rendered after the tokens and syntax tree that produced them are gone.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    source: String,
    formatter: Formatter,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::with_formatter(render)
    }

    pub fn with_formatter(formatter: Formatter) -> Self {
        ErrorReporter {
            diagnostics: Vec::new(),
            source: String::new(),
            formatter,
        }
    }

    pub fn set_source(&mut self, source: &str) {
        self.source.clear();
        self.source.push_str(source);
    }

    pub fn report<E: Display + Positioned + ?Sized>(&mut self, error: &E) {
        self.error(error.to_string(), error.position());
    }

    pub fn error(&mut self, message: impl Into<String>, position: Option<SourcePosition>) {
        self.diagnostics.push(Diagnostic {
            message: message.into(),
            position,
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Every diagnostic rendered with this reporter's formatter, in the order they were reported.
    pub fn formatted(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .map(|diagnostic| (self.formatter)(diagnostic, &self.source))
            .collect()
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// One source line covered by a diagnostic, with the columns to mark on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotatedLine<'s> {
    pub number: u32,
    pub text: &'s str,
    pub start: usize,
    pub end: usize,
}

impl<'s> AnnotatedLine<'s> {
    /// The `^~~~` marker, without the leading padding.
    pub fn marker(&self) -> String {
        let mut marker = String::from("^");
        marker.push_str(&"~".repeat(self.end.saturating_sub(self.start + 1)));
        marker
    }
}

/// Splits the source covered by `position` into lines, each knowing which of its columns are marked.
/// The first line is marked from the start column, the last one up to the end column, and any line in
/// between is marked entirely.
pub fn annotate(position: SourcePosition, source: &str) -> Vec<AnnotatedLine<'_>> {
    let last = position.line_count() as usize - 1;

    position
        .source_substr(source)
        .split('\n')
        .enumerate()
        .map(|(index, text)| {
            let text = text.strip_suffix('\r').unwrap_or(text);
            let start = if index == 0 {
                position.start_col as usize
            } else {
                0
            };
            let end = if index == last {
                position.end_col as usize
            } else {
                text.chars().count()
            };

            AnnotatedLine {
                number: position.start_line + index as u32,
                text,
                start,
                end,
            }
        })
        .collect()
}

/// Width of the line number margin, sized for the largest line number shown.
pub fn margin_width(position: &SourcePosition) -> usize {
    position.end_line.to_string().len()
}

/// The default, uncoloured formatter.
pub fn render(diagnostic: &Diagnostic, source: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "error: {}", diagnostic.message);

    if let Some(position) = diagnostic.position {
        let width = margin_width(&position);
        for line in annotate(position, source) {
            let _ = writeln!(out, "{:<width$} | {}", line.number, line.text);
            let _ = writeln!(
                out,
                "{:width$} | {}{}",
                "",
                " ".repeat(line.start),
                line.marker()
            );
        }
    }

    out
}
