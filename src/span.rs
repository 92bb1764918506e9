use std::fmt::Display;

/// A region of the source text, used to point diagnostics at the code that caused them.
///
/// Lines are 1-indexed. Columns are 0-based offsets inside their own line and `end_col` is exclusive,
/// so a single character at the start of a line spans columns `0..1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    pub start_line: u32,
    pub end_line: u32,
    pub start_col: u32,
    pub end_col: u32,
}

impl SourcePosition {
    pub fn new(start_line: u32, end_line: u32, start_col: u32, end_col: u32) -> Self {
        debug_assert!(end_line >= start_line);

        SourcePosition {
            start_line,
            end_line,
            start_col,
            end_col,
        }
    }

    /// A zero-width position right after the end of this one.
    pub fn collapsed_at_end(&self) -> Self {
        SourcePosition::new(self.end_line, self.end_line, self.end_col, self.end_col)
    }

    /// Every source line touched by this position, joined by their newlines.
    /// Returns an empty string if the position lies past the end of `source`.
    pub fn source_substr<'s>(&self, source: &'s str) -> &'s str {
        let mut start = None;
        let mut end = source.len();
        let mut line = 1;

        if self.start_line == 1 {
            start = Some(0);
        }

        for (i, c) in source.char_indices() {
            if c != '\n' {
                continue;
            }

            if line == self.end_line {
                end = i;
                break;
            }

            line += 1;
            if line == self.start_line {
                start = Some(i + 1);
            }
        }

        match start {
            Some(start) => &source[start..end],
            None => "",
        }
    }

    pub fn line_count(&self) -> u32 {
        self.end_line - self.start_line + 1
    }
}

impl Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_substr() {
        let source = "var a = 1;\nprint a;\nprint b;";
        let position = SourcePosition::new(2, 2, 6, 7);
        assert_eq!(position.source_substr(source), "print a;");
    }

    #[test]
    fn multi_line_substr() {
        let source = "one\n\"two\nthree\"\nfour";
        let position = SourcePosition::new(2, 3, 0, 6);
        assert_eq!(position.source_substr(source), "\"two\nthree\"");
    }

    #[test]
    fn last_line_without_newline() {
        let source = "a\nb";
        assert_eq!(SourcePosition::new(2, 2, 0, 1).source_substr(source), "b");
    }

    #[test]
    fn position_past_the_end() {
        assert_eq!(SourcePosition::new(7, 7, 0, 1).source_substr("a\nb"), "");
    }

    #[test]
    fn collapsed_and_displayed() {
        let position = SourcePosition::new(1, 3, 4, 2).collapsed_at_end();
        assert_eq!(position, SourcePosition::new(3, 3, 2, 2));
        assert_eq!(position.to_string(), "3:3");
    }
}
