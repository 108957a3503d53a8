/// Compiler diagnostic parsing: turns captured stderr into located records
/// and a styled, linked output chunk.
use std::fmt;

use regex::Regex;
use scriptpad_config::{HexColor, OutputColors};

use crate::highlight::Style;
use crate::output::{OutputLink, OutputSpan, StyledText};
use crate::position::JumpTarget;
use crate::text::{CharCursor, TextRange};

/// `<file>:<row>:<column>: <severity>: <message>`, the message running
/// lazily up to a blank line or the end of the text. A final line break is
/// left out of the message, and `\r\n` counts as a line break.
const DIAGNOSTIC_PATTERN: &str =
    r"(.*):([0-9]+):([0-9]+): (warning|error): ((?:.|\n)*?)(?:\r?\n\r?\n|\r?\n?\z)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// The severity's color in the output pane.
    pub fn color(&self, colors: &OutputColors) -> HexColor {
        match self {
            Self::Warning => colors.warning,
            Self::Error => colors.error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One diagnostic found in error text. Ranges are char offsets into that text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub file: String,
    pub row: usize,
    pub column: usize,
    pub severity: Severity,
    pub message: String,
    /// From the start of the file name to the end of the message.
    pub span_in_error_text: TextRange,
    /// The `row:column` text that carries the jump link.
    pub link_span: TextRange,
}

impl DiagnosticRecord {
    pub fn target(&self) -> JumpTarget {
        JumpTarget::new(self.row, self.column)
    }
}

/// Parses `file:row:col: severity: message` diagnostics.
#[derive(Debug, Clone)]
pub struct DiagnosticParser {
    regex: Regex,
}

impl DiagnosticParser {
    /// Compiles the diagnostic pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(DIAGNOSTIC_PATTERN)?,
        })
    }

    /// Returns every well-formed diagnostic in `error_text`, in text order.
    ///
    /// Lines that do not match are ignored. A match whose row or column is
    /// not a positive integer is skipped.
    pub fn parse(&self, error_text: &str) -> Vec<DiagnosticRecord> {
        let mut cursor = CharCursor::new(error_text);
        let mut records = Vec::new();

        for caps in self.regex.captures_iter(error_text) {
            let (Some(file), Some(row), Some(column), Some(severity), Some(message)) = (
                caps.get(1),
                caps.get(2),
                caps.get(3),
                caps.get(4),
                caps.get(5),
            ) else {
                continue;
            };

            let (row_value, column_value) =
                match (row.as_str().parse::<usize>(), column.as_str().parse::<usize>()) {
                    (Ok(r), Ok(c)) if r > 0 && c > 0 => (r, c),
                    _ => {
                        tracing::debug!(
                            "Skipping malformed diagnostic at {}:{}",
                            row.as_str(),
                            column.as_str()
                        );
                        continue;
                    }
                };
            let Some(severity) = Severity::from_label(severity.as_str()) else {
                continue;
            };

            let start = cursor.char_at(file.start());
            let link_start = cursor.char_at(row.start());
            let link_end = cursor.char_at(column.end());
            let end = cursor.char_at(message.end());

            records.push(DiagnosticRecord {
                file: file.as_str().to_string(),
                row: row_value,
                column: column_value,
                severity,
                message: message.as_str().to_string(),
                span_in_error_text: TextRange::new(start, end - start),
                link_span: TextRange::new(link_start, link_end - link_start),
            });
        }

        records
    }

    /// Parses `error_text` and renders it as one output chunk: default text
    /// color, each diagnostic bold in its severity color, and a link on
    /// every `row:column`.
    pub fn render(
        &self,
        error_text: &str,
        colors: &OutputColors,
    ) -> (StyledText, Vec<DiagnosticRecord>) {
        let records = self.parse(error_text);
        let mut styled = StyledText::plain(error_text, Style::regular(colors.text));

        for record in &records {
            styled.spans.push(OutputSpan {
                range: record.span_in_error_text,
                style: Style::bold(record.severity.color(colors)),
            });
            styled.links.push(OutputLink {
                range: record.link_span,
                target: record.target(),
            });
        }

        (styled, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> DiagnosticParser {
        DiagnosticParser::new().unwrap()
    }

    #[test]
    fn test_single_error() {
        let records = parser().parse("foo.swift:3:5: error: cannot find 'x'\n\n");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.file, "foo.swift");
        assert_eq!((record.row, record.column), (3, 5));
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(record.message, "cannot find 'x'");
        assert_eq!(record.target().payload(), "3,5");
        assert_eq!(record.link_span, TextRange::new(10, 3));
        assert_eq!(record.span_in_error_text, TextRange::new(0, 37));
    }

    #[test]
    fn test_single_trailing_newline_not_in_message() {
        let records = parser().parse("foo.swift:3:5: error: cannot find 'x'\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "cannot find 'x'");
        assert_eq!(records[0].span_in_error_text, TextRange::new(0, 37));
    }

    #[test]
    fn test_crlf_blank_line_separates_diagnostics() {
        let text = "a.swift:1:1: error: x\r\n\r\na.swift:2:2: warning: y\r\n";
        let records = parser().parse(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "x");
        assert_eq!(records[0].span_in_error_text, TextRange::new(0, 21));
        assert_eq!(records[1].file, "a.swift");
        assert_eq!((records[1].row, records[1].column), (2, 2));
        assert_eq!(records[1].message, "y");
    }

    #[test]
    fn test_warning_then_error_at_end_of_text() {
        let text = "main.swift:1:7: warning: unused\n\nmain.swift:2:1: error: boom";
        let records = parser().parse(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].severity, Severity::Warning);
        assert_eq!(records[0].message, "unused");
        assert_eq!(records[1].severity, Severity::Error);
        assert_eq!(records[1].message, "boom");
        assert_eq!(records[1].link_span.start, 44);
    }

    #[test]
    fn test_message_spans_lines_until_blank_line() {
        let text = "a.swift:2:3: error: bad\n  let x\n      ^\n\ntrailing";
        let records = parser().parse(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "bad\n  let x\n      ^");
    }

    #[test]
    fn test_unrelated_lines_ignored() {
        let text = "Compiling...\nfoo.swift:3:5: error: cannot find 'x'\n\nDone\n";
        let records = parser().parse(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file, "foo.swift");
        assert_eq!(records[0].span_in_error_text.start, 13);
    }

    #[test]
    fn test_notes_are_not_diagnostics() {
        assert!(parser().parse("a.swift:1:1: note: see here\n\n").is_empty());
        assert!(parser().parse("nothing to see").is_empty());
        assert!(parser().parse("").is_empty());
    }

    #[test]
    fn test_zero_and_overflowing_positions_skipped() {
        let text = "a:0:5: error: zero\n\nb:99999999999999999999999:1: error: huge\n\nc:4:2: error: ok";
        let records = parser().parse(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file, "c");
    }

    #[test]
    fn test_offsets_are_chars() {
        let text = "é.swift:1:2: error: x";
        let records = parser().parse(text);
        assert_eq!(records[0].link_span, TextRange::new(8, 3));
    }

    // ── Rendering ──────────────────────────────────────────────────────

    #[test]
    fn test_render_styles_and_links() {
        let colors = OutputColors::default();
        let text = "foo.swift:3:5: error: cannot find 'x'\n\n";
        let (styled, records) = parser().render(text, &colors);
        assert_eq!(records.len(), 1);
        assert_eq!(styled.text, text);
        assert_eq!(styled.spans.len(), 2);
        assert_eq!(styled.spans[0].style, Style::regular(colors.text));
        assert_eq!(styled.spans[1].style, Style::bold(colors.error));
        assert_eq!(styled.link_at(11), Some(JumpTarget::new(3, 5)));
        assert_eq!(styled.link_at(0), None);
    }

    #[test]
    fn test_render_warning_color() {
        let colors = OutputColors::default();
        let (styled, _) = parser().render("x:1:1: warning: w", &colors);
        assert_eq!(styled.spans[1].style.foreground, colors.warning);
    }
}
