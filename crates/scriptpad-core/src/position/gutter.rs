/// Line-number gutter: numbering for the visible lines and selection marks.
use crate::text::{char_len, TextRange};

use super::line_number_at;

/// One row of the gutter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GutterLine {
    /// 1-based line number shown in the gutter.
    pub number: usize,
    /// The line's chars, including its trailing newline.
    pub range: TextRange,
    /// Whether any selection touches this line.
    pub selected: bool,
}

/// Splits `text` into line ranges. A trailing newline yields a final empty line.
fn line_ranges(text: &str) -> Vec<TextRange> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        let len = char_len(line);
        ranges.push(TextRange::new(start, len));
        start += len;
    }
    if text.is_empty() || text.ends_with('\n') {
        ranges.push(TextRange::caret(start));
    }
    ranges
}

/// Builds the gutter rows for the lines overlapping `visible`.
///
/// A caret marks the line it sits on; a caret at or past the end of the text
/// marks the last visible line. A non-empty selection marks every line it
/// shares a char with.
pub fn gutter_lines(text: &str, visible: TextRange, selections: &[TextRange]) -> Vec<GutterLine> {
    let total = char_len(text);
    let first_number = line_number_at(visible.start, text);

    let rows: Vec<TextRange> = line_ranges(text)
        .into_iter()
        .skip(first_number - 1)
        .take_while(|line| line.start <= visible.end())
        .filter(|line| {
            line.start < visible.end()
                || line.start == visible.start
                || (line.is_empty() && line.start == total)
        })
        .collect();

    let last = rows.len().saturating_sub(1);
    rows.into_iter()
        .enumerate()
        .map(|(i, range)| {
            let selected = selections.iter().any(|sel| {
                if sel.is_empty() {
                    range.contains(sel.start) || (sel.start >= total && i == last)
                } else {
                    sel.overlaps(&range)
                }
            });
            GutterLine {
                number: first_number + i,
                range,
                selected,
            }
        })
        .collect()
}
