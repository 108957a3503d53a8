//! Mapping between 1-based `(row, column)` positions and char offsets.
//!
//! Rows and columns are 1-based because that is what compilers print in
//! their diagnostics. Offsets are 0-based char indices.

pub mod gutter;

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::text::TextRange;

/// Returns the char offset of `(row, column)` in `text`.
///
/// Columns only advance while walking the target row, and a newline moves to
/// the next row. A position that is never reached (row or column past the
/// end) clamps to the total char count, so this never fails.
pub fn offset_for(row: usize, column: usize, text: &str) -> usize {
    let mut current_row = 1;
    let mut current_col = 1;
    let mut count = 0;

    for ch in text.chars() {
        if current_row == row && current_col == column {
            return count;
        }
        if ch == '\n' {
            current_row += 1;
        } else if current_row == row {
            current_col += 1;
        }
        count += 1;
    }
    count
}

/// Returns the 1-based `(row, column)` of char `offset`.
///
/// Offsets past the end resolve to the position just after the last char.
pub fn position_at(offset: usize, text: &str) -> (usize, usize) {
    let mut row = 1;
    let mut column = 1;
    for ch in text.chars().take(offset) {
        if ch == '\n' {
            row += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (row, column)
}

/// Returns the 1-based line number holding char `offset`.
pub fn line_number_at(offset: usize, text: &str) -> usize {
    1 + text.chars().take(offset).filter(|&c| c == '\n').count()
}

/// A diagnostic location the user can jump to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JumpTarget {
    pub row: usize,
    pub column: usize,
}

impl JumpTarget {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// The link payload attached to output text: `"row,column"`.
    pub fn payload(&self) -> String {
        self.to_string()
    }

    /// Resolves the target against `text` to an absolute char offset.
    pub fn resolve(&self, text: &str) -> usize {
        offset_for(self.row, self.column, text)
    }

    /// Resolves the target to a "select and scroll" command with an empty selection.
    pub fn selection_in(&self, text: &str) -> SelectionCommand {
        SelectionCommand {
            selection: TextRange::caret(self.resolve(text)),
            scroll_into_view: true,
        }
    }
}

impl fmt::Display for JumpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.column)
    }
}

impl FromStr for JumpTarget {
    type Err = anyhow::Error;

    fn from_str(payload: &str) -> Result<Self> {
        let (row, column) = payload
            .split_once(',')
            .with_context(|| format!("jump payload {payload:?} is not \"row,column\""))?;
        let row = row
            .trim()
            .parse()
            .with_context(|| format!("invalid row in jump payload {payload:?}"))?;
        let column = column
            .trim()
            .parse()
            .with_context(|| format!("invalid column in jump payload {payload:?}"))?;
        Ok(Self { row, column })
    }
}

/// Instruction to the host: select `selection` and scroll it into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCommand {
    pub selection: TextRange,
    pub scroll_into_view: bool,
}
