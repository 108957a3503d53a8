/// Indent unit configuration.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Widest space unit accepted from config or detection.
pub const MAX_SPACE_WIDTH: usize = 16;

/// What one brace nesting level inserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndentStyle {
    Spaces(usize),
    #[default]
    Tabs,
}

impl fmt::Display for IndentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Tabs => f.write_str("tabs"),
            Self::Spaces(1) => f.write_str("1 space"),
            Self::Spaces(width) => write!(f, "{width} spaces"),
        }
    }
}

impl IndentStyle {
    /// Chars taken by a single level.
    pub fn width(self) -> usize {
        match self {
            Self::Tabs => 1,
            Self::Spaces(width) => width,
        }
    }

    /// Leading whitespace for `levels` levels of nesting.
    pub fn repeat(self, levels: usize) -> String {
        let (ch, count) = match self {
            Self::Tabs => ('\t', levels),
            Self::Spaces(width) => (' ', width * levels),
        };
        std::iter::repeat(ch).take(count).collect()
    }

    /// Clamps a space width into `1..=MAX_SPACE_WIDTH`.
    pub fn sanitized(self) -> Self {
        match self {
            Self::Spaces(width) => Self::Spaces(width.clamp(1, MAX_SPACE_WIDTH)),
            Self::Tabs => Self::Tabs,
        }
    }
}
