/// Lexical categories, their default patterns, and display styles.
use std::fmt;

use scriptpad_config::{HexColor, SyntaxColors};

/// A lexical class recognised by the highlighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Character,
    Number,
    Keyword,
    TypeName,
    String,
    Comment,
}

impl CategoryKind {
    /// Highest precedence first. Short, strict patterns come before the
    /// greedy string and comment patterns so they are not shadowed.
    pub const PRECEDENCE: [CategoryKind; 6] = [
        Self::Character,
        Self::Number,
        Self::Keyword,
        Self::TypeName,
        Self::String,
        Self::Comment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Number => "number",
            Self::Keyword => "keyword",
            Self::TypeName => "type-name",
            Self::String => "string",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a span of text is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Style {
    pub foreground: HexColor,
    pub bold: bool,
}

impl Style {
    pub const fn regular(foreground: HexColor) -> Self {
        Self {
            foreground,
            bold: false,
        }
    }

    pub const fn bold(foreground: HexColor) -> Self {
        Self {
            foreground,
            bold: true,
        }
    }
}

/// A named pattern and the style applied to its matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub kind: CategoryKind,
    pub pattern: String,
    pub style: Style,
}

impl Category {
    pub fn new(kind: CategoryKind, pattern: impl Into<String>, style: Style) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            style,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

pub const CHARACTER_PATTERN: &str = r"'(?:\\.|[^'\\]*)'";
pub const NUMBER_PATTERN: &str = r"\b\d+(?:\.\d+)?\b";
pub const TYPE_NAME_PATTERN: &str = r"\b[A-Z][A-Za-z0-9_]*\b";
pub const STRING_PATTERN: &str = r#""(?:\\.|[^"\\])*""#;
/// Closed block comments, block comments left open to the end of the
/// scanned region, and line comments.
pub const COMMENT_PATTERN: &str = r"/\*[\s\S]*?\*/|/\*[\s\S]*$|//.*";

/// Builds a whole-word alternation of `keywords`, escaping each one.
///
/// Returns `None` for an empty list, which would otherwise match the empty
/// string at every word boundary.
pub fn keyword_pattern<S: AsRef<str>>(keywords: &[S]) -> Option<String> {
    if keywords.is_empty() {
        return None;
    }
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    Some(format!(r"\b(?:{alternation})\b"))
}

/// The built-in category table in precedence order.
pub fn default_categories<S: AsRef<str>>(colors: &SyntaxColors, keywords: &[S]) -> Vec<Category> {
    CategoryKind::PRECEDENCE
        .iter()
        .filter_map(|&kind| {
            let category = match kind {
                CategoryKind::Character => {
                    Category::new(kind, CHARACTER_PATTERN, Style::regular(colors.character))
                }
                CategoryKind::Number => {
                    Category::new(kind, NUMBER_PATTERN, Style::regular(colors.number))
                }
                CategoryKind::Keyword => {
                    Category::new(kind, keyword_pattern(keywords)?, Style::bold(colors.keyword))
                }
                CategoryKind::TypeName => {
                    Category::new(kind, TYPE_NAME_PATTERN, Style::bold(colors.type_name))
                }
                CategoryKind::String => {
                    Category::new(kind, STRING_PATTERN, Style::regular(colors.string))
                }
                CategoryKind::Comment => {
                    Category::new(kind, COMMENT_PATTERN, Style::regular(colors.comment))
                }
            };
            Some(category)
        })
        .collect()
}
