/// Smart indentation: brace-depth indent on newline, de-indent on `}`, and
/// indent style detection for loaded files.
use std::cmp::Reverse;
use std::collections::BTreeMap;

use scriptpad_config::MAX_SPACE_WIDTH;
pub use scriptpad_config::IndentStyle;

/// What to do with a keystroke.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndentDecision {
    /// Text to insert at the caret in place of the typed character.
    pub inserted_text: String,
    /// Number of chars immediately before the caret that `inserted_text` replaces.
    pub delete_before: usize,
    /// When false the caller performs its default insertion and ignores the rest.
    pub suppress_default_insertion: bool,
}

impl IndentDecision {
    /// Let the host insert the typed character as usual.
    pub fn fall_through() -> Self {
        Self::default()
    }

    fn replace(delete_before: usize, inserted_text: String) -> Self {
        Self {
            inserted_text,
            delete_before,
            suppress_default_insertion: true,
        }
    }
}

/// Tracks brace depth one char at a time, skipping `//` line comments.
#[derive(Debug, Default)]
struct BraceScanner {
    depth: usize,
    in_line_comment: bool,
    prev_slash: bool,
}

impl BraceScanner {
    fn feed(&mut self, ch: char) {
        match ch {
            '/' => {
                if self.prev_slash {
                    self.in_line_comment = true;
                }
                self.prev_slash = true;
                return;
            }
            '\n' => self.in_line_comment = false,
            '{' if !self.in_line_comment => self.depth += 1,
            '}' if !self.in_line_comment => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        self.prev_slash = false;
    }
}

/// Returns the brace nesting depth at the end of `text_before_caret`.
///
/// `{` opens and `}` closes (never below zero). Braces after `//` up to the
/// end of that line are ignored. Block comments and string literals are not
/// tracked, so braces inside them still count.
pub fn indent_depth(text_before_caret: &str) -> usize {
    let mut scanner = BraceScanner::default();
    text_before_caret.chars().for_each(|ch| scanner.feed(ch));
    scanner.depth
}

/// Keystroke handling for one indent unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndentEngine {
    unit: IndentStyle,
}

impl IndentEngine {
    pub fn new(unit: IndentStyle) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> IndentStyle {
        self.unit
    }

    /// Enter: a newline followed by one unit per open brace. Depth 0 falls through.
    pub fn on_newline(&self, text_before_caret: &str) -> IndentDecision {
        let depth = indent_depth(text_before_caret);
        if depth == 0 {
            return IndentDecision::fall_through();
        }
        let text = format!("\n{}", self.unit.repeat(depth));
        IndentDecision::replace(0, text)
    }

    /// `}`: when the caret sits right after one indent unit, the brace takes
    /// that unit's place.
    pub fn on_close_brace(&self, text_before_caret: &str) -> IndentDecision {
        if text_before_caret.ends_with(&self.unit.repeat(1)) {
            IndentDecision::replace(self.unit.width(), "}".to_string())
        } else {
            IndentDecision::fall_through()
        }
    }

    /// Dispatches a typed character to the matching rule.
    pub fn on_keystroke(&self, typed: char, text_before_caret: &str) -> IndentDecision {
        match typed {
            '\n' => self.on_newline(text_before_caret),
            '}' => self.on_close_brace(text_before_caret),
            _ => IndentDecision::fall_through(),
        }
    }
}

/// Infers the indent unit from lines nested inside braces.
///
/// Each non-blank line at brace depth `d` casts a vote: a leading tab votes
/// for tabs, `n` leading spaces vote for `Spaces(n / d)` when `d` divides `n`.
/// A line opening with `}` is measured one level out. Returns `None` when no
/// line votes.
pub fn detect_indent(text: &str) -> Option<IndentStyle> {
    let mut scanner = BraceScanner::default();
    let mut tab_votes = 0usize;
    let mut width_votes: BTreeMap<usize, usize> = BTreeMap::new();

    for line in text.split('\n') {
        let body = line.trim_start_matches([' ', '\t']);
        let depth = if body.starts_with('}') {
            scanner.depth.saturating_sub(1)
        } else {
            scanner.depth
        };

        if depth > 0 && !body.trim().is_empty() {
            match line.chars().next() {
                Some('\t') => tab_votes += 1,
                Some(' ') => {
                    let spaces = line.len() - line.trim_start_matches(' ').len();
                    let width = spaces / depth;
                    if spaces % depth == 0 && (1..=MAX_SPACE_WIDTH).contains(&width) {
                        *width_votes.entry(width).or_default() += 1;
                    }
                }
                _ => {}
            }
        }

        line.chars().for_each(|ch| scanner.feed(ch));
        scanner.feed('\n');
    }

    let space_votes: usize = width_votes.values().sum();
    if tab_votes > 0 && tab_votes >= space_votes {
        return Some(IndentStyle::Tabs);
    }
    // Ties go to the narrower unit.
    width_votes
        .into_iter()
        .max_by_key(|&(width, votes)| (votes, Reverse(width)))
        .map(|(width, _)| IndentStyle::Spaces(width))
}
