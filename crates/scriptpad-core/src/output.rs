/// Styled output chunks for the run pane and the size ceiling that clears it.
use scriptpad_config::OutputColors;

use crate::highlight::Style;
use crate::position::JumpTarget;
use crate::text::{char_len, TextRange};

/// A styled char range inside one output chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpan {
    pub range: TextRange,
    pub style: Style,
}

/// A clickable range inside one output chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLink {
    pub range: TextRange,
    pub target: JumpTarget,
}

/// One chunk of output text with its styling. Span and link ranges are
/// relative to `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    pub text: String,
    pub spans: Vec<OutputSpan>,
    pub links: Vec<OutputLink>,
}

impl StyledText {
    /// The whole text in one style.
    pub fn plain(text: impl Into<String>, style: Style) -> Self {
        let text = text.into();
        let spans = if text.is_empty() {
            Vec::new()
        } else {
            vec![OutputSpan {
                range: TextRange::new(0, char_len(&text)),
                style,
            }]
        };
        Self {
            text,
            spans,
            links: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in chars.
    pub fn len_chars(&self) -> usize {
        char_len(&self.text)
    }

    /// Returns the link under char `offset`, if any.
    pub fn link_at(&self, offset: usize) -> Option<JumpTarget> {
        self.links
            .iter()
            .find(|link| link.range.contains(offset))
            .map(|link| link.target)
    }
}

/// What the host applies to its output pane, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Append(StyledText),
    /// Empties the pane. Distinct from appending an empty chunk.
    Clear,
}

/// Default-styled stdout text.
pub fn stdout_chunk(text: impl Into<String>, colors: &OutputColors) -> StyledText {
    StyledText::plain(text, Style::regular(colors.text))
}

/// The line printed after the child exits.
pub fn exit_trailer(code: i32, colors: &OutputColors) -> StyledText {
    let color = if code == 0 {
        colors.exit_success
    } else {
        colors.exit_failure
    };
    StyledText::plain(
        format!("\nProcess exited with code {code}\n\n\n"),
        Style::regular(color),
    )
}

/// Tracks how much text the pane holds and resets it past a ceiling.
#[derive(Debug, Clone)]
pub struct OutputLog {
    max_chars: usize,
    accumulated: usize,
}

impl OutputLog {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            accumulated: 0,
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Chars appended since the last clear.
    pub fn accumulated(&self) -> usize {
        self.accumulated
    }

    /// Queues `chunk`, preceded by a clear when the pane is already over the ceiling.
    pub fn append(&mut self, chunk: StyledText, events: &mut Vec<OutputEvent>) {
        if chunk.is_empty() {
            return;
        }
        if self.accumulated > self.max_chars {
            tracing::debug!(
                "Output reached {} chars (ceiling {}), clearing",
                self.accumulated,
                self.max_chars
            );
            self.clear(events);
        }
        self.accumulated += chunk.len_chars();
        events.push(OutputEvent::Append(chunk));
    }

    pub fn clear(&mut self, events: &mut Vec<OutputEvent>) {
        self.accumulated = 0;
        events.push(OutputEvent::Clear);
    }
}
