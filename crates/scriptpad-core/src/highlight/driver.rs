/// Re-highlights the lines touched by each buffer edit.
use scriptpad_config::AppConfig;

use crate::text::{char_len, TextRange};

use super::classifier::{StyledSpan, TokenClassifier};

/// What the host reports after every buffer mutation.
#[derive(Debug, Clone, Copy)]
pub struct EditNotification<'a> {
    /// The full text after the edit.
    pub text: &'a str,
    /// The range of `text` the edit produced.
    pub edited: TextRange,
    /// Change in total length, in chars.
    pub length_delta: isize,
    /// False for attribute-only edits, which never need re-highlighting.
    pub characters_changed: bool,
}

impl<'a> EditNotification<'a> {
    /// A character edit.
    pub fn characters(text: &'a str, edited: TextRange, length_delta: isize) -> Self {
        Self {
            text,
            edited,
            length_delta,
            characters_changed: true,
        }
    }

    /// True for a programmatic full-text assignment: zero length delta and an
    /// edited range covering the whole text.
    pub fn is_full_replacement(&self) -> bool {
        self.length_delta == 0
            && self.edited.start == 0
            && self.edited.len == char_len(self.text)
    }
}

/// The rendering side of highlighting: applies spans in order, then drops them.
pub trait SpanSink {
    fn apply_spans(&mut self, spans: &[StyledSpan]);
}

impl SpanSink for Vec<StyledSpan> {
    fn apply_spans(&mut self, spans: &[StyledSpan]) {
        self.extend_from_slice(spans);
    }
}

/// Owns the category table and runs it over edited ranges.
#[derive(Debug)]
pub struct HighlightDriver {
    classifier: TokenClassifier,
    rehighlight_full_replacement: bool,
}

impl HighlightDriver {
    pub fn new(classifier: TokenClassifier, rehighlight_full_replacement: bool) -> Self {
        Self {
            classifier,
            rehighlight_full_replacement,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            TokenClassifier::from_config(config),
            config.editor.rehighlight_full_replacement,
        )
    }

    pub fn classifier(&self) -> &TokenClassifier {
        &self.classifier
    }

    /// Returns the spans for an edit, or `None` when the edit is skipped.
    pub fn on_edit(&self, edit: &EditNotification<'_>) -> Option<Vec<StyledSpan>> {
        if !edit.characters_changed {
            return None;
        }
        if !self.rehighlight_full_replacement && edit.is_full_replacement() {
            tracing::trace!("Skipping highlight for full-text assignment");
            return None;
        }
        Some(self.classifier.classify(edit.text, edit.edited))
    }

    /// Runs `on_edit` and hands the spans to `sink`. Returns whether anything was applied.
    pub fn forward(&self, edit: &EditNotification<'_>, sink: &mut dyn SpanSink) -> bool {
        match self.on_edit(edit) {
            Some(spans) => {
                sink.apply_spans(&spans);
                true
            }
            None => false,
        }
    }

    /// Classifies the whole text, regardless of the replacement flag.
    pub fn highlight_all(&self, text: &str) -> Vec<StyledSpan> {
        self.classifier
            .classify(text, TextRange::new(0, char_len(text)))
    }
}
