//! Host-side editing session.
//!
//! An `EditorSession` owns the text buffer and caret, routes keystrokes
//! through the [`IndentEngine`], reports every mutation to the
//! [`HighlightDriver`], keeps the file ending in a newline, and turns jump
//! requests from the output pane into caret moves.

use anyhow::Result;
use scriptpad_config::AppConfig;

use crate::buffer::TextBuffer;
use crate::highlight::{EditNotification, HighlightDriver, StyledSpan};
use crate::indent::{detect_indent, IndentEngine};
use crate::navigation::{self, JumpReceiver, JumpSender};
use crate::position::gutter::{gutter_lines, GutterLine};
use crate::position::{position_at, JumpTarget, SelectionCommand};
use crate::text::TextRange;

/// A single editable script with its caret, highlighter, and indenter.
#[derive(Debug)]
pub struct EditorSession {
    buffer: TextBuffer,
    /// Caret position as a char index.
    caret: usize,
    indent: IndentEngine,
    highlighter: HighlightDriver,
    ensure_trailing_newline: bool,
    detect_indent: bool,
    jump_tx: JumpSender,
    jump_rx: JumpReceiver,
}

impl EditorSession {
    /// Creates an empty session configured from `config`.
    pub fn new(config: &AppConfig) -> Self {
        let (jump_tx, jump_rx) = navigation::channel();
        Self {
            buffer: TextBuffer::new(),
            caret: 0,
            indent: IndentEngine::new(config.editor.indent_style),
            highlighter: HighlightDriver::from_config(config),
            ensure_trailing_newline: config.editor.ensure_trailing_newline,
            detect_indent: config.editor.detect_indent,
            jump_tx,
            jump_rx,
        }
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Moves the caret, clamped to the end of the text.
    pub fn set_caret(&mut self, offset: usize) {
        self.caret = offset.min(self.buffer.len_chars());
    }

    /// 1-based `(row, column)` of the caret.
    pub fn caret_position(&self) -> (usize, usize) {
        position_at(self.caret, &self.text())
    }

    pub fn indent_engine(&self) -> &IndentEngine {
        &self.indent
    }

    pub fn highlighter(&self) -> &HighlightDriver {
        &self.highlighter
    }

    /// Replaces the content with freshly opened text and returns the spans
    /// for the whole buffer.
    ///
    /// Picks up the file's indent style when detection is enabled.
    pub fn load(&mut self, text: &str) -> Vec<StyledSpan> {
        self.buffer.set_text(text);
        self.caret = 0;
        if self.detect_indent {
            if let Some(style) = detect_indent(text) {
                tracing::debug!("Detected indent style: {style}");
                self.indent = IndentEngine::new(style);
            }
        }
        self.enforce_trailing_newline();
        self.highlighter.highlight_all(&self.text())
    }

    /// Programmatic full-text assignment.
    ///
    /// Reported to the highlighter as an edit over the whole text, so it is
    /// skipped when the length is unchanged unless full-replacement
    /// re-highlighting is enabled.
    pub fn set_text(&mut self, text: &str) -> Vec<StyledSpan> {
        let old_len = self.buffer.len_chars();
        self.buffer.set_text(text);
        self.caret = self.caret.min(self.buffer.len_chars());
        let new_len = self.buffer.len_chars();
        let mut spans = self.notify(TextRange::new(0, new_len), new_len as isize - old_len as isize);
        spans.extend(self.enforce_trailing_newline());
        spans
    }

    /// Handles one typed character at the caret.
    ///
    /// Newline and `}` go through the indentation rules; everything else is
    /// inserted as typed. Returns the spans for the touched lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the caret is out of bounds.
    pub fn type_char(&mut self, typed: char) -> Result<Vec<StyledSpan>> {
        let before = self.buffer.text_before(self.caret)?;
        let decision = self.indent.on_keystroke(typed, &before);

        if !decision.suppress_default_insertion {
            let mut utf8 = [0u8; 4];
            return self.insert(typed.encode_utf8(&mut utf8));
        }

        let start = self.caret - decision.delete_before.min(self.caret);
        self.buffer
            .replace(start, self.caret, &decision.inserted_text)?;
        let inserted = decision.inserted_text.chars().count();
        self.caret = start + inserted;

        let delta = inserted as isize - (decision.delete_before as isize);
        let mut spans = self.notify(TextRange::new(start, inserted), delta);
        spans.extend(self.enforce_trailing_newline());
        Ok(spans)
    }

    /// Inserts `text` at the caret without any indentation rules (paste).
    ///
    /// # Errors
    ///
    /// Returns an error if the caret is out of bounds.
    pub fn insert(&mut self, text: &str) -> Result<Vec<StyledSpan>> {
        self.buffer.insert(self.caret, text)?;
        let inserted = text.chars().count();
        let start = self.caret;
        self.caret += inserted;
        let mut spans = self.notify(TextRange::new(start, inserted), inserted as isize);
        spans.extend(self.enforce_trailing_newline());
        Ok(spans)
    }

    /// Deletes the char before the caret. Does nothing at offset 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the caret is out of bounds.
    pub fn delete_backward(&mut self) -> Result<Vec<StyledSpan>> {
        if self.caret == 0 {
            return Ok(Vec::new());
        }
        self.buffer.remove(self.caret - 1, self.caret)?;
        self.caret -= 1;
        let mut spans = self.notify(TextRange::caret(self.caret), -1);
        spans.extend(self.enforce_trailing_newline());
        Ok(spans)
    }

    /// Gutter rows for `visible`, marking the caret's line.
    pub fn gutter(&self, visible: TextRange) -> Vec<GutterLine> {
        gutter_lines(&self.text(), visible, &[TextRange::caret(self.caret)])
    }

    /// A sender the output pane can use to request jumps.
    pub fn jump_sender(&self) -> JumpSender {
        self.jump_tx.clone()
    }

    /// Moves the caret to `target` and returns the selection to show.
    pub fn jump_to(&mut self, target: JumpTarget) -> SelectionCommand {
        let command = target.selection_in(&self.text());
        self.caret = command.selection.start;
        command
    }

    /// Applies the most recent pending jump request, if any.
    pub fn apply_pending_jumps(&mut self) -> Option<SelectionCommand> {
        let target = self.jump_rx.latest()?;
        Some(self.jump_to(target))
    }

    fn notify(&self, edited: TextRange, length_delta: isize) -> Vec<StyledSpan> {
        let text = self.text();
        let edit = EditNotification::characters(&text, edited, length_delta);
        self.highlighter.on_edit(&edit).unwrap_or_default()
    }

    /// Appends a newline when the text does not end with one. The caret stays put.
    fn enforce_trailing_newline(&mut self) -> Vec<StyledSpan> {
        if !self.ensure_trailing_newline || self.buffer.last_char() == Some('\n') {
            return Vec::new();
        }
        let end = self.buffer.len_chars();
        // `end` is always a valid insert position.
        if let Err(e) = self.buffer.insert(end, "\n") {
            tracing::warn!("Failed to append trailing newline: {e}");
            return Vec::new();
        }
        self.notify(TextRange::new(end, 1), 1)
    }
}
