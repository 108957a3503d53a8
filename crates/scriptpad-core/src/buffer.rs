/// Host-side text buffer wrapping `ropey::Rope`; every index is a char index.
use std::fmt;

use anyhow::Result;
use ropey::Rope;

/// A text buffer backed by a rope data structure for efficient editing.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rope)
    }
}

impl TextBuffer {
    /// Creates an empty text buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of characters in the buffer.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the number of lines in the buffer.
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    fn check_range(&self, start: usize, end: usize) -> Result<()> {
        if start > end {
            anyhow::bail!("invalid range: start ({}) > end ({})", start, end);
        }
        if end > self.rope.len_chars() {
            anyhow::bail!(
                "range end {} out of bounds (buffer has {} chars)",
                end,
                self.rope.len_chars()
            );
        }
        Ok(())
    }

    /// Returns the character at a given char index.
    ///
    /// # Errors
    ///
    /// Returns an error if the char index is out of bounds.
    pub fn char_at(&self, char_idx: usize) -> Result<char> {
        if char_idx >= self.rope.len_chars() {
            anyhow::bail!(
                "char index {} out of bounds (buffer has {} chars)",
                char_idx,
                self.rope.len_chars()
            );
        }
        Ok(self.rope.char(char_idx))
    }

    /// Returns the last character, if any.
    pub fn last_char(&self) -> Option<char> {
        let len = self.rope.len_chars();
        (len > 0).then(|| self.rope.char(len - 1))
    }

    /// Returns the text in the char range `[start..end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is out of bounds.
    pub fn slice(&self, start: usize, end: usize) -> Result<String> {
        self.check_range(start, end)?;
        Ok(self.rope.slice(start..end).to_string())
    }

    /// Returns everything before `char_idx`, the context the indenter scans.
    ///
    /// # Errors
    ///
    /// Returns an error if the char index is out of bounds.
    pub fn text_before(&self, char_idx: usize) -> Result<String> {
        self.slice(0, char_idx)
    }

    /// Inserts text at the given char index.
    ///
    /// # Errors
    ///
    /// Returns an error if the char index is out of bounds.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> Result<()> {
        if char_idx > self.rope.len_chars() {
            anyhow::bail!(
                "insert position {} out of bounds (buffer has {} chars)",
                char_idx,
                self.rope.len_chars()
            );
        }
        self.rope.insert(char_idx, text);
        Ok(())
    }

    /// Removes the character range `[start..end)` from the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is out of bounds.
    pub fn remove(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_range(start, end)?;
        self.rope.remove(start..end);
        Ok(())
    }

    /// Replaces text in the given char range with new text.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is out of bounds.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> Result<()> {
        self.remove(start, end)?;
        self.insert(start, text)?;
        Ok(())
    }

    /// Replaces the whole content.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }
}
