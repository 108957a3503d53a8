//! Char-indexed ranges and byte/char offset conversion helpers.
//!
//! Every offset the engine hands out is a char index. Regex matches come back
//! as byte offsets and go through these helpers before leaving a module.

/// A `(start, length)` range measured in chars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: usize,
    pub len: usize,
}

impl TextRange {
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// A zero-length range at `offset`.
    pub const fn caret(offset: usize) -> Self {
        Self { start: offset, len: 0 }
    }

    /// Exclusive end offset.
    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if the two ranges share at least one char. An empty range
    /// shares none, so it never overlaps.
    pub fn overlaps(&self, other: &TextRange) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.start < other.end() && other.start < self.end()
    }

    /// True if `offset` lies inside `[start, end)`.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }
}

/// Returns the byte index of char `char_idx`, clamped to `text.len()`.
pub fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Returns the number of chars in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Converts monotonically increasing byte offsets into char offsets.
///
/// Each call resumes where the previous one stopped, so converting the
/// boundaries of `n` ordered matches costs one pass over the text.
#[derive(Debug)]
pub struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    /// Starts at byte 0 / char 0 of `text`.
    pub fn new(text: &'a str) -> Self {
        Self::at(text, 0, 0)
    }

    /// Starts at a known `(byte, char)` pair.
    pub fn at(text: &'a str, byte: usize, chars: usize) -> Self {
        Self { text, byte, chars }
    }

    /// Advances to `byte` and returns its char offset.
    ///
    /// `byte` must be a char boundary at or after the previous position;
    /// earlier positions are answered from the current one.
    pub fn char_at(&mut self, byte: usize) -> usize {
        if byte > self.byte {
            let end = byte.min(self.text.len());
            self.chars += self.text[self.byte..end].chars().count();
            self.byte = end;
        }
        self.chars
    }
}

/// Extends `range` to whole lines: from the start of the line holding
/// `range.start` to just past the newline ending the line that holds the
/// last char of the range (the line holding `range.start` when empty).
///
/// Returns the extended range in chars together with its byte bounds.
pub fn line_range(text: &str, range: TextRange) -> (TextRange, std::ops::Range<usize>) {
    let start_byte = char_to_byte(text, range.start);
    let probe_byte = if range.is_empty() {
        start_byte
    } else {
        char_to_byte(text, range.end() - 1).max(start_byte)
    };

    let line_start = text[..start_byte].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[probe_byte..]
        .find('\n')
        .map_or(text.len(), |i| probe_byte + i + 1);

    let start_char = char_len(&text[..line_start]);
    let len = char_len(&text[line_start..line_end]);
    (TextRange::new(start_char, len), line_start..line_end)
}
