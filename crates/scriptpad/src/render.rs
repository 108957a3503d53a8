/// ANSI terminal rendering of styled spans and output chunks.
use scriptpad_core::{Style, StyledSpan, StyledText, TextRange};

const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cell {
    style: Option<Style>,
    underline: bool,
}

impl Cell {
    fn is_plain(&self) -> bool {
        self.style.is_none() && !self.underline
    }

    fn escape(&self) -> String {
        let mut codes: Vec<String> = Vec::new();
        if let Some(style) = self.style {
            if style.bold {
                codes.push("1".to_string());
            }
            let c = style.foreground;
            codes.push(format!("38;2;{};{};{}", c.r, c.g, c.b));
        }
        if self.underline {
            codes.push("4".to_string());
        }
        format!("\x1b[{}m", codes.join(";"))
    }
}

/// Paints `text`; later styles win where ranges overlap.
fn paint(text: &str, styles: &[(TextRange, Style)], underlined: &[TextRange]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut cells = vec![Cell::default(); chars.len()];
    for (range, style) in styles {
        let end = range.end().min(chars.len());
        for cell in cells.iter_mut().take(end).skip(range.start) {
            cell.style = Some(*style);
        }
    }
    for range in underlined {
        let end = range.end().min(chars.len());
        for cell in cells.iter_mut().take(end).skip(range.start) {
            cell.underline = true;
        }
    }

    let mut out = String::with_capacity(text.len() * 2);
    let mut current = Cell::default();
    for (ch, cell) in chars.into_iter().zip(cells) {
        if cell != current {
            if !current.is_plain() {
                out.push_str(RESET);
            }
            if !cell.is_plain() {
                out.push_str(&cell.escape());
            }
            current = cell;
        }
        out.push(ch);
    }
    if !current.is_plain() {
        out.push_str(RESET);
    }
    out
}

/// Renders editor text with highlight spans, in the order they were produced.
pub fn highlighted(text: &str, spans: &[StyledSpan]) -> String {
    let styles: Vec<_> = spans.iter().map(|s| (s.range, s.style)).collect();
    paint(text, &styles, &[])
}

/// Renders one output chunk with its links underlined.
pub fn output_chunk(chunk: &StyledText) -> String {
    let styles: Vec<_> = chunk.spans.iter().map(|s| (s.range, s.style)).collect();
    let links: Vec<_> = chunk.links.iter().map(|l| l.range).collect();
    paint(&chunk.text, &styles, &links)
}
