/// Single-pass token classification over whole lines.
use regex::Regex;
use scriptpad_config::AppConfig;

use crate::text::{line_range, CharCursor, TextRange};

use super::category::{default_categories, Category, CategoryKind, Style};

/// A styled char range produced by one highlight pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledSpan {
    pub range: TextRange,
    pub style: Style,
    /// The category that matched, `None` for the default-style base span.
    pub category: Option<CategoryKind>,
}

/// Classifies text with one combined regex built from a category table.
///
/// Each category's pattern becomes one named group of a single alternation,
/// in precedence order, so a region is scanned once no matter how many
/// categories there are.
#[derive(Debug)]
pub struct TokenClassifier {
    categories: Vec<Category>,
    combined: Option<Regex>,
    /// Capture group index of each category, parallel to `categories`.
    groups: Vec<usize>,
    default_style: Style,
}

fn group_name(i: usize) -> String {
    format!("cat_{i}")
}

impl TokenClassifier {
    /// Compiles the category table.
    ///
    /// Categories are added to the combined pattern one at a time. One that
    /// stops it from compiling, on its own or next to the categories already
    /// accepted, is dropped and logged; the others keep working.
    pub fn new(categories: Vec<Category>, default_style: Style) -> Self {
        let mut accepted: Vec<Category> = Vec::new();
        let mut alternatives: Vec<String> = Vec::new();
        let mut combined: Option<Regex> = None;

        for category in categories {
            let alternative = format!("(?P<{}>{})", group_name(accepted.len()), category.pattern);
            let candidate = alternatives
                .iter()
                .chain(std::iter::once(&alternative))
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("|");

            match Regex::new(&candidate) {
                Ok(regex) => {
                    combined = Some(regex);
                    alternatives.push(alternative);
                    accepted.push(category);
                }
                Err(e) => tracing::warn!(
                    "Dropping {} highlight category, pattern does not compile: {e}",
                    category.name()
                ),
            }
        }

        let groups = combined
            .as_ref()
            .map(|regex| {
                let names: Vec<Option<&str>> = regex.capture_names().collect();
                (0..accepted.len())
                    .map(|i| {
                        let name = group_name(i);
                        names
                            .iter()
                            .position(|n| *n == Some(name.as_str()))
                            .unwrap_or(0)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            categories: accepted,
            combined,
            groups,
            default_style,
        }
    }

    /// Builds the default category table from the configured colors and keywords.
    pub fn from_config(config: &AppConfig) -> Self {
        let colors = &config.theme.syntax;
        Self::new(
            default_categories(colors, &config.keywords),
            Style::regular(colors.text),
        )
    }

    /// The categories that compiled, in precedence order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn default_style(&self) -> Style {
        self.default_style
    }

    /// Classifies the whole lines touched by `range`.
    ///
    /// The first span resets the extended range to the default style; the
    /// rest overlay category styles in text order and never overlap. A match
    /// goes to the highest-precedence category whose group matched non-empty
    /// text.
    pub fn classify(&self, text: &str, range: TextRange) -> Vec<StyledSpan> {
        let (extended, bytes) = line_range(text, range);
        let mut spans = vec![StyledSpan {
            range: extended,
            style: self.default_style,
            category: None,
        }];

        let Some(regex) = &self.combined else {
            return spans;
        };

        let region = &text[bytes.clone()];
        let mut cursor = CharCursor::at(text, bytes.start, extended.start);

        for caps in regex.captures_iter(region) {
            let winner = self.groups.iter().enumerate().find_map(|(i, &group)| {
                caps.get(group)
                    .filter(|m| !m.as_str().is_empty())
                    .map(|m| (i, m))
            });
            let Some((i, m)) = winner else {
                continue;
            };

            let start = cursor.char_at(bytes.start + m.start());
            let end = cursor.char_at(bytes.start + m.end());
            let category = &self.categories[i];
            spans.push(StyledSpan {
                range: TextRange::new(start, end - start),
                style: category.style,
                category: Some(category.kind),
            });
        }

        spans
    }
}

#[cfg(test)]
mod tests {
    use scriptpad_config::{HexColor, SyntaxColors};

    use super::*;
    use crate::highlight::category::keyword_pattern;

    fn classifier() -> TokenClassifier {
        TokenClassifier::from_config(&AppConfig::default())
    }

    /// `(category, matched text)` for every overlay span.
    fn tokens(text: &str, spans: &[StyledSpan]) -> Vec<(CategoryKind, String)> {
        spans
            .iter()
            .filter_map(|s| {
                let kind = s.category?;
                let matched: String = text.chars().skip(s.range.start).take(s.range.len).collect();
                Some((kind, matched))
            })
            .collect()
    }

    fn whole(text: &str) -> TextRange {
        TextRange::new(0, text.chars().count())
    }

    // ── Category matching ──────────────────────────────────────────────

    #[test]
    fn test_mixed_categories() {
        let text = "// hello\n\"world\"\n42\nclass Foo";
        let spans = classifier().classify(text, whole(text));
        assert_eq!(
            tokens(text, &spans),
            vec![
                (CategoryKind::Comment, "// hello".to_string()),
                (CategoryKind::String, "\"world\"".to_string()),
                (CategoryKind::Number, "42".to_string()),
                (CategoryKind::Keyword, "class".to_string()),
                (CategoryKind::TypeName, "Foo".to_string()),
            ]
        );
        let overlays: Vec<_> = spans.iter().skip(1).collect();
        for pair in overlays.windows(2) {
            assert!(pair[0].range.end() <= pair[1].range.start);
        }
    }

    #[test]
    fn test_base_span_covers_extended_range() {
        let text = "let a = 1\nlet b = 2\n";
        let spans = classifier().classify(text, TextRange::caret(12));
        assert_eq!(spans[0].range, TextRange::new(10, 10));
        assert_eq!(spans[0].category, None);
        assert_eq!(spans[0].style, Style::regular(SyntaxColors::default().text));
        // Only the second line is scanned
        assert!(spans.iter().skip(1).all(|s| s.range.start >= 10));
    }

    #[test]
    fn test_comment_swallows_keywords() {
        let text = "// let Foo = 1";
        let spans = classifier().classify(text, whole(text));
        assert_eq!(
            tokens(text, &spans),
            vec![(CategoryKind::Comment, text.to_string())]
        );
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_region_end() {
        let text = "let a = 1 /* open\nstill comment\n";
        let spans = classifier().classify(text, whole(text));
        let found = tokens(text, &spans);
        assert_eq!(found[0], (CategoryKind::Keyword, "let".to_string()));
        assert_eq!(
            found.last().unwrap(),
            &(CategoryKind::Comment, "/* open\nstill comment\n".to_string())
        );
    }

    #[test]
    fn test_closed_block_comment() {
        let text = "a /* x */ 7";
        let spans = classifier().classify(text, whole(text));
        assert_eq!(
            tokens(text, &spans),
            vec![
                (CategoryKind::Comment, "/* x */".to_string()),
                (CategoryKind::Number, "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_character_literal_shields_quote() {
        let text = r#"let c = '"'; let s = "x""#;
        let spans = classifier().classify(text, whole(text));
        assert_eq!(
            tokens(text, &spans),
            vec![
                (CategoryKind::Keyword, "let".to_string()),
                (CategoryKind::Character, "'\"'".to_string()),
                (CategoryKind::Keyword, "let".to_string()),
                (CategoryKind::String, "\"x\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_string_with_escaped_quote() {
        let text = r#"print("say \"hi\"")"#;
        let spans = classifier().classify(text, whole(text));
        assert_eq!(
            tokens(text, &spans),
            vec![(CategoryKind::String, r#""say \"hi\"""#.to_string())]
        );
    }

    #[test]
    fn test_float_number() {
        let text = "x = 3.14";
        let spans = classifier().classify(text, whole(text));
        assert_eq!(
            tokens(text, &spans),
            vec![(CategoryKind::Number, "3.14".to_string())]
        );
    }

    #[test]
    fn test_offsets_are_chars() {
        let text = "\"é\" 42";
        let spans = classifier().classify(text, whole(text));
        let number = spans
            .iter()
            .find(|s| s.category == Some(CategoryKind::Number))
            .unwrap();
        assert_eq!(number.range, TextRange::new(4, 2));
    }

    // ── Precedence and failure handling ────────────────────────────────

    #[test]
    fn test_first_category_wins_on_tie() {
        let red = Style::regular(HexColor::rgb(255, 0, 0));
        let blue = Style::regular(HexColor::rgb(0, 0, 255));
        let classifier = TokenClassifier::new(
            vec![
                Category::new(CategoryKind::Keyword, keyword_pattern(&["self"]).unwrap(), red),
                Category::new(CategoryKind::TypeName, r"\b[a-z]+\b", blue),
            ],
            Style::regular(HexColor::rgb(0, 0, 0)),
        );
        let text = "self other";
        let spans = classifier.classify(text, whole(text));
        assert_eq!(spans[1].category, Some(CategoryKind::Keyword));
        assert_eq!(spans[1].style, red);
        assert_eq!(spans[2].category, Some(CategoryKind::TypeName));
    }

    #[test]
    fn test_broken_pattern_is_dropped() {
        let style = Style::regular(HexColor::rgb(1, 2, 3));
        let classifier = TokenClassifier::new(
            vec![
                Category::new(CategoryKind::Character, "(unclosed", style),
                Category::new(CategoryKind::Number, r"\d+", style),
            ],
            style,
        );
        assert_eq!(classifier.categories().len(), 1);
        let spans = classifier.classify("a 12", TextRange::new(0, 4));
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].range, TextRange::new(2, 2));
        assert_eq!(spans[1].category, Some(CategoryKind::Number));
    }

    #[test]
    fn test_pattern_breaking_only_when_wrapped_is_dropped() {
        let style = Style::regular(HexColor::rgb(1, 2, 3));
        // Compiles alone, but in verbose mode the comment swallows the
        // closing paren of its group.
        let classifier = TokenClassifier::new(
            vec![
                Category::new(CategoryKind::Number, r"\d+", style),
                Category::new(CategoryKind::Keyword, "(?x)let # trailing comment", style),
            ],
            style,
        );
        assert_eq!(classifier.categories().len(), 1);
        let spans = classifier.classify("let 12", TextRange::new(0, 6));
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].range, TextRange::new(4, 2));
        assert_eq!(spans[1].category, Some(CategoryKind::Number));
    }

    #[test]
    fn test_clashing_group_names_drop_the_later_category() {
        let style = Style::regular(HexColor::rgb(1, 2, 3));
        let classifier = TokenClassifier::new(
            vec![
                Category::new(CategoryKind::Keyword, "(?P<word>let)", style),
                Category::new(CategoryKind::TypeName, "(?P<word>[A-Z][a-z]+)", style),
                Category::new(CategoryKind::Number, r"\d+", style),
            ],
            style,
        );
        let kinds: Vec<_> = classifier.categories().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![CategoryKind::Keyword, CategoryKind::Number]);
        let text = "let Foo 7";
        let spans = classifier.classify(text, whole(text));
        assert_eq!(
            tokens(text, &spans),
            vec![
                (CategoryKind::Keyword, "let".to_string()),
                (CategoryKind::Number, "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_categories_yields_base_span_only() {
        let style = Style::regular(HexColor::rgb(1, 2, 3));
        let classifier = TokenClassifier::new(Vec::new(), style);
        let spans = classifier.classify("class Foo", TextRange::new(0, 9));
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn test_custom_keywords_from_config() {
        let mut config = AppConfig::default();
        config.keywords = vec!["def".to_string()];
        let classifier = TokenClassifier::from_config(&config);
        let text = "def let";
        let spans = classifier.classify(text, whole(text));
        assert_eq!(
            tokens(text, &spans),
            vec![(CategoryKind::Keyword, "def".to_string())]
        );
    }
}
