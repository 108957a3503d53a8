//! Regex-based syntax highlighting.
//!
//! [`TokenClassifier`] turns a category table into one combined pattern and
//! styles the lines an edit touched; [`HighlightDriver`] decides which edits
//! get re-highlighted and hands the spans to the renderer.

pub mod category;
pub mod classifier;
pub mod driver;

pub use category::{default_categories, Category, CategoryKind, Style};
pub use classifier::{StyledSpan, TokenClassifier};
pub use driver::{EditNotification, HighlightDriver, SpanSink};
