pub mod buffer;
pub mod diagnostics;
pub mod highlight;
pub mod indent;
pub mod navigation;
pub mod output;
pub mod position;
pub mod runner;
pub mod session;
pub mod text;

pub use buffer::TextBuffer;
pub use diagnostics::{DiagnosticParser, DiagnosticRecord, Severity};
pub use highlight::{
    Category, CategoryKind, EditNotification, HighlightDriver, SpanSink, Style, StyledSpan,
    TokenClassifier,
};
pub use indent::{detect_indent, indent_depth, IndentDecision, IndentEngine};
pub use navigation::{JumpReceiver, JumpSender};
pub use output::{OutputEvent, OutputLink, OutputLog, OutputSpan, StyledText};
pub use position::gutter::{gutter_lines, GutterLine};
pub use position::{line_number_at, offset_for, position_at, JumpTarget, SelectionCommand};
pub use runner::{ProcessRunner, RunError, RunState};
pub use session::EditorSession;
pub use text::TextRange;
