pub mod color;
pub mod config;
pub mod indent;
pub mod theme;

pub use color::HexColor;
pub use config::{AppConfig, EditorSettings, RunnerSettings};
pub use indent::{IndentStyle, MAX_SPACE_WIDTH};
pub use theme::{OutputColors, SyntaxColors, Theme};
