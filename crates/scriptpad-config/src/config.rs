/// Application configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::indent::IndentStyle;
use crate::theme::Theme;

/// Interpreter launched for a run when none is configured.
pub const DEFAULT_INTERPRETER: &str = "swift";

/// File name of the script written before each run.
pub const DEFAULT_SCRIPT_FILE_NAME: &str = "scriptpad_script.swift";

/// Output pane ceiling, in characters, before the pane is reset.
pub const DEFAULT_MAX_OUTPUT_CHARS: usize = 1_000_000;

/// Smallest output ceiling `sanitize` accepts.
const MIN_OUTPUT_CHARS: usize = 1024;

/// Keywords highlighted out of the box.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "class", "enum", "func", "import", "init", "let", "private", "protocol", "static", "struct",
    "var", "break", "case", "continue", "else", "for", "guard", "if", "return", "switch", "while",
    "nil", "self", "true", "false",
];

/// Editing behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Text inserted per nesting level.
    pub indent_style: IndentStyle,
    /// Replace `indent_style` with the style detected in a loaded file.
    pub detect_indent: bool,
    /// Keep a newline at the end of the buffer after every edit.
    pub ensure_trailing_newline: bool,
    /// Re-highlight full-text assignments (zero length delta covering the whole buffer).
    pub rehighlight_full_replacement: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            indent_style: IndentStyle::default(),
            detect_indent: false,
            ensure_trailing_newline: true,
            rehighlight_full_replacement: false,
        }
    }
}

/// How scripts are run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Executable looked up on `PATH`, invoked with the script path as its only argument.
    pub interpreter: String,
    /// File name of the script written before each run.
    pub script_file_name: String,
    /// Directory holding the script. `None` = the system temp directory.
    pub script_dir: Option<PathBuf>,
    /// Output pane ceiling in characters.
    pub max_output_chars: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            script_file_name: DEFAULT_SCRIPT_FILE_NAME.to_string(),
            script_dir: None,
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
        }
    }
}

impl RunnerSettings {
    /// The fixed path the script is written to before every run.
    pub fn script_path(&self) -> PathBuf {
        self.script_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(&self.script_file_name)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub editor: EditorSettings,
    pub runner: RunnerSettings,
    pub theme: Theme,
    pub keywords: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            editor: EditorSettings::default(),
            runner: RunnerSettings::default(),
            theme: Theme::default(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Returns the config file path: exe directory + `scriptpad.json`.
    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join("scriptpad.json")))
            .unwrap_or_else(|| PathBuf::from("scriptpad.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (unreadable file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if !path.exists() {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            return config;
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|contents| {
                serde_json::from_str::<AppConfig>(&contents).map_err(|e| e.to_string())
            });

        // Don't overwrite a broken file; the user may want to fix it by hand.
        let mut config = parsed.unwrap_or_else(|e| {
            tracing::warn!("Failed to load config at {}: {e}", path.display());
            Self::default()
        });
        config.sanitize();
        config
    }

    /// Saves config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps values to valid ranges and resets invalid fields.
    pub fn sanitize(&mut self) {
        self.editor.indent_style = self.editor.indent_style.sanitized();

        let runner = &mut self.runner;
        if runner.interpreter.trim().is_empty() {
            runner.interpreter = DEFAULT_INTERPRETER.to_string();
        }
        if runner.script_file_name.trim().is_empty() {
            runner.script_file_name = DEFAULT_SCRIPT_FILE_NAME.to_string();
        }
        runner.max_output_chars = runner.max_output_chars.max(MIN_OUTPUT_CHARS);

        let mut seen = std::collections::HashSet::new();
        self.keywords.retain(|k| {
            let k = k.trim();
            !k.is_empty() && !k.contains(char::is_whitespace) && seen.insert(k.to_string())
        });
    }
}
