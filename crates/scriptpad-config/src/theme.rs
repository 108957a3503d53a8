/// Syntax and output-pane colors.
use serde::{Deserialize, Serialize};

use crate::color::HexColor;

/// Colors for each lexical category plus the default text color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxColors {
    pub text: HexColor,
    pub comment: HexColor,
    pub string: HexColor,
    pub character: HexColor,
    pub number: HexColor,
    pub keyword: HexColor,
    pub type_name: HexColor,
}

impl Default for SyntaxColors {
    fn default() -> Self {
        Self {
            text: HexColor::rgb(212, 212, 212),
            comment: HexColor::rgb(108, 121, 134),
            string: HexColor::rgb(252, 106, 93),
            character: HexColor::rgb(208, 191, 105),
            number: HexColor::rgb(208, 191, 105),
            keyword: HexColor::rgb(252, 95, 163),
            type_name: HexColor::rgb(93, 216, 255),
        }
    }
}

/// Colors used by the run output pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputColors {
    pub text: HexColor,
    pub warning: HexColor,
    pub error: HexColor,
    pub exit_success: HexColor,
    pub exit_failure: HexColor,
}

impl Default for OutputColors {
    fn default() -> Self {
        Self {
            text: HexColor::rgb(0, 0, 0),
            warning: HexColor::rgb(255, 166, 0),
            error: HexColor::rgb(204, 0, 0),
            exit_success: HexColor::rgb(0, 153, 0),
            exit_failure: HexColor::rgb(204, 102, 0),
        }
    }
}

/// The full color set: editor syntax colors and output-pane colors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub syntax: SyntaxColors,
    pub output: OutputColors,
}
