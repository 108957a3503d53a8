use std::path::PathBuf;

use thiserror::Error;

/// Why a run could not start. None of these are fatal: the runner is back
/// in `Idle` and can be asked to run again.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not write script to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("interpreter `{interpreter}` was not found on PATH")]
    InterpreterNotFound {
        interpreter: String,
        #[source]
        source: which::Error,
    },

    #[error("could not launch `{interpreter}`: {source}")]
    Launch {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not start the runner's async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("diagnostic pattern does not compile: {0}")]
    Pattern(#[from] regex::Error),
}
