//! FILENAME: stat-toolkit/src/error.rs

use std::path::PathBuf;

use engine::EngineError;
use thiserror::Error;

/// Failures of a tool run. Engine errors pass through unchanged.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed loading definition {path}: {source}")]
    Definition {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed reading a number from the input: \"{0}\"")]
    Input(String),

    #[error("{0}")]
    Usage(String),
}

pub type ToolResult<T> = Result<T, ToolError>;
