//! Errors raised inside the bridge.
//!
//! None of these cross the page boundary as-is: the command layer turns
//! them into log lines, console pushes or the `{"error": ...}` envelope.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("document nesting of {depth} levels exceeds the limit of {limit}")]
    TooDeep { depth: usize, limit: usize },

    #[error("task {0} is already running")]
    DuplicateTask(String),

    #[error("invalid task duration: {0} seconds")]
    InvalidDuration(f64),

    #[error("no async runtime available to run task {0}")]
    NoRuntime(String),
}

impl BridgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
