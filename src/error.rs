// src/error.rs
use std::path::PathBuf;

/// Failures of the local data directory (credit records, prompt library).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt data in {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no prompt matches '{0}'")]
    NotFound(String),

    #[error("'{0}' matches more than one prompt, use a longer id")]
    Ambiguous(String),

    #[error("prompt {0} belongs to another user")]
    NotOwner(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
