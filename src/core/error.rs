use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardflowError {
    #[error("{binary} binary not found in PATH")]
    BinaryNotFound { binary: String },
    #[error("external tool failed (exit_code={exit_code:?}): {stderr}")]
    ExternalTool {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("{} not found, run `boardflow refresh` first", path.display())]
    CatalogNotFound { path: PathBuf },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog document is not valid: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("no known editors found on this system")]
    NoEditors,
    #[error("invalid command: {message}")]
    InvalidCommand { message: String },
}

impl BoardflowError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BoardflowError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid(message: impl ToString) -> Self {
        BoardflowError::InvalidCommand {
            message: message.to_string(),
        }
    }
}
