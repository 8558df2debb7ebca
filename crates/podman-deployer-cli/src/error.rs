//! Backend error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur while invoking the container backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend executable does not exist at the configured path
    #[error("Backend binary not found: {}", .0.display())]
    BinaryNotFound(PathBuf),

    /// The backend ran but reported failure
    #[error("`{command}` failed with exit code {}: {stderr}", display_code(.code))]
    InvocationFailed {
        /// Command line that was run
        command: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Trimmed standard error output
        stderr: String,
    },

    /// The backend process could not be started
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        /// Command line that was attempted
        command: String,
        /// Underlying spawn failure
        #[source]
        source: std::io::Error,
    },

    /// A stdio pipe was not available on the spawned process
    #[error("Failed to get {0} of container process")]
    MissingPipe(&'static str),

    /// I/O error while talking to the backend
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl BackendError {
    /// Create a new `InvocationFailed` error
    pub fn invocation_failed(
        command: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::InvocationFailed {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Map a spawn failure, distinguishing a missing binary
    pub(crate) fn from_spawn(
        binary: &std::path::Path,
        command: String,
        err: std::io::Error,
    ) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::BinaryNotFound(binary.to_path_buf())
        } else {
            Self::Spawn {
                command,
                source: err,
            }
        }
    }
}
