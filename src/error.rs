use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BtError {
    #[error("Unsupported environment: {0}")]
    EnvironmentUnsupported(String),

    #[error("Missing dependency: {0}")]
    DependencyMissing(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Download of {url} failed with HTTP {status}")]
    Download { url: String, status: u16 },

    /// A child process exited non-zero. `stderr` is kept so it can be shown
    /// to the operator.
    #[error("Command `{command}` failed (exit code {code}){}", format_stderr(.stderr))]
    Subprocess {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Dialog error: {0}")]
    Dialog(#[from] dialoguer::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BtError {
    /// Attach a path to an IO error.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", crate::utils::truncate(trimmed, 400))
    }
}

pub type Result<T> = std::result::Result<T, BtError>;
