use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;
use crate::feed::FeedError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Usage(String),

    #[error("Could not create directory {}: {source}", path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not fetch URL {url}: {source}")]
    FeedUnavailable {
        url: String,
        #[source]
        source: ApiError,
    },

    #[error("Could not parse feed from {url}: {source}")]
    FeedMalformed {
        url: String,
        #[source]
        source: FeedError,
    },

    #[error("No files found in feed {url}")]
    NoItems { url: String },

    #[error("Error moving temp file {} to {}: {source}", from.display(), to.display())]
    Commit {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download stalled with {} file(s) never completed: {}", pending.len(), pending.join(", "))]
    Stalled { pending: Vec<String> },
}

impl AppError {
    /// Process exit status for this failure. Zero is reserved for a completed run.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Usage(_) => 2,
            AppError::Setup { .. } => 3,
            AppError::FeedUnavailable { .. } => 4,
            AppError::FeedMalformed { .. } => 5,
            AppError::NoItems { .. } => 6,
            AppError::Commit { .. } => 7,
            AppError::Stalled { .. } => 8,
        }
    }
}
