//! Download outcomes and errors.

use std::path::PathBuf;

use thiserror::Error;

/// What happened to one matched candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The torrent was saved to `path` and recorded in the history.
    Saved { path: PathBuf },
    /// The tracker exposes no direct torrent link.
    SkippedNoLink,
    /// Already grabbed from this tracker in an earlier run.
    SkippedPreviouslyGrabbed,
}

/// Errors that can occur while fetching a torrent.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Downloaded payload is not a torrent ({reason})")]
    InvalidTorrent { reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DownloadError {
    /// Worth one retry after a pause.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DownloadError::ConnectionFailed(_) | DownloadError::Timeout
        )
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DownloadError::Timeout
        } else if e.is_connect() {
            DownloadError::ConnectionFailed(e.to_string())
        } else {
            DownloadError::Http(e.to_string())
        }
    }
}
