//! Types for the release runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conditions that abort a run.
///
/// Everything else (unparsable names, failed searches, failed downloads) is
/// logged and skipped.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("history error: {0}")]
    History(#[from] crate::history::HistoryError),

    #[error("search error: {0}")]
    Search(#[from] crate::searcher::SearchError),

    /// The downloader could not be constructed.
    #[error("downloader error: {0}")]
    Download(#[from] crate::downloader::DownloadError),
}

/// Counts for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Input paths considered.
    pub releases: usize,
    /// Releases whose search completed.
    pub searched: usize,
    /// Releases skipped (history, unknown size, unparsable name).
    pub skipped: usize,
    /// Candidates within size tolerance.
    pub matched: usize,
    /// Torrents saved.
    pub downloaded: usize,
    /// Failed searches and failed downloads.
    pub failed: usize,
}

impl RunSummary {
    pub fn new(releases: usize) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            releases,
            searched: 0,
            skipped: 0,
            matched: 0,
            downloaded: 0,
            failed: 0,
        }
    }
}
