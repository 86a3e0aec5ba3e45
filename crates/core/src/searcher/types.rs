//! Types for the torrent search system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::details_path;
use crate::release::{ReleaseCategory, ReleaseDescriptor};

/// Query parameters for an aggregator search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text search query.
    pub query: String,
    /// Optional: limit to specific trackers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trackers: Option<Vec<String>>,
    /// Optional: limit to a content category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ReleaseCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl SearchQuery {
    /// Query for a profiled release: "title [year]" narrowed by category and
    /// episode numbering.
    pub fn for_release(descriptor: &ReleaseDescriptor, trackers: &[String]) -> Self {
        Self {
            query: descriptor.search_text(),
            trackers: if trackers.is_empty() {
                None
            } else {
                Some(trackers.to_vec())
            },
            category: match descriptor.category {
                ReleaseCategory::Unknown => None,
                other => Some(other),
            },
            season: descriptor.season,
            episode: descriptor.episode,
        }
    }
}

/// A candidate torrent returned by the aggregator, trimmed to the fields
/// cross-seeding needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    /// Tracker display name (e.g. "Blutopia").
    pub tracker: String,
    /// Tracker identifier (e.g. "blutopia"), the history key.
    pub tracker_id: String,
    /// Category as reported by the tracker.
    pub category_desc: String,
    /// Title with any trailing tracker annotation removed.
    pub title: String,
    /// .torrent download URL, when the tracker exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
    /// Details page URL.
    pub details_url: String,
    /// Primary torznab category id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<u32>,
    /// Size in bytes.
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
}

impl SearchResult {
    /// Details URL with scheme and host stripped, stable across tracker proxies.
    pub fn details_path(&self) -> Option<String> {
        details_path(&self.details_url)
    }
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Malformed search response: {0}")]
    MalformedResponse(String),

    #[error(
        "No results found due to incorrectly input indexer names ({trackers}). \
         Check your spelling/capitalization (are they added to Jackett?)"
    )]
    NoActiveIndexers { trackers: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SearchError {
    /// Worth one retry after a pause.
    pub fn is_transient(&self) -> bool {
        matches!(self, SearchError::ConnectionFailed(_) | SearchError::Timeout)
    }

    /// Aborts the whole run; every later search would fail the same way.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SearchError::NoActiveIndexers { .. })
    }
}

/// Trait for torrent search backends.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Execute a search, returning normalized results.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError>;
}
