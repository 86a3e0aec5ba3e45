//! Types describing a local release.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse content category of a release.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseCategory {
    Movie,
    Episode,
    Unknown,
}

impl ReleaseCategory {
    /// Torznab category id used to narrow aggregator searches.
    pub fn torznab_id(&self) -> Option<u32> {
        match self {
            ReleaseCategory::Movie => Some(2000),
            ReleaseCategory::Episode => Some(5000),
            ReleaseCategory::Unknown => None,
        }
    }
}

/// Metadata extracted from a release name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuessedMetadata {
    pub title: Option<String>,
    pub year: Option<u32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub category: Option<ReleaseCategory>,
}

/// A profiled local release, ready to be searched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    /// Path on disk (file or directory).
    pub path: PathBuf,
    /// Final path component, used as the history key.
    pub basename: String,
    /// Sum of all file sizes. `None` when any file size is unknown.
    pub total_size_bytes: Option<u64>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    pub category: ReleaseCategory,
}

impl ReleaseDescriptor {
    /// Free-text query: the title, followed by the year when known.
    pub fn search_text(&self) -> String {
        match self.year {
            Some(year) => format!("{} {}", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// Errors that can occur while profiling a path.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Could not get title from filename: {basename}")]
    NoTitle { basename: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
