//! In-memory history ledger.

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

static DETAILS_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://[^/]+(.+)$").unwrap());

/// Reduce a details URL to everything after the authority.
///
/// Trackers are often reachable through several proxy hosts, so
/// `http://tracker1.example/details?id=55` and
/// `http://mirror9.example/details?id=55` both become `/details?id=55`.
pub fn details_path(url: &str) -> Option<String> {
    DETAILS_PATH_RE
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// On-disk shape of the ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct LedgerDocument {
    #[serde(default)]
    pub basenames_searched: Vec<String>,
    #[serde(default)]
    pub download_history: BTreeMap<String, Vec<String>>,
}

/// Record of searched basenames and grabbed torrents.
///
/// Entries are only ever appended. Insertion order is kept for output while
/// hash indexes answer membership queries.
#[derive(Debug, Clone, Default)]
pub struct HistoryLedger {
    basenames: Vec<String>,
    basename_index: HashSet<String>,
    downloads: BTreeMap<String, Vec<String>>,
    download_index: HashMap<String, HashSet<String>>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this basename was searched in an earlier (or this) run.
    pub fn is_searched(&self, basename: &str) -> bool {
        self.basename_index.contains(basename)
    }

    /// Record a searched basename. Returns `false` if it was already present.
    pub fn record_search(&mut self, basename: &str) -> bool {
        if !self.basename_index.insert(basename.to_string()) {
            return false;
        }
        self.basenames.push(basename.to_string());
        true
    }

    /// Whether a details path was already grabbed from this tracker.
    pub fn is_grabbed(&self, tracker_id: &str, details_path: &str) -> bool {
        self.download_index
            .get(tracker_id)
            .is_some_and(|paths| paths.contains(details_path))
    }

    /// Record a grab. Returns `false` if it was already present.
    pub fn record_grab(&mut self, tracker_id: &str, details_path: &str) -> bool {
        let index = self.download_index.entry(tracker_id.to_string()).or_default();
        if !index.insert(details_path.to_string()) {
            return false;
        }
        self.downloads
            .entry(tracker_id.to_string())
            .or_default()
            .push(details_path.to_string());
        true
    }

    /// Searched basenames in insertion order.
    pub fn searched(&self) -> &[String] {
        &self.basenames
    }

    /// Grabbed details paths for one tracker, in insertion order.
    pub fn grabbed(&self, tracker_id: &str) -> &[String] {
        self.downloads
            .get(tracker_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of grabbed torrents across trackers.
    pub fn grab_count(&self) -> usize {
        self.downloads.values().map(Vec::len).sum()
    }

    pub(crate) fn to_document(&self) -> LedgerDocument {
        LedgerDocument {
            basenames_searched: self.basenames.clone(),
            download_history: self.downloads.clone(),
        }
    }

    /// Rebuild from a document, dropping duplicate entries.
    pub(crate) fn from_document(doc: LedgerDocument) -> Self {
        let mut ledger = Self::new();
        for basename in &doc.basenames_searched {
            ledger.record_search(basename);
        }
        for (tracker_id, paths) in &doc.download_history {
            for path in paths {
                ledger.record_grab(tracker_id, path);
            }
        }
        ledger
    }
}
