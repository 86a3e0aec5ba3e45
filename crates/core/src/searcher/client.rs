//! Release-level search policy on top of a [`Searcher`] backend.

use tracing::{info, warn};

use crate::config::Config;
use crate::history::HistoryLedger;
use crate::release::ReleaseDescriptor;

use super::{SearchError, SearchQuery, SearchResult, Searcher};

/// Options that decide whether and how a release is searched.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Inputs are directory entries; previously searched basenames are skipped.
    pub parse_dir: bool,
    /// Neither consult nor update the searched-basenames history.
    pub ignore_history: bool,
    /// Tracker allow-list (empty = all trackers).
    pub trackers: Vec<String>,
}

impl SearchOptions {
    /// Options for a configured run. Tracker names are trimmed, blanks dropped.
    pub fn from_config(config: &Config) -> Self {
        Self {
            parse_dir: config.run.parse_dir,
            ignore_history: config.run.ignore_history,
            trackers: config
                .aggregator
                .trackers
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

/// Result of searching one release.
#[derive(Debug)]
pub enum SearchOutcome {
    /// The search ran; possibly zero results.
    Completed(Vec<SearchResult>),
    /// Basename already searched in an earlier run.
    SkippedPreviouslySearched,
    /// Local size unknown, so no result could ever match.
    SkippedUnknownSize,
    /// The search failed in a way that only affects this release.
    Failed(SearchError),
}

impl SearchOutcome {
    /// Results to match against; empty for every outcome but `Completed`.
    pub fn into_results(self) -> Vec<SearchResult> {
        match self {
            SearchOutcome::Completed(results) => results,
            _ => Vec::new(),
        }
    }
}

/// Searches releases through a backend while keeping the ledger current.
pub struct SearchClient<S: Searcher> {
    searcher: S,
    options: SearchOptions,
}

impl<S: Searcher> SearchClient<S> {
    pub fn new(searcher: S, options: SearchOptions) -> Self {
        Self { searcher, options }
    }

    pub fn searcher(&self) -> &S {
        &self.searcher
    }

    /// Search one release.
    ///
    /// Only fatal errors are returned as `Err`; every other failure is logged
    /// and reported as [`SearchOutcome::Failed`]. A completed search records
    /// the basename in the ledger unless history is ignored.
    pub async fn search(
        &self,
        descriptor: &ReleaseDescriptor,
        ledger: &mut HistoryLedger,
    ) -> Result<SearchOutcome, SearchError> {
        if !self.options.ignore_history
            && self.options.parse_dir
            && ledger.is_searched(&descriptor.basename)
        {
            info!(
                basename = %descriptor.basename,
                "Skipping search. File previously searched"
            );
            return Ok(SearchOutcome::SkippedPreviouslySearched);
        }

        if descriptor.total_size_bytes.is_none() {
            info!(
                basename = %descriptor.basename,
                "Skipping. Could not get proper filesize data"
            );
            return Ok(SearchOutcome::SkippedUnknownSize);
        }

        let query = SearchQuery::for_release(descriptor, &self.options.trackers);
        info!(
            basename = %descriptor.basename,
            backend = self.searcher.name(),
            query = %query.query,
            "Searching"
        );

        match self.searcher.search(&query).await {
            Ok(results) => {
                if !self.options.ignore_history {
                    ledger.record_search(&descriptor.basename);
                }
                Ok(SearchOutcome::Completed(results))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(
                    basename = %descriptor.basename,
                    error = %e,
                    "Search failed, no results for this release"
                );
                Ok(SearchOutcome::Failed(e))
            }
        }
    }
}
