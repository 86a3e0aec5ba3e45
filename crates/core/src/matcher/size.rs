//! Size-tolerance matching.

use tracing::{debug, info};

use crate::config::{Config, MIB};
use crate::release::ReleaseDescriptor;
use crate::searcher::SearchResult;

/// Filters search results down to those whose size matches a local release.
///
/// Size is the only identity signal shared across trackers, so a candidate
/// matches when it is within `tolerance` bytes of the local size. The default
/// tolerance absorbs sidecar files such as `.nfo`.
#[derive(Debug, Clone)]
pub struct SizeMatcher {
    base_tolerance: u64,
    imprecise_trackers: Vec<String>,
    imprecise_multiplier: u64,
}

impl Default for SizeMatcher {
    fn default() -> Self {
        Self::new(5 * MIB)
    }
}

impl SizeMatcher {
    /// Matcher with the given base tolerance and no imprecise trackers.
    pub fn new(base_tolerance: u64) -> Self {
        Self {
            base_tolerance,
            imprecise_trackers: Vec::new(),
            imprecise_multiplier: 1,
        }
    }

    /// Exact-size matcher.
    pub fn strict() -> Self {
        Self::new(0)
    }

    /// Scale the tolerance for trackers known to report imprecise sizes.
    pub fn with_imprecise_trackers(mut self, trackers: Vec<String>, multiplier: u64) -> Self {
        self.imprecise_trackers = trackers;
        self.imprecise_multiplier = multiplier.max(1);
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_tolerance()).with_imprecise_trackers(
            config.matching.imprecise_trackers.clone(),
            config.matching.imprecise_multiplier,
        )
    }

    /// Tolerance in bytes for a result from `tracker`.
    pub fn tolerance_for(&self, tracker: &str) -> u64 {
        let imprecise = self
            .imprecise_trackers
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tracker));
        if imprecise {
            self.base_tolerance.saturating_mul(self.imprecise_multiplier)
        } else {
            self.base_tolerance
        }
    }

    /// Whether one candidate matches a local size.
    pub fn is_match(&self, local_size: u64, candidate: &SearchResult) -> bool {
        let tolerance = self
            .tolerance_for(&candidate.tracker)
            .max(self.tolerance_for(&candidate.tracker_id));
        candidate.size_bytes.abs_diff(local_size) <= tolerance
    }

    /// Every candidate within tolerance of the descriptor's size, in input order.
    ///
    /// A descriptor without a known size matches nothing.
    pub fn match_against(
        &self,
        descriptor: &ReleaseDescriptor,
        candidates: &[SearchResult],
    ) -> Vec<SearchResult> {
        let Some(local_size) = descriptor.total_size_bytes else {
            return Vec::new();
        };

        let matches: Vec<SearchResult> = candidates
            .iter()
            .filter(|c| {
                let matched = self.is_match(local_size, c);
                debug!(
                    tracker = %c.tracker,
                    title = %c.title,
                    size = c.size_bytes,
                    local_size,
                    matched,
                    "Compared candidate size"
                );
                matched
            })
            .cloned()
            .collect();

        info!(
            basename = %descriptor.basename,
            "{} matched of {} results.",
            matches.len(),
            candidates.len()
        );
        matches
    }
}
