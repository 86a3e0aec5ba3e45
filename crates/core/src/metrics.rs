//! Prometheus metrics for a cross-seed run.
//!
//! This module provides metrics for:
//! - Releases (processed, skipped, failed)
//! - Aggregator searches (requests, retries, latency)
//! - Matching and downloads
//!
//! Metrics are always counted. When a textfile path is configured, the run
//! writes them in Prometheus text format at the end, for a node-exporter
//! textfile collector.

use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

// =============================================================================
// Releases
// =============================================================================

/// Releases processed total by outcome.
pub static RELEASES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("crossseed_releases_total", "Total local releases processed"),
        &["outcome"], // "searched", "skipped_history", "skipped_size", "skipped_unparsable", "failed"
    )
    .unwrap()
});

// =============================================================================
// Aggregator
// =============================================================================

/// Aggregator requests total by status.
pub static SEARCH_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("crossseed_search_requests_total", "Total aggregator search requests"),
        &["status"], // "success", "retry", "error"
    )
    .unwrap()
});

/// Aggregator request latency.
pub static SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "crossseed_search_duration_seconds",
            "Duration of aggregator search requests",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Matching and downloads
// =============================================================================

/// Candidates returned by the aggregator.
pub static CANDIDATES_SEEN: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("crossseed_candidates_seen_total", "Total search candidates seen").unwrap()
});

/// Candidates within size tolerance.
pub static MATCHES_FOUND: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("crossseed_matches_found_total", "Total size-matched candidates").unwrap()
});

/// Torrent downloads total by outcome.
pub static DOWNLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("crossseed_downloads_total", "Total torrent download attempts"),
        &["outcome"], // "saved", "skipped_no_link", "skipped_history", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RELEASES.clone()),
        Box::new(SEARCH_REQUESTS.clone()),
        Box::new(SEARCH_DURATION.clone()),
        Box::new(CANDIDATES_SEEN.clone()),
        Box::new(MATCHES_FOUND.clone()),
        Box::new(DOWNLOADS.clone()),
    ]
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric).unwrap();
    }
    registry
});

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Write the encoded metrics to `path`, replacing it atomically.
pub fn write_textfile(path: &Path) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, encode_metrics())?;
    std::fs::rename(&tmp, path)
}
