//! Torrent search abstraction.
//!
//! This module provides a `Searcher` trait for searching an indexer
//! aggregator (Jackett) and a `SearchClient` that applies the per-release
//! skip rules and keeps the history ledger current.

mod client;
mod jackett;
mod types;

pub use client::{SearchClient, SearchOptions, SearchOutcome};
pub use jackett::JackettSearcher;
pub use types::*;
