//! Testing utilities and mock implementations.
//!
//! This module provides a mock implementation of the `Searcher` trait and
//! fixtures for releases and search results, so the pipeline can be tested
//! without a real Jackett instance.
//!
//! # Example
//!
//! ```rust,ignore
//! use crossseed_core::testing::{fixtures, MockSearcher};
//!
//! let searcher = MockSearcher::new();
//! searcher.set_results(vec![
//!     fixtures::search_result("Aither", "Movie.Name.2010.1080p", 4_000_000_000),
//! ]).await;
//! ```

mod mock_searcher;

pub use mock_searcher::{MockSearcher, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::PathBuf;

    use crate::release::{HeuristicGuesser, MetadataGuesser, ReleaseCategory, ReleaseDescriptor};
    use crate::searcher::SearchResult;

    /// Create a search result with reasonable defaults.
    ///
    /// The tracker id is the lowercased tracker name; the details URL is
    /// derived from the title so distinct titles never share history entries.
    pub fn search_result(tracker: &str, title: &str, size_bytes: u64) -> SearchResult {
        let tracker_id = tracker.to_lowercase();
        let slug: String = title
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        SearchResult {
            tracker: tracker.to_string(),
            tracker_id: tracker_id.clone(),
            category_desc: "Movies/HD".to_string(),
            title: title.to_string(),
            download_link: Some(format!("http://{}.example/download/{}", tracker_id, slug)),
            details_url: format!("https://{}.example/torrents/{}", tracker_id, slug),
            category: Some(2000),
            size_bytes,
            imdb_id: None,
        }
    }

    /// A minimal single-file torrent, bencoded.
    pub fn torrent_bytes(name: &str) -> Vec<u8> {
        let announce = "http://tracker.example/announce";
        let mut bytes = format!(
            "d8:announce{}:{}4:infod6:lengthi1024e4:name{}:{}12:piece lengthi16384e6:pieces20:",
            announce.len(),
            announce,
            name.len(),
            name
        )
        .into_bytes();
        bytes.extend_from_slice(&[0xab; 20]);
        bytes.extend_from_slice(b"ee");
        bytes
    }

    /// Descriptor for a movie, with title and year guessed from `basename`.
    pub fn movie_descriptor(basename: &str, size: Option<u64>) -> ReleaseDescriptor {
        let guessed = HeuristicGuesser::new().guess(basename);
        ReleaseDescriptor {
            path: PathBuf::from("/data").join(basename),
            basename: basename.to_string(),
            total_size_bytes: size,
            title: guessed.title.unwrap_or_else(|| basename.to_string()),
            year: guessed.year,
            season: None,
            episode: None,
            category: ReleaseCategory::Movie,
        }
    }

    /// Descriptor for an episode (or season pack when `episode` is `None`).
    pub fn episode_descriptor(basename: &str, season: u32, episode: Option<u32>) -> ReleaseDescriptor {
        let guessed = HeuristicGuesser::new().guess(basename);
        ReleaseDescriptor {
            path: PathBuf::from("/data").join(basename),
            basename: basename.to_string(),
            total_size_bytes: Some(1024 * 1024 * 700),
            title: guessed.title.unwrap_or_else(|| basename.to_string()),
            year: guessed.year,
            season: Some(season),
            episode,
            category: ReleaseCategory::Episode,
        }
    }
}
