//! Torrent retrieval for matched candidates.
//!
//! Files are named `"{title} [{tracker}].torrent"` and never overwrite an
//! existing file; collisions get a ` (n)` suffix.

mod naming;
mod torrent_downloader;
mod types;

pub use naming::{create_unique, numbered_path, release_file_stem, sanitize_name, TORRENT_EXTENSION};
pub use torrent_downloader::{DownloadOptions, TorrentDownloader};
pub use types::{DownloadError, DownloadOutcome};
