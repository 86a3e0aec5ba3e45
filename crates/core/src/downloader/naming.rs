//! File naming for saved torrents.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};

/// Extension of saved torrent files.
pub const TORRENT_EXTENSION: &str = "torrent";

/// Make a release name safe to use as a file name.
///
/// `/` becomes `-`; anything other than word characters, `-`, `_`, `.`,
/// parentheses, square brackets and spaces is dropped.
pub fn sanitize_name(name: &str) -> String {
    name.replace('/', "-")
        .chars()
        .filter(|&c| c.is_alphanumeric() || "-_.()[] ".contains(c))
        .collect()
}

/// `"{title} [{tracker}]"`, sanitized.
pub fn release_file_stem(title: &str, tracker: &str) -> String {
    sanitize_name(&format!("{} [{}]", title, tracker))
}

/// Candidate path for the `n`th collision (`0` = the plain name).
pub fn numbered_path(dir: &Path, stem: &str, n: u32) -> PathBuf {
    if n == 0 {
        dir.join(format!("{}.{}", stem, TORRENT_EXTENSION))
    } else {
        dir.join(format!("{} ({}).{}", stem, n, TORRENT_EXTENSION))
    }
}

/// Create a new file for `stem` in `dir`, never overwriting an existing one.
///
/// Tries `stem.torrent`, then `stem (1).torrent`, `stem (2).torrent`, ...
pub async fn create_unique(dir: &Path, stem: &str) -> io::Result<(PathBuf, File)> {
    let mut n = 0;
    loop {
        let path = numbered_path(dir, stem, n);
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e),
        }
    }
}
