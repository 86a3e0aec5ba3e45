//! Turns a path on disk into a [`ReleaseDescriptor`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::guesser::MetadataGuesser;
use super::types::{ProfileError, ReleaseCategory, ReleaseDescriptor};

/// Profiles local releases: total size on disk plus guessed metadata.
pub struct ReleaseProfiler<G: MetadataGuesser> {
    guesser: G,
}

impl<G: MetadataGuesser> ReleaseProfiler<G> {
    pub fn new(guesser: G) -> Self {
        Self { guesser }
    }

    /// Profile a single file or directory.
    ///
    /// Fails with [`ProfileError::NoTitle`] when the name yields no title;
    /// callers skip such paths.
    pub fn profile(&self, path: &Path) -> Result<ReleaseDescriptor, ProfileError> {
        if fs::symlink_metadata(path).is_err() {
            return Err(ProfileError::NotFound(path.to_path_buf()));
        }

        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let guessed = self.guesser.guess(&basename);
        let title = guessed.title.ok_or_else(|| ProfileError::NoTitle {
            basename: basename.clone(),
        })?;

        let total_size_bytes = total_size(path)?;
        debug!(basename = %basename, size = ?total_size_bytes, "Profiled release");

        Ok(ReleaseDescriptor {
            path: path.to_path_buf(),
            basename,
            total_size_bytes,
            title,
            year: guessed.year,
            season: guessed.season,
            episode: guessed.episode,
            category: guessed.category.unwrap_or(ReleaseCategory::Unknown),
        })
    }
}

/// Sum the size of every file under `path`.
///
/// A top-level link is resolved and its target measured. Links inside a
/// directory count as their target's size, except links to directories,
/// which count as zero. Returns `Ok(None)` when a link points at nothing.
pub fn total_size(path: &Path) -> Result<Option<u64>, ProfileError> {
    let meta = fs::symlink_metadata(path).map_err(|e| io_error(path, e))?;

    let is_dir = if meta.file_type().is_symlink() {
        match fs::metadata(path) {
            Ok(target) => target.is_dir(),
            Err(_) => {
                debug!(path = %path.display(), "Link target missing");
                return Ok(None);
            }
        }
    } else {
        meta.is_dir()
    };

    if !is_dir {
        return Ok(file_size(path, &meta));
    }

    let mut total = 0u64;
    // The root link is resolved; links inside the release are classified one by one.
    let walker = WalkDir::new(path)
        .follow_root_links(true)
        .follow_links(false)
        .min_depth(1);
    for entry in walker {
        let entry = entry.map_err(|e| {
            let entry_path = e.path().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf());
            ProfileError::Io {
                path: entry_path,
                source: e.into(),
            }
        })?;
        if entry.file_type().is_dir() {
            continue;
        }

        let meta = entry.metadata().map_err(|e| ProfileError::Io {
            path: entry.path().to_path_buf(),
            source: e.into(),
        })?;
        match file_size(entry.path(), &meta) {
            Some(size) => total += size,
            None => return Ok(None),
        }
    }

    Ok(Some(total))
}

/// Size of one non-directory entry. `meta` must come from `symlink_metadata`.
fn file_size(path: &Path, meta: &fs::Metadata) -> Option<u64> {
    if !meta.file_type().is_symlink() {
        return Some(meta.len());
    }

    match fs::metadata(path) {
        Ok(target) if target.is_file() => Some(target.len()),
        // Linked directories are not walked, matching a plain directory listing.
        Ok(target) if target.is_dir() => Some(0),
        _ => {
            debug!(path = %path.display(), "Link target missing");
            None
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ProfileError {
    ProfileError::Io {
        path: PathBuf::from(path),
        source,
    }
}
