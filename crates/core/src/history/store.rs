//! Durable storage for the history ledger.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tracing::debug;

use super::ledger::{HistoryLedger, LedgerDocument};

/// Errors from loading or persisting history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("History file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Loads and persists a [`HistoryLedger`].
pub trait HistoryStore: Send + Sync {
    /// Load the ledger. A store that has never been written yields an empty ledger.
    fn load(&self) -> Result<HistoryLedger, HistoryError>;

    /// Replace the stored ledger with `ledger`.
    fn persist(&self, ledger: &HistoryLedger) -> Result<(), HistoryError>;
}

/// JSON file store.
///
/// Layout: `{ "basenames_searched": [...], "download_history": { tracker: [...] } }`.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> Result<HistoryLedger, HistoryError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No history file yet");
                return Ok(HistoryLedger::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let doc: LedgerDocument =
            serde_json::from_slice(&data).map_err(|e| HistoryError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        Ok(HistoryLedger::from_document(doc))
    }

    fn persist(&self, ledger: &HistoryLedger) -> Result<(), HistoryError> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        ledger
            .to_document()
            .serialize(&mut serializer)
            .map_err(|e| self.io_error(e.into()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Atomic replace: write a sibling file, then rename over the target.
        let temp = self.temp_path();
        fs::write(&temp, &buf).map_err(|e| self.io_error(e))?;
        fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(
            path = %self.path.display(),
            searched = ledger.searched().len(),
            grabbed = ledger.grab_count(),
            "History persisted"
        );
        Ok(())
    }
}
