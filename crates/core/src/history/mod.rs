//! Search and download history.
//!
//! The ledger makes repeated runs idempotent: basenames already searched are
//! not searched again, and torrents already grabbed are not fetched again.

mod ledger;
mod store;

pub use ledger::{details_path, HistoryLedger};
pub use store::{HistoryError, HistoryStore, JsonHistoryStore};
