//! Release runner for a cross-seed pass.
//!
//! The runner walks the input paths sequentially:
//! - **Profile**: size on disk and guessed metadata; unusable names are skipped
//! - **Search**: one aggregator query per release, history-aware
//! - **Match**: size tolerance against every candidate
//! - **Download**: each match, one at a time, into the save directory

mod config;
mod runner;
mod types;

pub use config::RunnerConfig;
pub use runner::{collect_input_paths, CrossSeedRunner};
pub use types::{RunError, RunSummary};
