//! Runner configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;

/// Settings that drive the release loop.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// A single release, or a directory whose entries are releases.
    pub input_path: PathBuf,
    /// Treat every direct child of `input_path` as a release.
    pub parse_dir: bool,
    /// Pause after each profiled release.
    pub delay: Duration,
    /// Persist the ledger after every release instead of once at the end.
    pub flush_each_release: bool,
    /// Where to export metrics at the end of the run.
    pub metrics_textfile: Option<PathBuf>,
}

impl RunnerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            input_path: config.run.input_path.clone(),
            parse_dir: config.run.parse_dir,
            delay: Duration::from_secs(config.run.delay_secs),
            flush_each_release: config.run.flush_each_release,
            metrics_textfile: config.metrics.textfile.clone(),
        }
    }
}
