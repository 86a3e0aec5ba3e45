use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 1 MiB in bytes.
pub const MIB: u64 = 1024 * 1024;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub aggregator: AggregatorConfig,
    pub run: RunConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Jackett aggregator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregatorConfig {
    /// Jackett server URL (e.g., "http://localhost:9117")
    pub url: String,
    /// Jackett API key
    pub api_key: String,
    /// Restrict searches to these trackers (empty = every configured tracker)
    #[serde(default)]
    pub trackers: Vec<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// What to search for and where to put the results
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// File or folder to find matching torrents for
    pub input_path: PathBuf,
    /// Directory in which downloaded .torrent files are stored
    pub save_path: PathBuf,
    /// Treat every entry inside `input_path` as its own release
    #[serde(default)]
    pub parse_dir: bool,
    /// Pause between searches, and before a retry, in seconds
    #[serde(default = "default_delay")]
    pub delay_secs: u64,
    /// Search and download regardless of what the history says
    #[serde(default)]
    pub ignore_history: bool,
    /// Require an exact size match
    #[serde(default)]
    pub strict_size: bool,
    /// Persist the history after every release instead of once at the end
    #[serde(default)]
    pub flush_each_release: bool,
}

fn default_delay() -> u64 {
    10
}

/// Size matching tolerances
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Allowed size difference when `strict_size` is off (default: 5 MiB)
    #[serde(default = "default_tolerance")]
    pub tolerance_bytes: u64,
    /// Trackers whose reported sizes are known to drift
    #[serde(default = "default_imprecise_trackers")]
    pub imprecise_trackers: Vec<String>,
    /// Tolerance multiplier applied to imprecise trackers
    #[serde(default = "default_imprecise_multiplier")]
    pub imprecise_multiplier: u64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            tolerance_bytes: default_tolerance(),
            imprecise_trackers: default_imprecise_trackers(),
            imprecise_multiplier: default_imprecise_multiplier(),
        }
    }
}

fn default_tolerance() -> u64 {
    5 * MIB
}

fn default_imprecise_trackers() -> Vec<String> {
    vec!["Blutopia".to_string()]
}

fn default_imprecise_multiplier() -> u64 {
    2
}

/// History ledger location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_path")]
    pub path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
        }
    }
}

fn default_history_path() -> PathBuf {
    PathBuf::from("SearchHistory.json")
}

/// Log output
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Append-only log file
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("CrossSeedAutoDL.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Torrent download behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Parse every saved payload and discard anything that is not a torrent
    #[serde(default = "default_true")]
    pub verify_torrent: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            verify_torrent: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Metrics export
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Write Prometheus text format here at the end of the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textfile: Option<PathBuf>,
}

impl Config {
    /// Base size tolerance for this run.
    pub fn base_tolerance(&self) -> u64 {
        if self.run.strict_size {
            0
        } else {
            self.matching.tolerance_bytes
        }
    }
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub aggregator: SanitizedAggregatorConfig,
    pub run: RunConfig,
    pub matching: MatchingConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
    pub download: DownloadConfig,
    pub metrics: MetricsConfig,
}

/// Sanitized aggregator config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAggregatorConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub trackers: Vec<String>,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            aggregator: SanitizedAggregatorConfig {
                url: config.aggregator.url.clone(),
                api_key_configured: !config.aggregator.api_key.is_empty(),
                trackers: config.aggregator.trackers.clone(),
                timeout_secs: config.aggregator.timeout_secs,
            },
            run: config.run.clone(),
            matching: config.matching.clone(),
            history: config.history.clone(),
            logging: config.logging.clone(),
            download: config.download.clone(),
            metrics: config.metrics.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[aggregator]
url = "http://localhost:9117"
api_key = "test-api-key"

[run]
input_path = "/data/movies"
save_path = "/data/torrents"
"#;

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.aggregator.url, "http://localhost:9117");
        assert_eq!(config.aggregator.timeout_secs, 30);
        assert!(config.aggregator.trackers.is_empty());
        assert_eq!(config.run.delay_secs, 10);
        assert!(!config.run.parse_dir);
        assert!(!config.run.ignore_history);
        assert!(!config.run.strict_size);
        assert!(!config.run.flush_each_release);
        assert_eq!(config.matching.tolerance_bytes, 5 * MIB);
        assert_eq!(config.matching.imprecise_trackers, vec!["Blutopia"]);
        assert_eq!(config.matching.imprecise_multiplier, 2);
        assert_eq!(config.history.path, PathBuf::from("SearchHistory.json"));
        assert_eq!(config.logging.file, PathBuf::from("CrossSeedAutoDL.log"));
        assert!(config.download.verify_torrent);
        assert!(config.metrics.textfile.is_none());
    }

    #[test]
    fn test_deserialize_missing_aggregator_fails() {
        let toml = r#"
[run]
input_path = "/a"
save_path = "/b"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_base_tolerance_follows_strict_mode() {
        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.base_tolerance(), 5 * MIB);

        config.run.strict_size = true;
        assert_eq!(config.base_tolerance(), 0);
    }

    #[test]
    fn test_deserialize_tracker_allow_list() {
        let toml = format!(
            "{}\n[matching]\nimprecise_trackers = []\n",
            MINIMAL.replace(
                "api_key = \"test-api-key\"",
                "api_key = \"k\"\ntrackers = [\"blutopia\", \"beyond-hd\"]"
            )
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.aggregator.trackers, vec!["blutopia", "beyond-hd"]);
        assert!(config.matching.imprecise_trackers.is_empty());
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.aggregator.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("test-api-key"));
    }
}
