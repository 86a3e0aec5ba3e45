//! Command-line flags and their mapping onto the configuration tree.

use std::path::PathBuf;

use clap::Parser;
use figment::providers::Serialized;
use serde_json::{json, Map, Value};

/// Search Jackett for cross-seedable torrents of local releases.
#[derive(Debug, Parser)]
#[command(name = "crossseed", version, about)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, env = "CROSSSEED_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// File or folder of files to search for
    #[arg(short = 'i', long, value_name = "PATH")]
    pub input_path: Option<PathBuf>,

    /// Treat every entry of the input folder as its own release
    #[arg(short = 'p', long)]
    pub parse_dir: bool,

    /// Directory to store downloaded torrents
    #[arg(short = 's', long, value_name = "DIR")]
    pub save_path: Option<PathBuf>,

    /// Jackett URL
    #[arg(short = 'u', long = "url", value_name = "URL")]
    pub jackett_url: Option<String>,

    /// Jackett API key
    #[arg(short = 'k', long = "api-key", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Comma-separated tracker names to search (as named in Jackett)
    #[arg(short = 't', long, value_delimiter = ',', value_name = "NAMES")]
    pub trackers: Vec<String>,

    /// Seconds to pause between searches
    #[arg(short = 'd', long, value_name = "SECONDS")]
    pub delay: Option<u64>,

    /// Search and download even if the history says it was done before
    #[arg(long)]
    pub ignore_history: bool,

    /// Only accept results whose size matches exactly
    #[arg(long)]
    pub strict_size: bool,

    /// Persist the history after every release
    #[arg(long)]
    pub flush_each_release: bool,

    /// History file
    #[arg(long, value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// Log file (appended to)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Prometheus textfile to write at the end of the run
    #[arg(long, value_name = "PATH")]
    pub metrics_file: Option<PathBuf>,
}

impl Cli {
    /// Overrides for every flag that was given, shaped like the config tree.
    pub fn overrides(&self) -> Value {
        let mut aggregator = Map::new();
        let mut run = Map::new();
        let mut root = Map::new();

        if let Some(url) = &self.jackett_url {
            aggregator.insert("url".into(), json!(url));
        }
        if let Some(key) = &self.api_key {
            aggregator.insert("api_key".into(), json!(key));
        }
        let trackers: Vec<&str> = self
            .trackers
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if !trackers.is_empty() {
            aggregator.insert("trackers".into(), json!(trackers));
        }

        if let Some(path) = &self.input_path {
            run.insert("input_path".into(), json!(path));
        }
        if let Some(path) = &self.save_path {
            run.insert("save_path".into(), json!(path));
        }
        if let Some(delay) = self.delay {
            run.insert("delay_secs".into(), json!(delay));
        }
        for (key, set) in [
            ("parse_dir", self.parse_dir),
            ("ignore_history", self.ignore_history),
            ("strict_size", self.strict_size),
            ("flush_each_release", self.flush_each_release),
        ] {
            if set {
                run.insert(key.into(), json!(true));
            }
        }

        if let Some(path) = &self.history_file {
            root.insert("history".into(), json!({ "path": path }));
        }
        if let Some(path) = &self.log_file {
            root.insert("logging".into(), json!({ "file": path }));
        }
        if let Some(path) = &self.metrics_file {
            root.insert("metrics".into(), json!({ "textfile": path }));
        }
        if !aggregator.is_empty() {
            root.insert("aggregator".into(), Value::Object(aggregator));
        }
        if !run.is_empty() {
            root.insert("run".into(), Value::Object(run));
        }

        Value::Object(root)
    }

    /// The overrides as a figment provider, merged last.
    pub fn provider(&self) -> Serialized<Value> {
        Serialized::defaults(self.overrides())
    }
}
