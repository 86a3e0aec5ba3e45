pub mod config;
pub mod downloader;
pub mod history;
pub mod matcher;
pub mod metrics;
pub mod orchestrator;
pub mod release;
pub mod searcher;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_with, validate_config, AggregatorConfig, Config,
    ConfigError, SanitizedConfig, MIB,
};
pub use downloader::{DownloadError, DownloadOptions, DownloadOutcome, TorrentDownloader};
pub use history::{details_path, HistoryError, HistoryLedger, HistoryStore, JsonHistoryStore};
pub use matcher::{canonicalize_title, SizeMatcher};
pub use orchestrator::{collect_input_paths, CrossSeedRunner, RunError, RunSummary, RunnerConfig};
pub use release::{
    HeuristicGuesser, MetadataGuesser, ProfileError, ReleaseCategory, ReleaseDescriptor,
    ReleaseProfiler,
};
pub use searcher::{
    JackettSearcher, SearchClient, SearchError, SearchOptions, SearchOutcome, SearchQuery,
    SearchResult, Searcher,
};
