//! Release runner implementation.
//!
//! Processes input paths strictly one at a time:
//! profile -> search -> match -> download each match -> sleep -> next.
//! The history ledger is loaded once, threaded through every step, and
//! persisted when the loop ends (or after each release, if configured).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::{Config, ConfigError};
use crate::downloader::{DownloadOptions, DownloadOutcome, TorrentDownloader};
use crate::history::{HistoryLedger, HistoryStore, JsonHistoryStore};
use crate::matcher::SizeMatcher;
use crate::metrics;
use crate::release::{HeuristicGuesser, MetadataGuesser, ProfileError, ReleaseDescriptor, ReleaseProfiler};
use crate::searcher::{SearchClient, SearchOptions, SearchOutcome, Searcher};

use super::config::RunnerConfig;
use super::types::{RunError, RunSummary};

/// Expand the input into the ordered list of release paths.
///
/// Without `parse_dir` this is the input itself; otherwise every direct
/// child of the input directory, sorted by name.
pub fn collect_input_paths(input: &Path, parse_dir: bool) -> Result<Vec<PathBuf>, RunError> {
    let normalized: PathBuf = input.components().collect();
    if !parse_dir {
        return Ok(vec![normalized]);
    }

    let entries = std::fs::read_dir(&normalized).map_err(|e| {
        ConfigError::ValidationError(format!(
            "cannot list input directory {}: {}",
            normalized.display(),
            e
        ))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            ConfigError::ValidationError(format!(
                "cannot list input directory {}: {}",
                normalized.display(),
                e
            ))
        })?;
        paths.push(entry.path());
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Drives every input path through the cross-seed pipeline.
pub struct CrossSeedRunner<S: Searcher, G: MetadataGuesser> {
    config: RunnerConfig,
    profiler: ReleaseProfiler<G>,
    search_client: SearchClient<S>,
    matcher: SizeMatcher,
    downloader: TorrentDownloader,
    history: Arc<dyn HistoryStore>,
}

impl<S: Searcher> CrossSeedRunner<S, HeuristicGuesser> {
    /// Wire up the standard components from a loaded configuration.
    pub fn from_config(config: &Config, searcher: S) -> Result<Self, RunError> {
        let search_client = SearchClient::new(searcher, SearchOptions::from_config(config));

        let downloader = TorrentDownloader::new(
            &config.run.save_path,
            DownloadOptions {
                ignore_history: config.run.ignore_history,
                verify_torrent: config.download.verify_torrent,
                retry_delay: Duration::from_secs(config.run.delay_secs),
                timeout: Duration::from_secs(config.aggregator.timeout_secs as u64),
            },
        )?;

        Ok(Self::new(
            RunnerConfig::from_config(config),
            ReleaseProfiler::new(HeuristicGuesser::new()),
            search_client,
            SizeMatcher::from_config(config),
            downloader,
            Arc::new(JsonHistoryStore::new(&config.history.path)),
        ))
    }
}

impl<S: Searcher, G: MetadataGuesser> CrossSeedRunner<S, G> {
    pub fn new(
        config: RunnerConfig,
        profiler: ReleaseProfiler<G>,
        search_client: SearchClient<S>,
        matcher: SizeMatcher,
        downloader: TorrentDownloader,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            config,
            profiler,
            search_client,
            matcher,
            downloader,
            history,
        }
    }

    /// Process every input path.
    ///
    /// Returns `Err` only for fatal conditions: unreadable history, an
    /// unlistable input directory, or an aggregator reporting no active
    /// indexers. On a fatal search error the ledger is not persisted.
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let mut ledger = self.history.load()?;
        let paths = collect_input_paths(&self.config.input_path, self.config.parse_dir)?;
        let total = paths.len();
        let mut summary = RunSummary::new(total);

        info!(
            input = %self.config.input_path.display(),
            releases = total,
            "Starting cross-seed run"
        );

        for (i, path) in paths.iter().enumerate() {
            let descriptor = match self.profiler.profile(path) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    self.record_profile_failure(path, &e, &mut summary);
                    continue;
                }
            };

            info!(
                "Searching for {} of {}: {}",
                i + 1,
                total,
                descriptor.search_text()
            );

            if let Err(e) = self.process_release(&descriptor, &mut ledger, &mut summary).await {
                error!(basename = %descriptor.basename, error = %e, "Aborting run");
                return Err(e.into());
            }

            if self.config.flush_each_release {
                self.history.persist(&ledger)?;
            }

            tokio::time::sleep(self.config.delay).await;
        }

        self.history.persist(&ledger)?;
        self.export_metrics();

        summary.finished_at = Some(Utc::now());
        info!(
            releases = summary.releases,
            searched = summary.searched,
            skipped = summary.skipped,
            matched = summary.matched,
            downloaded = summary.downloaded,
            failed = summary.failed,
            "Run finished"
        );
        Ok(summary)
    }

    /// Search, match and download one release.
    ///
    /// Only a fatal search error escapes.
    async fn process_release(
        &self,
        descriptor: &ReleaseDescriptor,
        ledger: &mut HistoryLedger,
        summary: &mut RunSummary,
    ) -> Result<(), crate::searcher::SearchError> {
        let outcome = match self.search_client.search(descriptor, ledger).await {
            Ok(outcome) => outcome,
            Err(e) => {
                metrics::RELEASES.with_label_values(&["failed"]).inc();
                return Err(e);
            }
        };

        let results = match outcome {
            SearchOutcome::Completed(results) => results,
            SearchOutcome::SkippedPreviouslySearched => {
                metrics::RELEASES.with_label_values(&["skipped_history"]).inc();
                summary.skipped += 1;
                return Ok(());
            }
            SearchOutcome::SkippedUnknownSize => {
                metrics::RELEASES.with_label_values(&["skipped_size"]).inc();
                summary.skipped += 1;
                return Ok(());
            }
            SearchOutcome::Failed(_) => {
                metrics::RELEASES.with_label_values(&["failed"]).inc();
                summary.failed += 1;
                return Ok(());
            }
        };

        metrics::RELEASES.with_label_values(&["searched"]).inc();
        metrics::CANDIDATES_SEEN.inc_by(results.len() as u64);
        summary.searched += 1;

        let matches = self.matcher.match_against(descriptor, &results);
        metrics::MATCHES_FOUND.inc_by(matches.len() as u64);
        summary.matched += matches.len();

        for candidate in &matches {
            match self.downloader.download(candidate, ledger).await {
                Ok(DownloadOutcome::Saved { path }) => {
                    debug!(path = %path.display(), "Saved");
                    summary.downloaded += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        basename = %descriptor.basename,
                        tracker = %candidate.tracker,
                        title = %candidate.title,
                        error = %e,
                        "- Download failed, skipping"
                    );
                    summary.failed += 1;
                }
            }
        }

        Ok(())
    }

    fn record_profile_failure(&self, path: &Path, err: &ProfileError, summary: &mut RunSummary) {
        match err {
            ProfileError::NoTitle { basename } => {
                info!(basename = %basename, "Skipping. Could not get title from filename");
                metrics::RELEASES.with_label_values(&["skipped_unparsable"]).inc();
                summary.skipped += 1;
            }
            other => {
                warn!(path = %path.display(), reason = %other, "Skipping. Could not profile release");
                metrics::RELEASES.with_label_values(&["failed"]).inc();
                summary.failed += 1;
            }
        }
    }

    fn export_metrics(&self) {
        if let Some(path) = &self.config.metrics_textfile {
            if let Err(e) = metrics::write_textfile(path) {
                warn!(path = %path.display(), error = %e, "Failed to write metrics textfile");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryError;
    use crate::searcher::{SearchError, SearchResult};
    use crate::testing::{fixtures, MockSearcher};
    use tempfile::TempDir;

    struct Workspace {
        _root: TempDir,
        input: PathBuf,
        save: PathBuf,
        history: PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            let input = root.path().join("input");
            let save = root.path().join("save");
            std::fs::create_dir(&input).unwrap();
            std::fs::create_dir(&save).unwrap();
            let history = root.path().join("SearchHistory.json");
            Self {
                _root: root,
                input,
                save,
                history,
            }
        }

        fn add_release(&self, name: &str, size: usize) -> PathBuf {
            let path = self.input.join(name);
            std::fs::write(&path, vec![0u8; size]).unwrap();
            path
        }

        fn runner(&self, searcher: MockSearcher, flush_each_release: bool) -> CrossSeedRunner<MockSearcher, HeuristicGuesser> {
            let search_client = SearchClient::new(
                searcher,
                SearchOptions {
                    parse_dir: true,
                    ignore_history: false,
                    trackers: vec![],
                },
            );
            let downloader = TorrentDownloader::new(&self.save, DownloadOptions::default()).unwrap();
            CrossSeedRunner::new(
                RunnerConfig {
                    input_path: self.input.clone(),
                    parse_dir: true,
                    delay: Duration::ZERO,
                    flush_each_release,
                    metrics_textfile: None,
                },
                ReleaseProfiler::new(HeuristicGuesser::new()),
                search_client,
                SizeMatcher::default(),
                downloader,
                Arc::new(JsonHistoryStore::new(&self.history)),
            )
        }

        fn ledger(&self) -> HistoryLedger {
            JsonHistoryStore::new(&self.history).load().unwrap()
        }
    }

    fn linkless(tracker: &str, title: &str, size: u64) -> SearchResult {
        let mut result = fixtures::search_result(tracker, title, size);
        result.download_link = None;
        result
    }

    #[test]
    fn test_collect_single_path_is_normalized() {
        let paths = collect_input_paths(Path::new("/data/./movies/"), false).unwrap();
        assert_eq!(paths, vec![PathBuf::from("/data/movies")]);
    }

    #[test]
    fn test_collect_dir_children_sorted() {
        let ws = Workspace::new();
        ws.add_release("b.2011.mkv", 1);
        ws.add_release("a.2010.mkv", 1);
        std::fs::create_dir(ws.input.join("c.2012")).unwrap();

        let paths = collect_input_paths(&ws.input, true).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.2010.mkv", "b.2011.mkv", "c.2012"]);
    }

    #[test]
    fn test_collect_missing_dir_is_config_error() {
        let err = collect_input_paths(Path::new("/definitely/not/here"), true).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[tokio::test]
    async fn test_run_records_searches_and_persists() {
        let ws = Workspace::new();
        ws.add_release("Movie.Name.2010.1080p.mkv", 1000);
        ws.add_release("Other.Film.2012.720p.mkv", 1000);

        let searcher = MockSearcher::new();
        searcher
            .set_results(vec![linkless("Aither", "Movie.Name.2010.1080p", 1000)])
            .await;

        let summary = ws.runner(searcher.clone(), false).run().await.unwrap();

        assert_eq!(summary.releases, 2);
        assert_eq!(summary.searched, 2);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.downloaded, 0);
        assert!(summary.finished_at.is_some());
        assert_eq!(searcher.search_count().await, 2);

        let ledger = ws.ledger();
        assert_eq!(
            ledger.searched(),
            &["Movie.Name.2010.1080p.mkv".to_string(), "Other.Film.2012.720p.mkv".to_string()]
        );
    }

    #[tokio::test]
    async fn test_second_run_skips_searched_basenames() {
        let ws = Workspace::new();
        ws.add_release("Movie.Name.2010.1080p.mkv", 1000);

        let searcher = MockSearcher::new();
        ws.runner(searcher.clone(), false).run().await.unwrap();
        let summary = ws.runner(searcher.clone(), false).run().await.unwrap();

        assert_eq!(searcher.search_count().await, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(ws.ledger().searched().len(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_name_is_skipped() {
        let ws = Workspace::new();
        ws.add_release("1080p.mkv", 10);
        ws.add_release("Movie.Name.2010.1080p.mkv", 10);

        let searcher = MockSearcher::new();
        let summary = ws.runner(searcher.clone(), false).run().await.unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.searched, 1);
        assert_eq!(searcher.search_count().await, 1);
    }

    #[tokio::test]
    async fn test_transient_failure_continues_run() {
        let ws = Workspace::new();
        ws.add_release("A.Movie.2010.mkv", 10);
        ws.add_release("B.Movie.2011.mkv", 10);

        let searcher = MockSearcher::new();
        searcher.set_next_error(SearchError::Timeout).await;

        let summary = ws.runner(searcher.clone(), false).run().await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.searched, 1);
        assert_eq!(ws.ledger().searched(), &["B.Movie.2011.mkv".to_string()]);
    }

    #[tokio::test]
    async fn test_fatal_error_aborts_without_persisting() {
        let ws = Workspace::new();
        ws.add_release("A.Movie.2010.mkv", 10);
        ws.add_release("B.Movie.2011.mkv", 10);

        let searcher = MockSearcher::new();
        searcher
            .set_query_handler(|q| {
                if q.query.starts_with('B') {
                    Err(SearchError::NoActiveIndexers {
                        trackers: "blutopai".into(),
                    })
                } else {
                    Ok(vec![])
                }
            })
            .await;

        let err = ws.runner(searcher, false).run().await.unwrap_err();

        assert!(matches!(err, RunError::Search(SearchError::NoActiveIndexers { .. })));
        assert!(!ws.history.exists());
    }

    #[tokio::test]
    async fn test_flush_each_release_keeps_completed_releases() {
        let ws = Workspace::new();
        ws.add_release("A.Movie.2010.mkv", 10);
        ws.add_release("B.Movie.2011.mkv", 10);

        let searcher = MockSearcher::new();
        searcher
            .set_query_handler(|q| {
                if q.query.starts_with('B') {
                    Err(SearchError::NoActiveIndexers {
                        trackers: "blutopai".into(),
                    })
                } else {
                    Ok(vec![])
                }
            })
            .await;

        assert!(ws.runner(searcher, true).run().await.is_err());
        assert_eq!(ws.ledger().searched(), &["A.Movie.2010.mkv".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_history_aborts_before_searching() {
        let ws = Workspace::new();
        ws.add_release("A.Movie.2010.mkv", 10);
        std::fs::write(&ws.history, "{ not json").unwrap();

        let searcher = MockSearcher::new();
        let err = ws.runner(searcher.clone(), false).run().await.unwrap_err();

        assert!(matches!(err, RunError::History(HistoryError::Corrupt { .. })));
        assert_eq!(searcher.search_count().await, 0);
        assert_eq!(std::fs::read_to_string(&ws.history).unwrap(), "{ not json");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink_is_never_searched() {
        let ws = Workspace::new();
        let release = ws.input.join("Movie.Name.2010.1080p");
        std::fs::create_dir(&release).unwrap();
        std::os::unix::fs::symlink(ws.input.join("gone.mkv"), release.join("movie.mkv")).unwrap();

        let searcher = MockSearcher::new();
        let summary = ws.runner(searcher.clone(), false).run().await.unwrap();

        assert_eq!(searcher.search_count().await, 0);
        assert_eq!(summary.skipped, 1);
        assert!(ws.ledger().searched().is_empty());
    }
}
