//! Fetches .torrent files for matched candidates.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};
use reqwest::{Client, Response};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use crate::history::HistoryLedger;
use crate::metrics;
use crate::searcher::SearchResult;

use super::naming::{create_unique, release_file_stem};
use super::types::{DownloadError, DownloadOutcome};

/// Options for [`TorrentDownloader`].
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Download even if the history says the torrent was already grabbed.
    pub ignore_history: bool,
    /// Parse saved payloads and discard anything that is not a torrent.
    pub verify_torrent: bool,
    /// Pause before the single retry of a failed request.
    pub retry_delay: Duration,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            ignore_history: false,
            verify_torrent: true,
            retry_delay: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Saves .torrent files into a directory and records grabs in the ledger.
pub struct TorrentDownloader {
    client: Client,
    save_dir: PathBuf,
    options: DownloadOptions,
}

impl TorrentDownloader {
    pub fn new(save_dir: impl Into<PathBuf>, options: DownloadOptions) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| DownloadError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            save_dir: save_dir.into(),
            options,
        })
    }

    /// Download one matched candidate.
    ///
    /// Candidates without a link, or already grabbed from the same tracker,
    /// are skipped. A successful save is recorded in `ledger`.
    pub async fn download(
        &self,
        candidate: &SearchResult,
        ledger: &mut HistoryLedger,
    ) -> Result<DownloadOutcome, DownloadError> {
        let release_name = release_file_stem(&candidate.title, &candidate.tracker);

        let Some(link) = candidate.download_link.as_deref() else {
            info!(release = %release_name, "- Skipping release (no download link)");
            metrics::DOWNLOADS.with_label_values(&["skipped_no_link"]).inc();
            return Ok(DownloadOutcome::SkippedNoLink);
        };

        let details_path = candidate
            .details_path()
            .unwrap_or_else(|| candidate.details_url.clone());

        if !self.options.ignore_history && ledger.is_grabbed(&candidate.tracker_id, &details_path) {
            info!(
                release = %release_name,
                tracker = %candidate.tracker_id,
                "- Skipping download (previously grabbed)"
            );
            metrics::DOWNLOADS.with_label_values(&["skipped_history"]).inc();
            return Ok(DownloadOutcome::SkippedPreviouslyGrabbed);
        }

        info!(release = %release_name, "- Grabbing release");

        let result = self.fetch_to_disk(link, &release_name).await;
        let path = match result {
            Ok(path) => path,
            Err(e) => {
                metrics::DOWNLOADS.with_label_values(&["failed"]).inc();
                return Err(e);
            }
        };

        ledger.record_grab(&candidate.tracker_id, &details_path);
        metrics::DOWNLOADS.with_label_values(&["saved"]).inc();
        debug!(path = %path.display(), "Torrent saved");

        Ok(DownloadOutcome::Saved { path })
    }

    /// GET with one retry on timeouts and connection failures.
    async fn request(&self, url: &str) -> Result<Response, DownloadError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .client
                .get(url)
                .send()
                .await
                .map_err(DownloadError::from)
                .and_then(|response| {
                    if response.status().is_success() {
                        Ok(response)
                    } else {
                        Err(DownloadError::Http(format!("HTTP {}", response.status())))
                    }
                });

            match result {
                Err(e) if e.is_transient() && attempt == 1 => {
                    warn!(error = %e, "Torrent request failed. Retrying once more.");
                    tokio::time::sleep(self.options.retry_delay).await;
                }
                other => return other,
            }
        }
    }

    /// Stream the payload into a fresh, collision-free file.
    async fn fetch_to_disk(&self, url: &str, release_name: &str) -> Result<PathBuf, DownloadError> {
        let response = self.request(url).await?;

        let (path, file) = create_unique(&self.save_dir, release_name)
            .await
            .map_err(|e| DownloadError::Io {
                path: self.save_dir.clone(),
                source: e,
            })?;

        if let Err(e) = write_body(response, file, &path).await {
            discard(&path).await;
            return Err(e);
        }

        if self.options.verify_torrent {
            if let Err(e) = verify_torrent_file(&path).await {
                discard(&path).await;
                return Err(e);
            }
        }

        Ok(path)
    }
}

async fn write_body(response: Response, file: tokio::fs::File, path: &Path) -> Result<(), DownloadError> {
    let io_error = |source| DownloadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await.map_err(io_error)?;
    }
    writer.flush().await.map_err(io_error)?;
    Ok(())
}

async fn verify_torrent_file(path: &Path) -> Result<(), DownloadError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| DownloadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let _torrent: TorrentMetaV1Owned = torrent_from_bytes(&bytes)
        .map_err(|e| DownloadError::InvalidTorrent {
            reason: e.to_string(),
        })?;
    Ok(())
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove partial download");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn torrent(State(hits): State<Arc<AtomicUsize>>) -> Vec<u8> {
        hits.fetch_add(1, Ordering::SeqCst);
        fixtures::torrent_bytes("Movie.Name.2010.1080p.mkv")
    }

    async fn login_page() -> &'static str {
        "<html><body>Please log in</body></html>"
    }

    async fn gone() -> StatusCode {
        StatusCode::NOT_FOUND
    }

    /// Serve a fake tracker on an ephemeral port; returns its base URL and a hit counter.
    async fn spawn_tracker() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/download/torrent", get(torrent))
            .route("/download/html", get(login_page))
            .route("/download/gone", get(gone))
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), hits)
    }

    fn options() -> DownloadOptions {
        DownloadOptions {
            retry_delay: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    fn candidate(base: &str, route: &str) -> SearchResult {
        let mut result = fixtures::search_result("Blutopia", "Movie.Name.2010.1080p", 1);
        result.download_link = Some(format!("{}/download/{}", base, route));
        result.details_url = "https://blutopia.example/torrents/42".to_string();
        result
    }

    #[tokio::test]
    async fn test_saves_torrent_and_records_grab() {
        let (base, hits) = spawn_tracker().await;
        let dir = TempDir::new().unwrap();
        let downloader = TorrentDownloader::new(dir.path(), options()).unwrap();
        let mut ledger = HistoryLedger::new();

        let outcome = downloader
            .download(&candidate(&base, "torrent"), &mut ledger)
            .await
            .unwrap();

        let expected = dir.path().join("Movie.Name.2010.1080p [Blutopia].torrent");
        assert_eq!(outcome, DownloadOutcome::Saved { path: expected.clone() });
        assert_eq!(
            std::fs::read(&expected).unwrap(),
            fixtures::torrent_bytes("Movie.Name.2010.1080p.mkv")
        );
        assert!(ledger.is_grabbed("blutopia", "/torrents/42"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_skips_candidate_without_link() {
        let dir = TempDir::new().unwrap();
        let downloader = TorrentDownloader::new(dir.path(), options()).unwrap();
        let mut ledger = HistoryLedger::new();

        let mut result = fixtures::search_result("Blutopia", "Movie", 1);
        result.download_link = None;

        let outcome = downloader.download(&result, &mut ledger).await.unwrap();
        assert_eq!(outcome, DownloadOutcome::SkippedNoLink);
        assert_eq!(ledger.grab_count(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_skips_previously_grabbed_without_request() {
        let (base, hits) = spawn_tracker().await;
        let dir = TempDir::new().unwrap();
        let downloader = TorrentDownloader::new(dir.path(), options()).unwrap();
        let mut ledger = HistoryLedger::new();
        ledger.record_grab("blutopia", "/torrents/42");

        let outcome = downloader
            .download(&candidate(&base, "torrent"), &mut ledger)
            .await
            .unwrap();

        assert_eq!(outcome, DownloadOutcome::SkippedPreviouslyGrabbed);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_history_is_per_tracker() {
        let (base, hits) = spawn_tracker().await;
        let dir = TempDir::new().unwrap();
        let downloader = TorrentDownloader::new(dir.path(), options()).unwrap();
        let mut ledger = HistoryLedger::new();
        ledger.record_grab("aither", "/torrents/42");

        let outcome = downloader
            .download(&candidate(&base, "torrent"), &mut ledger)
            .await
            .unwrap();

        assert!(matches!(outcome, DownloadOutcome::Saved { .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ignore_history_downloads_again() {
        let (base, hits) = spawn_tracker().await;
        let dir = TempDir::new().unwrap();
        let downloader = TorrentDownloader::new(
            dir.path(),
            DownloadOptions {
                ignore_history: true,
                ..options()
            },
        )
        .unwrap();
        let mut ledger = HistoryLedger::new();
        ledger.record_grab("blutopia", "/torrents/42");

        let outcome = downloader
            .download(&candidate(&base, "torrent"), &mut ledger)
            .await
            .unwrap();

        assert!(matches!(outcome, DownloadOutcome::Saved { .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(ledger.grabbed("blutopia").len(), 1);
    }

    #[tokio::test]
    async fn test_collisions_get_numbered_names() {
        let (base, _) = spawn_tracker().await;
        let dir = TempDir::new().unwrap();
        let downloader = TorrentDownloader::new(
            dir.path(),
            DownloadOptions {
                ignore_history: true,
                ..options()
            },
        )
        .unwrap();
        let mut ledger = HistoryLedger::new();
        let result = candidate(&base, "torrent");

        for _ in 0..3 {
            downloader.download(&result, &mut ledger).await.unwrap();
        }

        for name in [
            "Movie.Name.2010.1080p [Blutopia].torrent",
            "Movie.Name.2010.1080p [Blutopia] (1).torrent",
            "Movie.Name.2010.1080p [Blutopia] (2).torrent",
        ] {
            assert!(dir.path().join(name).is_file(), "missing {}", name);
        }
    }

    #[tokio::test]
    async fn test_invalid_payload_is_discarded() {
        let (base, _) = spawn_tracker().await;
        let dir = TempDir::new().unwrap();
        let downloader = TorrentDownloader::new(dir.path(), options()).unwrap();
        let mut ledger = HistoryLedger::new();

        let err = downloader
            .download(&candidate(&base, "html"), &mut ledger)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::InvalidTorrent { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(ledger.grab_count(), 0);
    }

    #[tokio::test]
    async fn test_unverified_payload_is_kept() {
        let (base, _) = spawn_tracker().await;
        let dir = TempDir::new().unwrap();
        let downloader = TorrentDownloader::new(
            dir.path(),
            DownloadOptions {
                verify_torrent: false,
                ..options()
            },
        )
        .unwrap();
        let mut ledger = HistoryLedger::new();

        let outcome = downloader
            .download(&candidate(&base, "html"), &mut ledger)
            .await
            .unwrap();

        assert!(matches!(outcome, DownloadOutcome::Saved { .. }));
        assert_eq!(ledger.grab_count(), 1);
    }

    #[tokio::test]
    async fn test_http_error_leaves_no_file() {
        let (base, _) = spawn_tracker().await;
        let dir = TempDir::new().unwrap();
        let downloader = TorrentDownloader::new(dir.path(), options()).unwrap();
        let mut ledger = HistoryLedger::new();

        let err = downloader
            .download(&candidate(&base, "gone"), &mut ledger)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Http(_)));
        assert!(!err.is_transient());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(ledger.grab_count(), 0);
    }

    #[tokio::test]
    async fn test_connection_refused_after_retry() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let dir = TempDir::new().unwrap();
        let downloader = TorrentDownloader::new(dir.path(), options()).unwrap();
        let mut ledger = HistoryLedger::new();

        let err = downloader
            .download(&candidate(&base, "torrent"), &mut ledger)
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
