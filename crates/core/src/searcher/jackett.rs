//! Jackett search backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::AggregatorConfig;
use crate::matcher::canonicalize_title;
use crate::metrics;
use crate::release::ReleaseCategory;

use super::{SearchError, SearchQuery, SearchResult, Searcher};

/// Jackett search backend implementation.
///
/// Searches go through the `all` meta-indexer, optionally narrowed with a
/// `Tracker[]` allow-list. A failed request is retried once after
/// `retry_delay`.
pub struct JackettSearcher {
    client: Client,
    config: AggregatorConfig,
    retry_delay: Duration,
}

impl JackettSearcher {
    /// Create a new JackettSearcher with the given configuration.
    pub fn new(config: AggregatorConfig, retry_delay: Duration) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            retry_delay,
        })
    }

    /// Check that the aggregator answers at all.
    pub async fn probe(&self) -> Result<(), SearchError> {
        self.client
            .head(&self.config.url)
            .send()
            .await
            .map(|_| ())
            .map_err(map_transport_error)
    }

    /// Build the Jackett API URL for a search.
    fn build_search_url(&self, query: &SearchQuery) -> String {
        let mut url = format!(
            "{}/api/v2.0/indexers/all/results?apikey={}&Query={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(&query.query)
        );

        if let Some(trackers) = query.trackers.as_ref().filter(|t| !t.is_empty()) {
            url.push_str(&format!(
                "&{}={}",
                urlencoding::encode("Tracker[]"),
                urlencoding::encode(&trackers.join(","))
            ));
        }

        if let Some(cat_id) = query.category.as_ref().and_then(category_to_jackett_id) {
            url.push_str(&format!("&{}={}", urlencoding::encode("Category[]"), cat_id));
        }

        if let Some(season) = query.season {
            url.push_str(&format!("&season={}", season));
        }

        if let Some(episode) = query.episode {
            url.push_str(&format!("&episode={}", episode));
        }

        url
    }

    /// Issue one search request.
    async fn search_once(&self, url: &str, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let jackett_response: JackettResponse = serde_json::from_str(&body).map_err(|e| {
            info!(response = %body, "Json decode error");
            SearchError::MalformedResponse(e.to_string())
        })?;

        if let Some(indexers) = &jackett_response.Indexers {
            if indexers.is_empty() {
                return Err(SearchError::NoActiveIndexers {
                    trackers: query
                        .trackers
                        .as_ref()
                        .map(|t| t.join(","))
                        .unwrap_or_default(),
                });
            }
            for indexer in indexers.iter().filter(|i| i.Error.is_some()) {
                warn!(
                    indexer = indexer.ID.as_deref().unwrap_or("?"),
                    error = indexer.Error.as_deref().unwrap_or_default(),
                    "Indexer reported an error"
                );
            }
        }

        let raw_count = jackett_response.Results.len();
        let results: Vec<SearchResult> = jackett_response
            .Results
            .into_iter()
            .filter_map(|raw| match raw.into_search_result() {
                Ok(result) => Some(result),
                Err(reason) => {
                    warn!(reason = %reason, "Discarding malformed search result");
                    None
                }
            })
            .collect();

        debug!(
            raw = raw_count,
            kept = results.len(),
            "Jackett search complete"
        );

        Ok(results)
    }
}

#[async_trait]
impl Searcher for JackettSearcher {
    fn name(&self) -> &str {
        "jackett"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        let start = Instant::now();
        let url = self.build_search_url(query);
        debug!(query = %query.query, "Searching Jackett");

        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;
            match self.search_once(&url, query).await {
                Err(e) if e.is_transient() && attempt == 1 => {
                    warn!(error = %e, "Search request failed. Retrying once more.");
                    metrics::SEARCH_REQUESTS.with_label_values(&["retry"]).inc();
                    tokio::time::sleep(self.retry_delay).await;
                }
                other => break other,
            }
        };

        let status = if outcome.is_ok() { "success" } else { "error" };
        metrics::SEARCH_REQUESTS.with_label_values(&[status]).inc();
        metrics::SEARCH_DURATION
            .with_label_values(&[])
            .observe(start.elapsed().as_secs_f64());
        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            status, "Search finished"
        );

        outcome
    }
}

fn map_transport_error(e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        SearchError::Timeout
    } else if e.is_connect() {
        SearchError::ConnectionFailed(e.to_string())
    } else {
        SearchError::ApiError(e.to_string())
    }
}

/// Map our categories to Jackett category IDs.
fn category_to_jackett_id(cat: &ReleaseCategory) -> Option<u32> {
    cat.torznab_id()
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    #[serde(default)]
    Results: Vec<JackettResult>,
    #[serde(default)]
    Indexers: Option<Vec<JackettIndexer>>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettIndexer {
    #[serde(default)]
    ID: Option<String>,
    #[serde(default)]
    Error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Tracker: Option<String>,
    TrackerId: Option<String>,
    CategoryDesc: Option<String>,
    Title: Option<String>,
    Link: Option<String>,
    Details: Option<String>,
    Category: Option<CategoryField>,
    Size: Option<i64>,
    Imdb: Option<ImdbField>,
}

/// Jackett reports `Category` as an array of ids; older builds used a bare id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryField {
    One(u32),
    Many(Vec<u32>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImdbField {
    Number(u64),
    Text(String),
}

impl JackettResult {
    /// Validate and trim a raw result.
    fn into_search_result(self) -> Result<SearchResult, String> {
        let title = self.Title.ok_or("missing Title")?;
        let tracker_id = self
            .TrackerId
            .filter(|t| !t.is_empty())
            .ok_or_else(|| format!("missing TrackerId for \"{}\"", title))?;
        let details_url = self
            .Details
            .filter(|d| crate::history::details_path(d).is_some())
            .ok_or_else(|| format!("missing or invalid Details for \"{}\"", title))?;
        let size_bytes = self
            .Size
            .and_then(|s| u64::try_from(s).ok())
            .ok_or_else(|| format!("missing or negative Size for \"{}\"", title))?;

        Ok(SearchResult {
            tracker: self.Tracker.unwrap_or_else(|| tracker_id.clone()),
            tracker_id,
            category_desc: self.CategoryDesc.unwrap_or_default(),
            title: canonicalize_title(&title),
            download_link: self.Link.filter(|l| !l.is_empty()),
            details_url,
            category: match self.Category {
                Some(CategoryField::One(id)) => Some(id),
                Some(CategoryField::Many(ids)) => ids.first().copied(),
                None => None,
            },
            size_bytes,
            imdb_id: match self.Imdb {
                Some(ImdbField::Number(0)) | None => None,
                Some(ImdbField::Number(n)) => Some(format!("tt{:07}", n)),
                Some(ImdbField::Text(s)) if s.is_empty() => None,
                Some(ImdbField::Text(s)) => Some(s),
            },
        })
    }
}
