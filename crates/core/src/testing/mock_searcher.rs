//! Mock searcher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::searcher::{SearchError, SearchQuery, SearchResult, Searcher};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    /// The query that was searched.
    pub query: SearchQuery,
}

/// A query handler that produces results dynamically based on the query.
type QueryHandler = Box<dyn Fn(&SearchQuery) -> Result<Vec<SearchResult>, SearchError> + Send + Sync>;

/// Mock implementation of the Searcher trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable search results
/// - Track search queries for assertions
/// - Simulate failures
///
/// Clones share state, so a test can keep a handle after moving one into a
/// `SearchClient`.
///
/// # Example
///
/// ```rust,ignore
/// use crossseed_core::testing::{MockSearcher, fixtures};
///
/// let searcher = MockSearcher::new();
/// searcher.set_results(vec![
///     fixtures::search_result("Aither", "Movie.Name.2010.1080p", 4_000_000_000),
/// ]).await;
///
/// let results = searcher.search(&query).await?;
/// assert_eq!(results.len(), 1);
/// assert_eq!(searcher.search_count().await, 1);
/// ```
#[derive(Clone)]
pub struct MockSearcher {
    /// Configured results to return.
    results: Arc<RwLock<Vec<SearchResult>>>,
    /// Recorded search queries.
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
    /// Query handler for dynamic result generation.
    query_handler: Arc<RwLock<Option<QueryHandler>>>,
}

impl std::fmt::Debug for MockSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSearcher")
            .field("results", &"<results>")
            .field("searches", &"<searches>")
            .field("next_error", &"<next_error>")
            .field("query_handler", &"<handler>")
            .finish()
    }
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearcher {
    /// Create a new mock searcher with empty results.
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(Vec::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            query_handler: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the results to return for subsequent searches.
    pub async fn set_results(&self, results: Vec<SearchResult>) {
        *self.results.write().await = results;
    }

    /// Get recorded search queries.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Get the number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set a handler that answers each query, overriding fixed results.
    pub async fn set_query_handler<F>(&self, handler: F)
    where
        F: Fn(&SearchQuery) -> Result<Vec<SearchResult>, SearchError> + Send + Sync + 'static,
    {
        *self.query_handler.write().await = Some(Box::new(handler));
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        self.searches.write().await.push(RecordedSearch {
            query: query.clone(),
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if let Some(handler) = self.query_handler.read().await.as_ref() {
            return handler(query);
        }

        Ok(self.results.read().await.clone())
    }
}
