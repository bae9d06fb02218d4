// Search backend contract

use super::query::Query;
use crate::error::Result;
use serde::{Deserialize, Serialize};

fn default_size() -> usize {
    10
}

/// A from/size paged search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: Query,
    /// Start offset
    #[serde(default)]
    pub from: usize,
    /// Maximum results
    #[serde(default = "default_size")]
    pub size: usize,
}

/// A search-after paged search, for streaming scans past the result window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchAfterRequest {
    pub query: Query,
    /// Sort values of the last hit of the previous page, if any.
    #[serde(default)]
    pub sort_after: Option<Vec<serde_json::Value>>,
    /// Point-in-time id keeping the view consistent across pages.
    #[serde(default)]
    pub pit_id: Option<String>,
    /// How long the point-in-time view is kept alive, e.g. `"5m"`.
    pub keep_alive: String,
    pub size: usize,
}

/// A single hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The stored document.
    pub source: serde_json::Value,
    /// Sort values to resume a search-after scan from this hit.
    #[serde(default)]
    pub sort: Option<Vec<serde_json::Value>>,
}

/// Search response. `total` counts all matches, not just the returned page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total: usize,
    pub hits: Vec<SearchHit>,
    /// Time taken in milliseconds
    pub took_ms: u64,
}

/// The search primitive the engine runs on.
///
/// Implementations own transport, retries, and cluster concerns; the engine
/// only composes queries and consumes hits.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Execute a from/size paged search against an index.
    async fn search(&self, index: &str, request: SearchRequest) -> Result<SearchResponse>;

    /// Execute a search-after paged search against an index.
    async fn search_after(&self, index: &str, request: SearchAfterRequest) -> Result<SearchResponse>;
}
