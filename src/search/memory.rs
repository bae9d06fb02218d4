//! In-memory search backend for testing.
//!
//! Evaluates the [`Query`] DSL directly over stored JSON documents with the
//! same boolean semantics a real backend is expected to provide: `must` and
//! `filter` clauses all hold, `must_not` clauses all fail, non-empty `should`
//! requires `minimum_should_match` matches, and a bool query with no clauses
//! matches nothing. Documents are returned in insertion order; the insertion
//! sequence number doubles as the search-after sort key.

use super::backend::{SearchAfterRequest, SearchBackend, SearchHit, SearchRequest, SearchResponse};
use super::query::Query;
use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory search backend.
pub struct InMemorySearchBackend {
    /// Stored documents per index, in insertion order.
    indices: RwLock<HashMap<String, Vec<Value>>>,
    /// Artificial latency per search call, for deadline tests.
    latency: Option<Duration>,
}

impl Default for InMemorySearchBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySearchBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self {
            indices: RwLock::new(HashMap::new()),
            latency: None,
        }
    }

    /// Create a backend whose every search sleeps for `latency` first.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            indices: RwLock::new(HashMap::new()),
            latency: Some(latency),
        }
    }

    /// Store a document.
    pub async fn index_document(&self, index: &str, document: Value) {
        self.indices
            .write()
            .await
            .entry(index.to_string())
            .or_default()
            .push(document);
    }

    /// Number of documents stored in an index.
    pub async fn doc_count(&self, index: &str) -> usize {
        self.indices
            .read()
            .await
            .get(index)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    async fn matching(&self, index: &str, query: &Query) -> Vec<(usize, Value)> {
        let indices = self.indices.read().await;
        indices
            .get(index)
            .map(|docs| {
                docs.iter()
                    .enumerate()
                    .filter(|(_, doc)| evaluate(query, doc))
                    .map(|(seq, doc)| (seq, doc.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl SearchBackend for InMemorySearchBackend {
    async fn search(&self, index: &str, request: SearchRequest) -> Result<SearchResponse> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let started = std::time::Instant::now();
        let matched = self.matching(index, &request.query).await;
        let total = matched.len();
        let hits = matched
            .into_iter()
            .skip(request.from)
            .take(request.size)
            .map(|(seq, doc)| SearchHit {
                source: doc,
                sort: Some(vec![Value::from(seq as u64)]),
            })
            .collect();
        Ok(SearchResponse {
            total,
            hits,
            took_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn search_after(&self, index: &str, request: SearchAfterRequest) -> Result<SearchResponse> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let started = std::time::Instant::now();
        let matched = self.matching(index, &request.query).await;
        let total = matched.len();
        let resume_after = request
            .sort_after
            .as_ref()
            .and_then(|sort| sort.first())
            .and_then(|value| value.as_u64());
        let hits = matched
            .into_iter()
            .filter(|(seq, _)| resume_after.map(|after| *seq as u64 > after).unwrap_or(true))
            .take(request.size)
            .map(|(seq, doc)| SearchHit {
                source: doc,
                sort: Some(vec![Value::from(seq as u64)]),
            })
            .collect();
        Ok(SearchResponse {
            total,
            hits,
            took_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Look up a dotted field path like `source.urn` in a document.
fn field_value<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

fn term_matches(document: &Value, field: &str, expected: &str) -> bool {
    match field_value(document, field) {
        Some(Value::String(actual)) => actual == expected,
        Some(Value::Number(actual)) => actual.to_string() == expected,
        Some(Value::Bool(actual)) => actual.to_string() == expected,
        _ => false,
    }
}

/// Evaluate a query against a single document.
fn evaluate(query: &Query, document: &Value) -> bool {
    match query {
        Query::MatchAll => true,

        Query::Term { field, value } => term_matches(document, field, value),

        Query::Terms { field, values } => values.iter().any(|value| term_matches(document, field, value)),

        Query::Range { field, gte, lte } => match field_value(document, field).and_then(Value::as_i64) {
            Some(actual) => {
                gte.map(|bound| actual >= bound).unwrap_or(true)
                    && lte.map(|bound| actual <= bound).unwrap_or(true)
            }
            None => false,
        },

        Query::Exists { field } => field_value(document, field).is_some(),

        Query::Bool {
            must,
            should,
            must_not,
            filter,
            minimum_should_match,
        } => {
            if must.is_empty() && should.is_empty() && must_not.is_empty() && filter.is_empty() {
                return false;
            }
            if !must.iter().all(|clause| evaluate(clause, document)) {
                return false;
            }
            if !filter.iter().all(|clause| evaluate(clause, document)) {
                return false;
            }
            if must_not.iter().any(|clause| evaluate(clause, document)) {
                return false;
            }
            if !should.is_empty() {
                let matched = should.iter().filter(|clause| evaluate(clause, document)).count();
                if matched < (*minimum_should_match).max(1) {
                    return false;
                }
            }
            true
        }
    }
}
