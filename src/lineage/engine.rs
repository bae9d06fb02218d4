//! Level-order lineage traversal over the edge index.
//!
//! # How a traversal works
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     GraphQueryEngine                           │
//! ├────────────────────────────────────────────────────────────────┤
//! │  1. Frontier starts as the root urn                            │
//! │  2. Each hop partitions the frontier into batches              │
//! │  3. Batches search the edge index concurrently                 │
//! │  4. Hits become typed relationships; first sighting wins       │
//! │  5. Discovered entities form the next frontier                 │
//! │  6. Loop until max hops, an empty frontier, or the deadline    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One wall-clock budget governs the whole traversal. Batches that miss the
//! budget are abandoned and the completed hops' results are returned; running
//! out of time is not an error.

use super::extract::{extract_relationships, TraversalState};
use super::{builder, paths};
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::observability;
use crate::registry::{EdgeInfo, LineageRegistry};
use crate::search::backend::{SearchAfterRequest, SearchBackend, SearchRequest, SearchResponse};
use crate::search::query::BoolQuery;
use crate::types::{
    Filter, GraphFilters, LineageDirection, LineageRelationship, LineageResponse, RelationshipFilter, Urn,
};
use futures::stream::{FuturesUnordered, StreamExt};
use metrics::{counter, histogram};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info};

/// Logical name of the edge index.
pub const GRAPH_INDEX_NAME: &str = "graph_service_v1";

const SEARCH_EXECUTIONS_METRIC: &str = "num_elasticSearch_reads";
const SEARCH_LATENCY_METRIC: &str = "esQuery";

/// Lineage traversal engine over a search backend and an edge-type registry.
///
/// All state is request-scoped; one engine serves concurrent callers.
pub struct GraphQueryEngine<B, R> {
    backend: Arc<B>,
    registry: Arc<R>,
    config: GraphConfig,
}

impl<B, R> Clone for GraphQueryEngine<B, R> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
        }
    }
}

impl<B, R> GraphQueryEngine<B, R>
where
    B: SearchBackend + 'static,
    R: LineageRegistry + 'static,
{
    /// Build an engine, bringing up logging per `config.observability`.
    pub fn new(backend: Arc<B>, registry: Arc<R>, config: GraphConfig) -> Result<Self> {
        observability::init(&config.observability)?;
        Ok(Self {
            backend,
            registry,
            config,
        })
    }

    /// All entities reachable from `root` through valid typed edges, with
    /// the concrete paths taken to reach each.
    ///
    /// Expands level by level up to `max_hops`, deduplicating on first
    /// sighting. `total` in the response counts every discovered
    /// relationship; `offset`/`count` slice the returned page only.
    #[allow(clippy::too_many_arguments)]
    pub async fn get_lineage(
        &self,
        root: &Urn,
        direction: LineageDirection,
        graph_filters: &GraphFilters,
        offset: usize,
        count: usize,
        max_hops: usize,
        start_time_ms: Option<i64>,
        end_time_ms: Option<i64>,
    ) -> Result<LineageResponse> {
        let deadline = Instant::now() + self.config.traversal_timeout;
        let state = Arc::new(Mutex::new(TraversalState::new(root.clone())));
        let mut result: Vec<LineageRelationship> = Vec::new();
        let mut frontier: Vec<Urn> = vec![root.clone()];

        for hop in 1..=max_hops {
            if frontier.is_empty() {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                info!(
                    root = %root,
                    ?direction,
                    max_hops,
                    hop,
                    "Timed out while fetching lineage, returning results so far"
                );
                break;
            }

            let mut hop_relationships = self
                .lineage_relationships_in_batches(
                    frontier,
                    direction,
                    graph_filters,
                    Arc::clone(&state),
                    hop,
                    deadline - now,
                    start_time_ms,
                    end_time_ms,
                )
                .await?;

            // Merge point between hops: a batch emits a relationship the
            // moment its entity is first seen, so routes discovered later in
            // the same hop (re-convergence, possibly from another batch) are
            // only in the shared path list. Fold them back in here.
            {
                let guard = state.lock();
                for relationship in &mut hop_relationships {
                    let routes = paths::routes_to(&guard.paths, &relationship.entity, hop + 1);
                    if !routes.is_empty() {
                        relationship.paths = routes;
                    }
                }
            }

            frontier = hop_relationships.iter().map(|r| r.entity.clone()).collect();
            result.extend(hop_relationships);
        }

        let total = result.len();
        let relationships = if offset >= total {
            Vec::new()
        } else {
            result[offset..offset.saturating_add(count).min(total)].to_vec()
        };

        Ok(LineageResponse {
            total,
            relationships,
        })
    }

    /// One hop of the traversal: partition the frontier into batches,
    /// search them in parallel, and collect what finishes before the
    /// remaining-time budget elapses. Abandoned batches contribute nothing.
    #[allow(clippy::too_many_arguments)]
    async fn lineage_relationships_in_batches(
        &self,
        frontier: Vec<Urn>,
        direction: LineageDirection,
        graph_filters: &GraphFilters,
        state: Arc<Mutex<TraversalState>>,
        num_hops: usize,
        remaining: Duration,
        start_time_ms: Option<i64>,
        end_time_ms: Option<i64>,
    ) -> Result<Vec<LineageRelationship>> {
        let deadline = Instant::now() + remaining;
        let mut batches: FuturesUnordered<_> = frontier
            .chunks(self.config.batch_size)
            .map(|chunk| {
                let engine = self.clone();
                let batch = chunk.to_vec();
                let filters = graph_filters.clone();
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    engine
                        .one_hop_relationships(batch, direction, filters, state, num_hops, start_time_ms, end_time_ms)
                        .await
                })
            })
            .collect();

        let mut collected = Vec::new();
        loop {
            match timeout_at(deadline, batches.next()).await {
                Ok(Some(joined)) => {
                    let batch_result = joined
                        .map_err(|e| GraphError::Internal(format!("Lineage batch task failed: {}", e)))
                        .and_then(|inner| inner);
                    match batch_result {
                        Ok(relationships) => collected.extend(relationships),
                        Err(e) => {
                            for handle in batches.iter() {
                                handle.abort();
                            }
                            return Err(e);
                        }
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    info!(
                        num_hops,
                        completed = collected.len(),
                        abandoned = batches.len(),
                        "Hop deadline reached before all batches completed, abandoning the rest"
                    );
                    for handle in batches.iter() {
                        handle.abort();
                    }
                    break;
                }
            }
        }

        Ok(collected)
    }

    /// One batch of one hop: group urns by entity type, look up the valid
    /// edges per type, issue a single search, and extract relationships.
    #[allow(clippy::too_many_arguments)]
    async fn one_hop_relationships(
        &self,
        batch: Vec<Urn>,
        direction: LineageDirection,
        graph_filters: GraphFilters,
        state: Arc<Mutex<TraversalState>>,
        num_hops: usize,
        start_time_ms: Option<i64>,
        end_time_ms: Option<i64>,
    ) -> Result<Vec<LineageRelationship>> {
        let mut urns_per_type: HashMap<String, Vec<Urn>> = HashMap::new();
        for urn in &batch {
            urns_per_type
                .entry(urn.entity_type().to_lowercase())
                .or_default()
                .push(urn.clone());
        }
        let edges_per_type: HashMap<String, Vec<EdgeInfo>> = urns_per_type
            .keys()
            .map(|entity_type| {
                (
                    entity_type.clone(),
                    self.registry.lineage_relationships(entity_type, direction),
                )
            })
            .collect();

        let mut query = BoolQuery::new();
        for (entity_type, urns) in &urns_per_type {
            let edges = edges_per_type.get(entity_type).map(Vec::as_slice).unwrap_or(&[]);
            query = query.should(builder::frontier_query(
                urns,
                edges,
                &graph_filters,
                start_time_ms,
                end_time_ms,
            ));
        }

        let response = self
            .execute_search(SearchRequest {
                query: query.build(),
                from: 0,
                size: self.config.max_result_window,
            })
            .await?;

        let frontier: HashSet<Urn> = batch.into_iter().collect();
        let valid_edges: HashSet<(String, EdgeInfo)> = edges_per_type
            .into_iter()
            .flat_map(|(entity_type, edges)| {
                edges.into_iter().map(move |edge| (entity_type.clone(), edge))
            })
            .collect();

        extract_relationships(&frontier, &response, &valid_edges, &state, num_hops)
    }

    /// Edges matching explicit type and EQUAL-filter constraints, outside
    /// the BFS path.
    #[allow(clippy::too_many_arguments)]
    pub async fn related_edges(
        &self,
        source_types: Option<&[String]>,
        source_filter: &Filter,
        destination_types: Option<&[String]>,
        destination_filter: &Filter,
        relationship_types: &[String],
        relationship_filter: &RelationshipFilter,
        offset: usize,
        count: usize,
    ) -> Result<SearchResponse> {
        let query = builder::static_edge_query(
            source_types,
            source_filter,
            destination_types,
            destination_filter,
            relationship_types,
            relationship_filter,
        )?;
        self.execute_search(SearchRequest {
            query,
            from: offset,
            size: count,
        })
        .await
    }

    /// Streaming scan of the edge index via search-after pagination. Not
    /// used by the BFS path; exposed for callers that page past the result
    /// window.
    pub async fn execute_search_after(&self, request: SearchAfterRequest) -> Result<SearchResponse> {
        let index = self.config.index.index_name(GRAPH_INDEX_NAME);
        counter!(SEARCH_EXECUTIONS_METRIC).increment(1);
        let started = Instant::now();
        let result = self.backend.search_after(&index, request).await;
        histogram!(SEARCH_LATENCY_METRIC).record(started.elapsed().as_secs_f64());
        result.map_err(|e| self.backend_failure(e))
    }

    async fn execute_search(&self, request: SearchRequest) -> Result<SearchResponse> {
        let index = self.config.index.index_name(GRAPH_INDEX_NAME);
        counter!(SEARCH_EXECUTIONS_METRIC).increment(1);
        let started = Instant::now();
        let result = self.backend.search(&index, request).await;
        histogram!(SEARCH_LATENCY_METRIC).record(started.elapsed().as_secs_f64());
        result.map_err(|e| self.backend_failure(e))
    }

    fn backend_failure(&self, e: GraphError) -> GraphError {
        error!(error = %e, "Search query failed");
        match e {
            GraphError::SearchBackend(_) => e,
            other => GraphError::SearchBackend(other.to_string()),
        }
    }
}
