//! Common test utilities for integration tests.

use lineage_graph::config::GraphConfig;
use lineage_graph::lineage::{GraphQueryEngine, GRAPH_INDEX_NAME};
use lineage_graph::registry::InMemoryLineageRegistry;
use lineage_graph::search::InMemorySearchBackend;
use lineage_graph::types::{GraphFilters, Urn};
use serde_json::{json, Value};
use std::sync::Arc;

pub type TestEngine = GraphQueryEngine<InMemorySearchBackend, InMemoryLineageRegistry>;

/// Seed registry used by most scenarios:
/// `dataset --DownstreamOf--> dataset` and `dataJob --Produces--> dataset`,
/// both pointing at the downstream side.
pub fn seed_registry() -> InMemoryLineageRegistry {
    InMemoryLineageRegistry::builder()
        .points_downstream("dataset", "DownstreamOf", "dataset")
        .points_downstream("dataJob", "Produces", "dataset")
        .build()
}

/// Engine over the given backend with the seed registry and defaults.
pub fn engine(backend: Arc<InMemorySearchBackend>) -> TestEngine {
    engine_with_registry(backend, seed_registry())
}

pub fn engine_with_registry(
    backend: Arc<InMemorySearchBackend>,
    registry: InMemoryLineageRegistry,
) -> TestEngine {
    GraphQueryEngine::new(backend, Arc::new(registry), GraphConfig::default())
        .expect("engine construction")
}

/// Graph filters admitting the entity types the seed registry knows.
pub fn filters() -> GraphFilters {
    GraphFilters::allowing(["dataset", "dataJob"])
}

pub fn dataset(key: &str) -> Urn {
    Urn::new("dataset", key)
}

pub fn data_job(key: &str) -> Urn {
    Urn::new("dataJob", key)
}

/// A bare edge document.
pub fn edge(source: &Urn, dest: &Urn, relationship_type: &str) -> Value {
    json!({
        "source": {"urn": source.as_str(), "entityType": source.entity_type()},
        "destination": {"urn": dest.as_str(), "entityType": dest.entity_type()},
        "relationshipType": relationship_type,
    })
}

pub async fn index_edges(backend: &InMemorySearchBackend, edges: Vec<Value>) {
    for doc in edges {
        backend.index_document(GRAPH_INDEX_NAME, doc).await;
    }
}
