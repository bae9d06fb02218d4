//! lineage-graph - a search-index-backed lineage traversal engine.
//!
//! Given a root entity urn, a lineage direction, optional entity-type and
//! time-range filters, and a maximum hop depth, the engine returns every
//! entity reachable through valid typed edges together with the concrete
//! paths taken to reach each. Edges are never held as an in-memory graph;
//! they are materialized per hop by boolean queries against a search index
//! of edge documents.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      lineage-graph                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  BFS Engine: level-order expansion | deadline | paging      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Batching: frontier partitions | parallel searches          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Translation: registry + filters -> queries -> hits         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Seams: SearchBackend trait | LineageRegistry trait         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use lineage_graph::config::GraphConfig;
//! use lineage_graph::lineage::GraphQueryEngine;
//! use lineage_graph::registry::InMemoryLineageRegistry;
//! use lineage_graph::search::InMemorySearchBackend;
//! use lineage_graph::types::{GraphFilters, LineageDirection, Urn};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> lineage_graph::Result<()> {
//!     let registry = InMemoryLineageRegistry::builder()
//!         .points_upstream("dataset", "DownstreamOf", "dataset")
//!         .build();
//!     // Logging comes up with the engine, per `config.observability`.
//!     let engine = GraphQueryEngine::new(
//!         Arc::new(InMemorySearchBackend::new()),
//!         Arc::new(registry),
//!         GraphConfig::default(),
//!     )?;
//!
//!     let root = Urn::parse("urn:dataset:warehouse.orders")?;
//!     let response = engine
//!         .get_lineage(
//!             &root,
//!             LineageDirection::Upstream,
//!             &GraphFilters::allowing(["dataset"]),
//!             0,
//!             100,
//!             3,
//!             None,
//!             None,
//!         )
//!         .await?;
//!     println!("{} upstream entities", response.total);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

pub mod lineage;
pub mod observability;
pub mod registry;
pub mod search;

// Re-exports
pub use error::{GraphError, Result};
pub use types::*;
