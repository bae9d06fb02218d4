//! Lineage traversal over the edge index.
//!
//! - Query building: registry edges + filters + time ranges into boolean
//!   queries against the edge index
//! - Hit extraction: edge documents back into typed relationships
//! - Path tracking: root-to-entity paths, direction-aware
//! - BFS engine: level-order expansion with per-hop concurrent batching
//!   under a global deadline

pub mod builder;
pub mod engine;
pub(crate) mod extract;
pub(crate) mod paths;

pub use engine::{GraphQueryEngine, GRAPH_INDEX_NAME};
