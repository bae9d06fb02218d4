//! Edge-type registry: which typed edges may leave an entity type in a given
//! lineage direction.
//!
//! The registry answers "what can leave an entity of type T", while the index
//! stores absolute `(source, destination)` tuples. The hit extractor bridges
//! the two by consulting both sides of every hit, so the [`EdgeInfo`]s
//! returned here carry the index-side direction alongside the opposite entity
//! type.

use crate::types::{LineageDirection, RelationshipDirection};
use std::collections::HashMap;

/// Descriptor of a structurally valid edge for some entity type.
///
/// Two `EdgeInfo`s are equal when all three fields match; direction and types
/// are part of identity. The opposite entity type is normalized to lowercase
/// at construction so comparisons against index documents are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeInfo {
    relationship_type: String,
    direction: RelationshipDirection,
    opposite_entity_type: String,
}

impl EdgeInfo {
    pub fn new(
        relationship_type: impl Into<String>,
        direction: RelationshipDirection,
        opposite_entity_type: &str,
    ) -> Self {
        Self {
            relationship_type: relationship_type.into(),
            direction,
            opposite_entity_type: opposite_entity_type.to_lowercase(),
        }
    }

    pub fn relationship_type(&self) -> &str {
        &self.relationship_type
    }

    pub fn direction(&self) -> RelationshipDirection {
        self.direction
    }

    pub fn opposite_entity_type(&self) -> &str {
        &self.opposite_entity_type
    }
}

/// Lookup of valid edges per entity type and lineage direction.
pub trait LineageRegistry: Send + Sync {
    /// The universe of edges that may originate from entities of
    /// `entity_type` in the given lineage direction. Entity-type lookup is
    /// case-insensitive.
    fn lineage_relationships(&self, entity_type: &str, direction: LineageDirection) -> Vec<EdgeInfo>;
}

/// Registry backed by a static table, built once at startup.
#[derive(Debug, Default)]
pub struct InMemoryLineageRegistry {
    edges: HashMap<(String, LineageDirection), Vec<EdgeInfo>>,
}

impl InMemoryLineageRegistry {
    pub fn builder() -> LineageRegistryBuilder {
        LineageRegistryBuilder::default()
    }
}

impl LineageRegistry for InMemoryLineageRegistry {
    fn lineage_relationships(&self, entity_type: &str, direction: LineageDirection) -> Vec<EdgeInfo> {
        self.edges
            .get(&(entity_type.to_lowercase(), direction))
            .cloned()
            .unwrap_or_default()
    }
}

/// Builder deriving per-direction [`EdgeInfo`]s from relationship
/// declarations.
///
/// A relationship is declared once, from the side that stores it in the
/// index, together with the lineage orientation of the arrow:
///
/// - `points_upstream`: the destination is upstream of the source (e.g.
///   `dataset --DownstreamOf--> dataset`). The source type reaches upstream
///   through the edge's source side; the destination type reaches downstream
///   through its destination side.
/// - `points_downstream`: the destination is downstream of the source (e.g.
///   `dataJob --Produces--> dataset`).
#[derive(Debug, Default)]
pub struct LineageRegistryBuilder {
    edges: HashMap<(String, LineageDirection), Vec<EdgeInfo>>,
}

impl LineageRegistryBuilder {
    /// Declare an edge whose destination is upstream of its source.
    pub fn points_upstream(self, source_type: &str, relationship_type: &str, destination_type: &str) -> Self {
        self.add(
            source_type,
            LineageDirection::Upstream,
            EdgeInfo::new(relationship_type, RelationshipDirection::Outgoing, destination_type),
        )
        .add(
            destination_type,
            LineageDirection::Downstream,
            EdgeInfo::new(relationship_type, RelationshipDirection::Incoming, source_type),
        )
    }

    /// Declare an edge whose destination is downstream of its source.
    pub fn points_downstream(self, source_type: &str, relationship_type: &str, destination_type: &str) -> Self {
        self.add(
            source_type,
            LineageDirection::Downstream,
            EdgeInfo::new(relationship_type, RelationshipDirection::Outgoing, destination_type),
        )
        .add(
            destination_type,
            LineageDirection::Upstream,
            EdgeInfo::new(relationship_type, RelationshipDirection::Incoming, source_type),
        )
    }

    fn add(mut self, entity_type: &str, direction: LineageDirection, edge: EdgeInfo) -> Self {
        self.edges
            .entry((entity_type.to_lowercase(), direction))
            .or_default()
            .push(edge);
        self
    }

    pub fn build(self) -> InMemoryLineageRegistry {
        InMemoryLineageRegistry { edges: self.edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> InMemoryLineageRegistry {
        InMemoryLineageRegistry::builder()
            .points_upstream("dataset", "DownstreamOf", "dataset")
            .points_downstream("dataJob", "Produces", "dataset")
            .build()
    }

    #[test]
    fn test_points_upstream_derivation() {
        let registry = registry();

        let upstream = registry.lineage_relationships("dataset", LineageDirection::Upstream);
        assert!(upstream.contains(&EdgeInfo::new(
            "DownstreamOf",
            RelationshipDirection::Outgoing,
            "dataset"
        )));

        let downstream = registry.lineage_relationships("dataset", LineageDirection::Downstream);
        assert!(downstream.contains(&EdgeInfo::new(
            "DownstreamOf",
            RelationshipDirection::Incoming,
            "dataset"
        )));
    }

    #[test]
    fn test_points_downstream_derivation() {
        let registry = registry();

        let job_downstream = registry.lineage_relationships("dataJob", LineageDirection::Downstream);
        assert_eq!(
            job_downstream,
            vec![EdgeInfo::new("Produces", RelationshipDirection::Outgoing, "dataset")]
        );

        let dataset_upstream = registry.lineage_relationships("dataset", LineageDirection::Upstream);
        assert!(dataset_upstream.contains(&EdgeInfo::new(
            "Produces",
            RelationshipDirection::Incoming,
            "dataJob"
        )));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = registry();
        let via_lower = registry.lineage_relationships("datajob", LineageDirection::Downstream);
        let via_camel = registry.lineage_relationships("DataJob", LineageDirection::Downstream);
        assert_eq!(via_lower, via_camel);
        assert_eq!(via_lower.len(), 1);
    }

    #[test]
    fn test_unknown_type_has_no_edges() {
        let registry = registry();
        assert!(registry
            .lineage_relationships("chart", LineageDirection::Upstream)
            .is_empty());
    }

    #[test]
    fn test_edge_info_identity_includes_direction_and_type() {
        let a = EdgeInfo::new("DownstreamOf", RelationshipDirection::Outgoing, "dataset");
        let b = EdgeInfo::new("DownstreamOf", RelationshipDirection::Incoming, "dataset");
        let c = EdgeInfo::new("DownstreamOf", RelationshipDirection::Outgoing, "Dataset");
        assert_ne!(a, b);
        assert_eq!(a, c); // opposite type is lowercased at construction
    }
}
