//! Core types shared across the lineage graph engine.

use crate::error::{GraphError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Key inside an edge document's `properties` map that records where the
/// edge came from.
pub const PROPERTY_SOURCE_KEY: &str = "source";

/// Sentinel value of `properties.source` marking a manually authored edge.
/// Manual edges are exempt from time-range filtering.
pub const MANUAL_EDGE_SOURCE: &str = "UI";

/// An opaque typed entity identifier of the form `urn:<entity-type>:<key>`.
///
/// The engine never interprets the key; only the entity type (compared
/// case-insensitively for edge matching) and the stable string form matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Urn {
    raw: String,
    entity_type: String,
}

impl Urn {
    /// Build an urn from its entity type and key.
    pub fn new(entity_type: &str, key: &str) -> Self {
        Self {
            raw: format!("urn:{}:{}", entity_type, key),
            entity_type: entity_type.to_string(),
        }
    }

    /// Parse an urn from its string form.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("urn"), Some(entity_type), Some(key)) if !entity_type.is_empty() && !key.is_empty() => {
                Ok(Self {
                    raw: raw.to_string(),
                    entity_type: entity_type.to_string(),
                })
            }
            _ => Err(GraphError::InvalidUrn(raw.to_string())),
        }
    }

    /// The entity type segment of the urn.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The stable string form of the urn.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Urn {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Urn {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Urn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Urn::parse(&raw).map_err(D::Error::custom)
    }
}

/// Direction of a lineage traversal, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineageDirection {
    Upstream,
    Downstream,
}

/// Direction of an edge relative to an entity, as stored in the index.
///
/// The index stores absolute `(source, destination)` tuples; this enum says
/// which side of an edge document a given entity sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipDirection {
    Outgoing,
    Incoming,
}

/// Restricts both source-side and destination-side entity types of any edge
/// considered during traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFilters {
    /// Entity types an edge endpoint may have.
    pub allowed_entity_types: Vec<String>,
}

impl GraphFilters {
    /// Allow only the given entity types on both edge endpoints.
    pub fn allowing(entity_types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed_entity_types: entity_types.into_iter().map(Into::into).collect(),
        }
    }
}

/// Comparison condition of a [`Criterion`].
///
/// The query builder only accepts [`Condition::Equal`]; the other variants
/// exist so callers' filters can be rejected with a precise error instead of
/// silently matching nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    Equal,
    Contain,
    StartWith,
    EndWith,
    GreaterThan,
    LessThan,
    In,
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub field: String,
    pub value: String,
    pub condition: Condition,
}

impl Criterion {
    /// Equality criterion, the only condition the engine supports.
    pub fn equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            condition: Condition::Equal,
        }
    }
}

/// A conjunction of criteria; all must hold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConjunctiveCriterion {
    pub and: Vec<Criterion>,
}

/// A filter is a disjunction of conjunctions: at least one [`ConjunctiveCriterion`]
/// must hold in full.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Filter {
    pub or: Vec<ConjunctiveCriterion>,
}

impl Filter {
    /// A filter that matches everything (no constraints).
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single-conjunction filter.
    pub fn all_of(criteria: Vec<Criterion>) -> Self {
        Self {
            or: vec![ConjunctiveCriterion { and: criteria }],
        }
    }
}

/// Constrains which side of an edge document the "source" of a relationship
/// query refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RelationshipFilter {
    pub direction: RelationshipDirection,
}

/// One endpoint of an edge document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeEndpoint {
    pub urn: Urn,
    pub entity_type: String,
}

/// An edge record as stored in the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDocument {
    pub source: EdgeEndpoint,
    pub destination: EdgeEndpoint,
    pub relationship_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_actor: Option<Urn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_actor: Option<Urn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, serde_json::Value>>,
}

impl EdgeDocument {
    /// Whether this edge was manually authored (`properties.source == "UI"`).
    pub fn is_manual(&self) -> bool {
        self.properties
            .as_ref()
            .and_then(|props| props.get(PROPERTY_SOURCE_KEY))
            .and_then(|value| value.as_str())
            .map(|value| value == MANUAL_EDGE_SOURCE)
            .unwrap_or(false)
    }
}

/// A discovered lineage relationship, one per entity reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageRelationship {
    /// Relationship type of the edge through which the entity was first reached.
    #[serde(rename = "type")]
    pub relationship_type: String,
    /// The reached entity.
    pub entity: Urn,
    /// Hop at which the entity was discovered, counting from 1.
    pub degree: usize,
    /// All root-to-entity paths known at discovery time.
    pub paths: Vec<Vec<Urn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_actor: Option<Urn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_actor: Option<Urn>,
    pub is_manual: bool,
}

/// Result of a lineage traversal. `total` is the pre-slice count so callers
/// can page without losing the global size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageResponse {
    pub total: usize,
    pub relationships: Vec<LineageRelationship>,
}
