// Extraction of typed relationships from edge-index search hits

use super::paths::extend_paths;
use crate::error::Result;
use crate::registry::EdgeInfo;
use crate::search::backend::SearchResponse;
use crate::types::{EdgeDocument, LineageRelationship, RelationshipDirection, Urn};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Traversal-scoped state shared by all batches of a hop.
///
/// Guarded by a single lock so the visited check, the visited insert, and
/// the path extension happen atomically per candidate: when two batches race
/// on the same neighbor, exactly one emits it.
pub(crate) struct TraversalState {
    pub visited: HashSet<Urn>,
    /// Hop at which each emitted entity was first discovered. The root is
    /// visited but never discovered.
    pub discovered: HashMap<Urn, usize>,
    pub paths: Vec<Vec<Urn>>,
}

impl TraversalState {
    pub fn new(root: Urn) -> Self {
        let mut visited = HashSet::new();
        visited.insert(root);
        Self {
            visited,
            discovered: HashMap::new(),
            paths: Vec::new(),
        }
    }
}

/// Decode every hit and emit a relationship for each valid, unvisited edge
/// endpoint reachable from the frontier.
///
/// A hit is tried on both sides independently: its source may be a frontier
/// urn with a valid outgoing edge, and its destination may be a frontier urn
/// with a valid incoming edge. Both can emit from the same hit when both
/// endpoints sit in the frontier.
pub(crate) fn extract_relationships(
    frontier: &HashSet<Urn>,
    response: &SearchResponse,
    valid_edges: &HashSet<(String, EdgeInfo)>,
    state: &Mutex<TraversalState>,
    num_hops: usize,
) -> Result<Vec<LineageRelationship>> {
    let mut result = Vec::new();

    for hit in &response.hits {
        let document: EdgeDocument = serde_json::from_value(hit.source.clone())?;

        // Potential outgoing edge
        if frontier.contains(&document.source.urn) {
            let edge = EdgeInfo::new(
                &document.relationship_type,
                RelationshipDirection::Outgoing,
                &document.destination.entity_type,
            );
            let key = (document.source.urn.entity_type().to_lowercase(), edge);
            if valid_edges.contains(&key) {
                if let Some(relationship) = visit(
                    state,
                    &document,
                    &document.source.urn,
                    &document.destination.urn,
                    RelationshipDirection::Outgoing,
                    num_hops,
                ) {
                    result.push(relationship);
                }
            }
        }

        // Potential incoming edge
        if frontier.contains(&document.destination.urn) {
            let edge = EdgeInfo::new(
                &document.relationship_type,
                RelationshipDirection::Incoming,
                &document.source.entity_type,
            );
            let key = (document.destination.urn.entity_type().to_lowercase(), edge);
            if valid_edges.contains(&key) {
                if let Some(relationship) = visit(
                    state,
                    &document,
                    &document.destination.urn,
                    &document.source.urn,
                    RelationshipDirection::Incoming,
                    num_hops,
                ) {
                    result.push(relationship);
                }
            }
        }
    }

    Ok(result)
}

/// Record one valid `parent -> child` hop. The first sighting of a child
/// emits a relationship; a later sighting in the same hop only records the
/// extra route, so a child reached through multiple predecessors accumulates
/// one path per route. Sightings of entities discovered at earlier hops are
/// dropped entirely.
fn visit(
    state: &Mutex<TraversalState>,
    document: &EdgeDocument,
    parent: &Urn,
    child: &Urn,
    direction: RelationshipDirection,
    num_hops: usize,
) -> Option<LineageRelationship> {
    let mut guard = state.lock();
    if !guard.visited.contains(child) {
        guard.visited.insert(child.clone());
        guard.discovered.insert(child.clone(), num_hops);
        let paths = extend_paths(&mut guard.paths, parent, child, direction, num_hops);
        drop(guard);
        Some(to_relationship(document, child.clone(), num_hops, paths))
    } else {
        if guard.discovered.get(child) == Some(&num_hops) {
            extend_paths(&mut guard.paths, parent, child, direction, num_hops);
        }
        None
    }
}

fn to_relationship(
    document: &EdgeDocument,
    entity: Urn,
    num_hops: usize,
    paths: Vec<Vec<Urn>>,
) -> LineageRelationship {
    LineageRelationship {
        relationship_type: document.relationship_type.clone(),
        entity,
        degree: num_hops,
        paths,
        created_on: document.created_on,
        created_actor: document.created_actor.clone(),
        updated_on: document.updated_on,
        updated_actor: document.updated_actor.clone(),
        is_manual: document.is_manual(),
    }
}
