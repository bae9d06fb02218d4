// Path tracking for lineage traversal

use crate::types::{RelationshipDirection, Urn};

/// Extend the known paths with a newly traversed `parent -> child` hop at
/// hop number `hop`, and return the paths produced for `child`.
///
/// Paths grow toward the child: for OUTGOING traversal the root sits at the
/// tail and children are prepended, for INCOMING the root sits at the head
/// and children are appended. Every existing path of the parent's generation
/// (`hop` elements) whose growth-side endpoint equals `parent` is cloned and
/// extended; the clones are added to `existing` and returned. When no such
/// path exists the hop seeds a fresh two-element path. Earlier paths are
/// never mutated.
pub fn extend_paths(
    existing: &mut Vec<Vec<Urn>>,
    parent: &Urn,
    child: &Urn,
    direction: RelationshipDirection,
    hop: usize,
) -> Vec<Vec<Urn>> {
    let mut produced: Vec<Vec<Urn>> = existing
        .iter()
        .filter(|path| {
            let endpoint = match direction {
                RelationshipDirection::Outgoing => path.first(),
                RelationshipDirection::Incoming => path.last(),
            };
            path.len() == hop && endpoint == Some(parent)
        })
        .cloned()
        .collect();

    if produced.is_empty() {
        produced.push(match direction {
            RelationshipDirection::Outgoing => vec![child.clone(), parent.clone()],
            RelationshipDirection::Incoming => vec![parent.clone(), child.clone()],
        });
    } else {
        for path in &mut produced {
            match direction {
                RelationshipDirection::Outgoing => path.insert(0, child.clone()),
                RelationshipDirection::Incoming => path.push(child.clone()),
            }
        }
    }

    // Duplicate edge documents for the same hop must not duplicate routes.
    for path in &produced {
        if !existing.contains(path) {
            existing.push(path.clone());
        }
    }
    produced
}

/// All distinct known routes of the given length that end at `entity` (on
/// either growth side).
pub(crate) fn routes_to(paths: &[Vec<Urn>], entity: &Urn, len: usize) -> Vec<Vec<Urn>> {
    let mut routes: Vec<Vec<Urn>> = Vec::new();
    for path in paths {
        if path.len() == len
            && (path.first() == Some(entity) || path.last() == Some(entity))
            && !routes.contains(path)
        {
            routes.push(path.clone());
        }
    }
    routes
}
