//! Composition of edge-index queries from registry edges, graph filters,
//! urn frontiers, and time ranges.

use crate::error::{GraphError, Result};
use crate::registry::EdgeInfo;
use crate::search::query::{BoolQuery, Query};
use crate::types::{
    Condition, Filter, GraphFilters, RelationshipDirection, RelationshipFilter, Urn,
    MANUAL_EDGE_SOURCE, PROPERTY_SOURCE_KEY,
};

pub(crate) const SOURCE: &str = "source";
pub(crate) const DESTINATION: &str = "destination";
pub(crate) const RELATIONSHIP_TYPE: &str = "relationshipType";
pub(crate) const CREATED_ON: &str = "createdOn";
pub(crate) const UPDATED_ON: &str = "updatedOn";
pub(crate) const PROPERTIES: &str = "properties";

/// Query matching one frontier's worth of candidate edges.
///
/// Produces a disjunction of an outgoing sub-query (`source.urn` anchored)
/// and an incoming sub-query (`destination.urn` anchored); a branch is
/// omitted when its edge subset is empty, and with no edges at all the
/// returned query matches nothing. Time-range constraints apply to both
/// branches as conjuncts.
pub fn frontier_query(
    urns: &[Urn],
    edges: &[EdgeInfo],
    graph_filters: &GraphFilters,
    start_time_ms: Option<i64>,
    end_time_ms: Option<i64>,
) -> Query {
    let mut query = BoolQuery::new();
    if edges.is_empty() {
        return query.build();
    }

    let outgoing: Vec<EdgeInfo> = edges
        .iter()
        .filter(|edge| edge.direction() == RelationshipDirection::Outgoing)
        .cloned()
        .collect();
    if !outgoing.is_empty() {
        query = query.should(outgoing_edge_query(urns, &outgoing, graph_filters));
    }

    let incoming: Vec<EdgeInfo> = edges
        .iter()
        .filter(|edge| edge.direction() == RelationshipDirection::Incoming)
        .cloned()
        .collect();
    if !incoming.is_empty() {
        query = query.should(incoming_edge_query(urns, &incoming, graph_filters));
    }

    if let Some(start) = start_time_ms {
        query = query.must(start_time_filter(start));
    }
    if let Some(end) = end_time_ms {
        query = query.must(end_time_filter(end));
    }

    query.build()
}

/// Edges leaving the frontier through their source side.
pub fn outgoing_edge_query(urns: &[Urn], outgoing_edges: &[EdgeInfo], graph_filters: &GraphFilters) -> Query {
    BoolQuery::new()
        .must(urn_filter(urns, SOURCE))
        .must(edge_type_filter(outgoing_edges))
        .must(entity_types_filter(&graph_filters.allowed_entity_types, SOURCE))
        .must(entity_types_filter(&graph_filters.allowed_entity_types, DESTINATION))
        .build()
}

/// Edges reaching the frontier through their destination side.
pub fn incoming_edge_query(urns: &[Urn], incoming_edges: &[EdgeInfo], graph_filters: &GraphFilters) -> Query {
    BoolQuery::new()
        .must(urn_filter(urns, DESTINATION))
        .must(edge_type_filter(incoming_edges))
        .must(entity_types_filter(&graph_filters.allowed_entity_types, SOURCE))
        .must(entity_types_filter(&graph_filters.allowed_entity_types, DESTINATION))
        .build()
}

fn urn_filter(urns: &[Urn], prefix: &str) -> Query {
    Query::terms(
        format!("{}.urn", prefix),
        urns.iter().map(|urn| urn.to_string()).collect(),
    )
}

fn edge_type_filter(edges: &[EdgeInfo]) -> Query {
    let mut types: Vec<String> = Vec::new();
    for edge in edges {
        if !types.iter().any(|existing| existing == edge.relationship_type()) {
            types.push(edge.relationship_type().to_string());
        }
    }
    Query::terms(RELATIONSHIP_TYPE, types)
}

fn entity_types_filter(entity_types: &[String], prefix: &str) -> Query {
    Query::terms(format!("{}.entityType", prefix), entity_types.to_vec())
}

/// Matches edges carrying neither `createdOn` nor `updatedOn`.
pub fn existence_filter() -> Query {
    BoolQuery::new()
        .must_not(Query::exists(CREATED_ON))
        .must_not(Query::exists(UPDATED_ON))
        .build()
}

/// Matches manually authored edges, which bypass time-range filtering.
pub fn manual_edge_filter() -> Query {
    Query::term(format!("{}.{}", PROPERTIES, PROPERTY_SOURCE_KEY), MANUAL_EDGE_SOURCE)
}

/// Lower bound on edge activity. An edge passes if it was updated or created
/// at or after `start_time_ms`, carries no timestamps at all, or is manual.
pub fn start_time_filter(start_time_ms: i64) -> Query {
    BoolQuery::new()
        .should(Query::range_gte(UPDATED_ON, start_time_ms))
        // Secondary check in case we only have createdOn
        .should(Query::range_gte(CREATED_ON, start_time_ms))
        .should(existence_filter())
        .should(manual_edge_filter())
        .build()
}

/// Upper bound on edge creation. An edge passes if it was created at or
/// before `end_time_ms`, carries no timestamps at all, or is manual.
pub fn end_time_filter(end_time_ms: i64) -> Query {
    BoolQuery::new()
        .should(Query::range_lte(CREATED_ON, end_time_ms))
        .should(existence_filter())
        .should(manual_edge_filter())
        .build()
}

/// Query for listing edges outside the BFS path: type constraints and EQUAL
/// filters on both sides plus a relationship-type disjunction.
///
/// `relationship_filter.direction` decides which document side plays the
/// source role. Any criterion with a condition other than EQUAL fails with
/// [`GraphError::InvalidFilterCondition`].
pub fn static_edge_query(
    source_types: Option<&[String]>,
    source_filter: &Filter,
    destination_types: Option<&[String]>,
    destination_filter: &Filter,
    relationship_types: &[String],
    relationship_filter: &RelationshipFilter,
) -> Result<Query> {
    let mut query = BoolQuery::new();

    let (source_node, destination_node) = match relationship_filter.direction {
        RelationshipDirection::Outgoing => (SOURCE, DESTINATION),
        RelationshipDirection::Incoming => (DESTINATION, SOURCE),
    };

    if let Some(types) = source_types {
        if !types.is_empty() {
            query = query.must(entity_types_filter(types, source_node));
        }
    }
    if let Some(clause) = filter_conjunctions(source_filter, source_node)? {
        query = query.must(clause);
    }

    if let Some(types) = destination_types {
        if !types.is_empty() {
            query = query.must(entity_types_filter(types, destination_node));
        }
    }
    if let Some(clause) = filter_conjunctions(destination_filter, destination_node)? {
        query = query.must(clause);
    }

    if !relationship_types.is_empty() {
        let mut relationship_query = BoolQuery::new();
        for relationship_type in relationship_types {
            relationship_query = relationship_query.should(Query::term(RELATIONSHIP_TYPE, relationship_type.clone()));
        }
        query = query.must(relationship_query.build());
    }

    Ok(query.build())
}

/// Translate a [`Filter`] into a disjunction of per-conjunction term queries,
/// with every field prefixed by the document side it applies to. An empty
/// filter translates to no constraint.
fn filter_conjunctions(filter: &Filter, node: &str) -> Result<Option<Query>> {
    if filter.or.is_empty() {
        return Ok(None);
    }
    let mut or_query = BoolQuery::new();
    for conjunction in &filter.or {
        let mut and_query = BoolQuery::new();
        for criterion in &conjunction.and {
            if criterion.condition != Condition::Equal {
                return Err(GraphError::InvalidFilterCondition(format!(
                    "{:?} on field {}",
                    criterion.condition, criterion.field
                )));
            }
            and_query = and_query.must(Query::term(
                format!("{}.{}", node, criterion.field),
                criterion.value.clone(),
            ));
        }
        or_query = or_query.should(and_query.build());
    }
    Ok(Some(or_query.build()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Criterion;

    fn dataset_urns() -> Vec<Urn> {
        vec![Urn::new("dataset", "a"), Urn::new("dataset", "b")]
    }

    fn filters() -> GraphFilters {
        GraphFilters::allowing(["dataset"])
    }

    #[test]
    fn test_frontier_query_with_no_edges_matches_nothing() {
        let query = frontier_query(&dataset_urns(), &[], &filters(), None, None);
        assert_eq!(query, BoolQuery::new().build());
    }

    #[test]
    fn test_frontier_query_omits_empty_branch() {
        let edges = vec![EdgeInfo::new("DownstreamOf", RelationshipDirection::Outgoing, "dataset")];
        match frontier_query(&dataset_urns(), &edges, &filters(), None, None) {
            Query::Bool { should, must, .. } => {
                assert_eq!(should.len(), 1, "only the outgoing branch should be present");
                assert!(must.is_empty());
            }
            other => panic!("Expected bool query, got {:?}", other),
        }
    }

    #[test]
    fn test_frontier_query_adds_time_conjuncts() {
        let edges = vec![
            EdgeInfo::new("DownstreamOf", RelationshipDirection::Outgoing, "dataset"),
            EdgeInfo::new("Produces", RelationshipDirection::Incoming, "dataJob"),
        ];
        match frontier_query(&dataset_urns(), &edges, &filters(), Some(1000), Some(9000)) {
            Query::Bool { should, must, .. } => {
                assert_eq!(should.len(), 2);
                assert_eq!(must.len(), 2);
            }
            other => panic!("Expected bool query, got {:?}", other),
        }
    }

    #[test]
    fn test_outgoing_query_anchors_source_side() {
        let edges = vec![EdgeInfo::new("DownstreamOf", RelationshipDirection::Outgoing, "dataset")];
        match outgoing_edge_query(&dataset_urns(), &edges, &filters()) {
            Query::Bool { must, .. } => {
                assert!(must.contains(&Query::terms(
                    "source.urn",
                    vec!["urn:dataset:a".to_string(), "urn:dataset:b".to_string()]
                )));
                assert!(must.contains(&Query::terms("relationshipType", vec!["DownstreamOf".to_string()])));
                assert!(must.contains(&Query::terms("source.entityType", vec!["dataset".to_string()])));
                assert!(must.contains(&Query::terms("destination.entityType", vec!["dataset".to_string()])));
            }
            other => panic!("Expected bool query, got {:?}", other),
        }
    }

    #[test]
    fn test_edge_type_filter_deduplicates() {
        let edges = vec![
            EdgeInfo::new("Consumes", RelationshipDirection::Outgoing, "dataset"),
            EdgeInfo::new("Consumes", RelationshipDirection::Outgoing, "chart"),
        ];
        assert_eq!(
            edge_type_filter(&edges),
            Query::terms("relationshipType", vec!["Consumes".to_string()])
        );
    }

    #[test]
    fn test_start_time_filter_shape() {
        match start_time_filter(1000) {
            Query::Bool { should, .. } => {
                assert_eq!(should.len(), 4);
                assert!(should.contains(&Query::range_gte("updatedOn", 1000)));
                assert!(should.contains(&Query::range_gte("createdOn", 1000)));
                assert!(should.contains(&existence_filter()));
                assert!(should.contains(&manual_edge_filter()));
            }
            other => panic!("Expected bool query, got {:?}", other),
        }
    }

    #[test]
    fn test_end_time_filter_has_no_updated_on_bound() {
        match end_time_filter(9000) {
            Query::Bool { should, .. } => {
                assert_eq!(should.len(), 3);
                assert!(should.contains(&Query::range_lte("createdOn", 9000)));
            }
            other => panic!("Expected bool query, got {:?}", other),
        }
    }

    #[test]
    fn test_static_edge_query_respects_relationship_direction() {
        let filter = Filter::all_of(vec![Criterion::equal("platform", "hive")]);
        let query = static_edge_query(
            Some(&["dataset".to_string()]),
            &filter,
            None,
            &Filter::empty(),
            &["DownstreamOf".to_string()],
            &RelationshipFilter {
                direction: RelationshipDirection::Incoming,
            },
        )
        .unwrap();
        match query {
            Query::Bool { must, .. } => {
                // With INCOMING the "source" role maps onto the destination node.
                assert!(must.contains(&Query::terms("destination.entityType", vec!["dataset".to_string()])));
                let rendered = serde_json::to_string(&must).unwrap();
                assert!(rendered.contains("destination.platform"));
            }
            other => panic!("Expected bool query, got {:?}", other),
        }
    }

    #[test]
    fn test_static_edge_query_rejects_non_equal_condition() {
        let filter = Filter {
            or: vec![crate::types::ConjunctiveCriterion {
                and: vec![Criterion {
                    field: "platform".to_string(),
                    value: "hive".to_string(),
                    condition: Condition::Contain,
                }],
            }],
        };
        let result = static_edge_query(
            None,
            &filter,
            None,
            &Filter::empty(),
            &[],
            &RelationshipFilter {
                direction: RelationshipDirection::Outgoing,
            },
        );
        assert!(matches!(result, Err(GraphError::InvalidFilterCondition(_))));
    }

    #[test]
    fn test_empty_filter_adds_no_constraint() {
        let query = static_edge_query(
            None,
            &Filter::empty(),
            None,
            &Filter::empty(),
            &["DownstreamOf".to_string()],
            &RelationshipFilter {
                direction: RelationshipDirection::Outgoing,
            },
        )
        .unwrap();
        match query {
            Query::Bool { must, .. } => assert_eq!(must.len(), 1),
            other => panic!("Expected bool query, got {:?}", other),
        }
    }
}
