// Boolean query composition for the edge index

use serde::{Deserialize, Serialize};

/// Query types understood by the search backend.
///
/// This is the subset of a full search DSL the lineage engine emits: exact
/// term matching, numeric ranges, existence checks, and boolean composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    /// Match all documents
    MatchAll,

    /// Term query (exact match)
    Term { field: String, value: String },

    /// Terms query (exact match against any of the values)
    Terms { field: String, values: Vec<String> },

    /// Numeric range query
    Range {
        field: String,
        #[serde(default)]
        gte: Option<i64>,
        #[serde(default)]
        lte: Option<i64>,
    },

    /// Field existence query
    Exists { field: String },

    /// Boolean query
    Bool {
        #[serde(default)]
        must: Vec<Query>,
        #[serde(default)]
        should: Vec<Query>,
        #[serde(default)]
        must_not: Vec<Query>,
        #[serde(default)]
        filter: Vec<Query>,
        #[serde(default = "default_minimum_should_match")]
        minimum_should_match: usize,
    },
}

fn default_minimum_should_match() -> usize {
    1
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms(field: impl Into<String>, values: Vec<String>) -> Self {
        Query::Terms {
            field: field.into(),
            values,
        }
    }

    pub fn range_gte(field: impl Into<String>, value: i64) -> Self {
        Query::Range {
            field: field.into(),
            gte: Some(value),
            lte: None,
        }
    }

    pub fn range_lte(field: impl Into<String>, value: i64) -> Self {
        Query::Range {
            field: field.into(),
            gte: None,
            lte: Some(value),
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Query::Exists {
            field: field.into(),
        }
    }
}

/// Builder for [`Query::Bool`].
///
/// Semantics: all `must` and `filter` clauses hold, no `must_not` clause
/// holds, and when `should` clauses are present at least
/// `minimum_should_match` of them hold (default 1) regardless of other
/// clauses. A bool query with no clauses at all matches nothing.
#[derive(Debug, Clone, Default)]
pub struct BoolQuery {
    must: Vec<Query>,
    should: Vec<Query>,
    must_not: Vec<Query>,
    filter: Vec<Query>,
    minimum_should_match: Option<usize>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn filter(mut self, query: Query) -> Self {
        self.filter.push(query);
        self
    }

    pub fn minimum_should_match(mut self, n: usize) -> Self {
        self.minimum_should_match = Some(n);
        self
    }

    /// Whether no clause has been added yet.
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty() && self.filter.is_empty()
    }

    pub fn build(self) -> Query {
        Query::Bool {
            must: self.must,
            should: self.should,
            must_not: self.must_not,
            filter: self.filter,
            minimum_should_match: self.minimum_should_match.unwrap_or_else(default_minimum_should_match),
        }
    }
}

impl From<BoolQuery> for Query {
    fn from(builder: BoolQuery) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_term_wire_shape() {
        let query = Query::term("source.urn", "urn:dataset:orders");
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"type": "term", "field": "source.urn", "value": "urn:dataset:orders"})
        );
    }

    #[test]
    fn test_bool_defaults_on_decode() {
        let query: Query = serde_json::from_value(json!({
            "type": "bool",
            "must": [{"type": "exists", "field": "createdOn"}],
        }))
        .unwrap();
        match query {
            Query::Bool {
                must,
                should,
                minimum_should_match,
                ..
            } => {
                assert_eq!(must.len(), 1);
                assert!(should.is_empty());
                assert_eq!(minimum_should_match, 1);
            }
            other => panic!("Expected bool query, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_roundtrip() {
        let query = BoolQuery::new()
            .should(Query::term("relationshipType", "DownstreamOf"))
            .must(Query::range_gte("updatedOn", 1000))
            .build();
        match query {
            Query::Bool {
                must,
                should,
                minimum_should_match,
                ..
            } => {
                assert_eq!(must.len(), 1);
                assert_eq!(should.len(), 1);
                assert_eq!(minimum_should_match, 1);
            }
            other => panic!("Expected bool query, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_is_empty() {
        assert!(BoolQuery::new().is_empty());
        assert!(!BoolQuery::new().must_not(Query::exists("createdOn")).is_empty());
    }
}
