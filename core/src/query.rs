use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The search index's native query form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructuredQuery {
    MatchAll,
    Term {
        field: String,
        value: Value,
    },
    Range {
        field: String,
        from: Option<Value>,
        to: Option<Value>,
        include_lower: bool,
        include_upper: bool,
    },
    /// `*` matches any run of characters, `?` exactly one
    Wildcard {
        field: String,
        pattern: String,
    },
    Exists {
        field: String,
    },
    Terms {
        field: String,
        values: Vec<Value>,
    },
    Bool(BoolQuery),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoolQuery {
    pub must: Vec<StructuredQuery>,
    pub should: Vec<StructuredQuery>,
    pub must_not: Vec<StructuredQuery>,
}

impl StructuredQuery {
    pub fn must(queries: Vec<StructuredQuery>) -> Self { StructuredQuery::Bool(BoolQuery { must: queries, ..Default::default() }) }

    pub fn should(queries: Vec<StructuredQuery>) -> Self { StructuredQuery::Bool(BoolQuery { should: queries, ..Default::default() }) }

    pub fn must_not(queries: Vec<StructuredQuery>) -> Self { StructuredQuery::Bool(BoolQuery { must_not: queries, ..Default::default() }) }

    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self { StructuredQuery::Term { field: field.into(), value: value.into() } }

    /// Every field the query reads
    pub fn fields(&self) -> BTreeSet<&str> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            StructuredQuery::MatchAll => {}
            StructuredQuery::Term { field, .. }
            | StructuredQuery::Range { field, .. }
            | StructuredQuery::Wildcard { field, .. }
            | StructuredQuery::Exists { field }
            | StructuredQuery::Terms { field, .. } => {
                out.insert(field);
            }
            StructuredQuery::Bool(bool_query) => {
                for query in bool_query.must.iter().chain(&bool_query.should).chain(&bool_query.must_not) {
                    query.collect_fields(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self { Self { field: field.into(), order: SortOrder::Asc } }
    pub fn desc(field: impl Into<String>) -> Self { Self { field: field.into(), order: SortOrder::Desc } }
}

impl From<kvql::ast::OrderDirection> for SortOrder {
    fn from(direction: kvql::ast::OrderDirection) -> Self {
        match direction {
            kvql::ast::OrderDirection::Asc => SortOrder::Asc,
            kvql::ast::OrderDirection::Desc => SortOrder::Desc,
        }
    }
}
