use std::collections::BTreeSet;

use kvql::ast::{Expr, Statement};
use kvql_core::access::AccessDescriptor;
use kvql_core::config::QueryConfig;
use kvql_core::error::PlanError;
use kvql_core::query::{Sort, StructuredQuery};
use kvql_core::store::{ReturnShape, SchemaSource};
use tracing::{debug, warn};

use crate::bounds::primary_key_access;
use crate::predicate::extract;
use crate::translate::translate;

/// Fields a statement needs an index to cover, split by where they come from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredFields {
    /// Aggregate arguments (not `*`) and GROUP BY columns; SELECT only
    pub other: BTreeSet<String>,
    /// Columns referenced anywhere in WHERE
    pub selection: BTreeSet<String>,
    /// ORDER BY columns that are not SELECT aliases
    pub order: BTreeSet<String>,
}

impl RequiredFields {
    pub fn of(statement: &Statement) -> Self {
        let mut fields = RequiredFields::default();
        let mut aliases = BTreeSet::new();
        if let Statement::Select(select) = statement {
            fields.other.extend(select.aggregate_columns().into_iter().map(|c| c.column().to_string()));
            fields.other.extend(select.group_by.iter().map(|c| c.column().to_string()));
            aliases = select.aliases();
        }
        if let Some(selection) = statement.selection() {
            fields.selection.extend(selection.columns().into_iter().map(|c| c.column().to_string()));
        }
        for item in statement.order_by() {
            let column = item.identifier.column();
            if !aliases.contains(column) {
                fields.order.insert(column.to_string());
            }
        }
        fields
    }

    pub fn needed(&self) -> BTreeSet<String> { self.other.iter().chain(&self.selection).chain(&self.order).cloned().collect() }
}

/// Everything the executor needs to answer one statement
#[derive(Debug, Clone, PartialEq)]
pub struct StatementPlan {
    pub table: String,
    pub access: AccessDescriptor,
    /// `MatchAll` unless `access` is a search index
    pub query: StructuredQuery,
    pub sort: Vec<Sort>,
    pub offset: u64,
    pub limit: u64,
    pub return_shape: ReturnShape,
}

/// Chooses an access path for statements against one schema source.
pub struct Planner<'a, S: SchemaSource + ?Sized> {
    schema: &'a S,
    config: QueryConfig,
}

impl<'a, S: SchemaSource + ?Sized> Planner<'a, S> {
    pub fn new(schema: &'a S) -> Self { Self { schema, config: QueryConfig::default() } }

    pub fn with_config(schema: &'a S, config: QueryConfig) -> Self { Self { schema, config } }

    /// Pick the access path for `statement` on `table`.
    ///
    /// The first search index (in the order the store lists them) whose fields are a strict superset of every
    /// required field wins. Otherwise the primary key is tried, which cannot serve aggregation, grouping or
    /// ordering, and only covers predicates on primary-key fields.
    pub fn select(&self, table: &str, statement: &Statement) -> Result<AccessDescriptor, PlanError> {
        let required = RequiredFields::of(statement);
        let needed = required.needed();

        let schema_error = |source| PlanError::SchemaUnavailable { table: table.to_string(), source };
        for index_name in self.schema.list_search_indexes(table).map_err(schema_error)? {
            let index_fields = self.schema.describe_search_index(table, &index_name).map_err(schema_error)?;
            if index_fields.len() > needed.len() && needed.is_subset(&index_fields) {
                debug!("{table}: search index {index_name} covers {:?}", needed);
                return Ok(AccessDescriptor::SearchIndex { index_name });
            }
        }

        if !required.other.is_empty() {
            warn!("{table}: no search index covers aggregated or grouped fields {:?}", required.other);
            return Err(PlanError::UnsupportedOperation(format!(
                "aggregation and GROUP BY on {:?} need a search index covering {:?}",
                required.other, needed
            )));
        }

        let primary_key = self.schema.describe_table(table).map_err(schema_error)?;
        let uncovered: Vec<String> = required.selection.iter().filter(|field| !primary_key.contains(field)).cloned().collect();
        if !uncovered.is_empty() {
            warn!("{table}: neither a search index nor the primary key covers {:?}", uncovered);
            return Err(PlanError::NoSatisfyingIndex { table: table.to_string(), fields: uncovered });
        }

        if !required.order.is_empty() {
            return Err(PlanError::UnsupportedOperation(format!("ORDER BY {:?} needs a search index", required.order)));
        }

        let constraints = match statement.selection() {
            Some(selection) => extract(selection)?,
            None => Vec::new(),
        };
        let access = primary_key_access(&primary_key, constraints)?;
        debug!("{table}: using {}", access.kind());
        Ok(access)
    }

    /// Plan a whole statement: access path, search query and sort, row window and return shape.
    pub fn plan_statement(&self, statement: &Statement) -> Result<StatementPlan, PlanError> {
        let table = statement.table();
        let access = self.select(table, statement)?;

        let (query, sort) = match access {
            AccessDescriptor::SearchIndex { .. } => (translate(statement.selection())?, sort_of(statement)),
            _ => (StructuredQuery::MatchAll, Vec::new()),
        };
        let (offset, limit) = self.window(statement)?;

        Ok(StatementPlan { table: table.to_string(), access, query, sort, offset, limit, return_shape: return_shape(statement) })
    }

    /// `(offset, limit)` for the statement; a missing LIMIT falls back to the per-statement default
    fn window(&self, statement: &Statement) -> Result<(u64, u64), PlanError> {
        match statement.limit() {
            None => Ok((
                0,
                match statement {
                    Statement::Select(_) => self.config.max_select_rows,
                    Statement::Update(_) => self.config.max_update_rows,
                    Statement::Delete(_) => self.config.max_delete_rows,
                },
            )),
            Some(limit) => {
                let total = limit.offset.saturating_add(limit.count);
                if total > self.config.max_total_rows {
                    return Err(PlanError::UnsupportedOperation(format!(
                        "LIMIT {}, {} reaches row {total}, beyond the maximum of {}",
                        limit.offset, limit.count, self.config.max_total_rows
                    )));
                }
                Ok((limit.offset, limit.count))
            }
        }
    }
}

fn sort_of(statement: &Statement) -> Vec<Sort> {
    let aliases = match statement {
        Statement::Select(select) => select.aliases(),
        _ => BTreeSet::new(),
    };
    statement
        .order_by()
        .iter()
        .filter(|item| !aliases.contains(item.identifier.column()))
        .map(|item| Sort { field: item.identifier.column().to_string(), order: item.direction.into() })
        .collect()
}

fn return_shape(statement: &Statement) -> ReturnShape {
    match statement {
        Statement::Update(_) | Statement::Delete(_) => ReturnShape::PrimaryKeyOnly,
        Statement::Select(select) if select.has_wildcard() || select.has_aggregates() => ReturnShape::AllColumns,
        Statement::Select(select) => ReturnShape::Columns(
            select
                .projection
                .iter()
                .filter_map(|item| match &item.expr {
                    Expr::Identifier(identifier) => Some(identifier.column().to_string()),
                    _ => None,
                })
                .collect(),
        ),
    }
}
