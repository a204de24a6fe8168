//! Drives SQL text through parsing, planning and execution against a local sled store.

use anyhow::anyhow;
use kvql::ast::{Expr, Statement};
use kvql::parser::parse_statement;
use kvql_core::config::QueryConfig;
use kvql_core::row::{PrimaryKey, Row};
use kvql_core::store::RemoteStore;
use kvql_core::value::Value;
use kvql_storage_common::{Executor, Planner, StatementPlan};
use kvql_storage_sled::SledStore;
use tracing::info;

pub struct Session {
    pub store: SledStore,
    pub config: QueryConfig,
}

impl Session {
    pub fn new(store: SledStore) -> Self { Self { store, config: QueryConfig::default() } }

    pub fn with_config(store: SledStore, config: QueryConfig) -> Self { Self { store, config } }

    pub fn plan(&self, sql: &str) -> anyhow::Result<StatementPlan> {
        let statement = parse_statement(sql)?;
        Ok(Planner::with_config(&self.store, self.config.clone()).plan_statement(&statement)?)
    }

    /// Rows a statement selects (for UPDATE and DELETE, the rows it would touch)
    pub fn fetch(&self, sql: &str) -> anyhow::Result<Vec<Row>> {
        let plan = self.plan(sql)?;
        info!("{sql} => {:?} limit {}", plan.access, plan.limit);
        let rows = Executor::new(&self.store, self.config.clone()).execute(&plan)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Run an UPDATE or DELETE, returning how many rows it changed
    pub fn execute(&self, sql: &str) -> anyhow::Result<usize> {
        let statement = parse_statement(sql)?;
        let plan = Planner::with_config(&self.store, self.config.clone()).plan_statement(&statement)?;
        let keys = Executor::new(&self.store, self.config.clone()).execute(&plan)?.primary_keys().collect::<Result<Vec<PrimaryKey>, _>>()?;

        match &statement {
            Statement::Delete(_) => {
                let mut deleted = 0;
                for key in &keys {
                    if self.store.delete_row(&plan.table, key)? {
                        deleted += 1;
                    }
                }
                Ok(deleted)
            }
            Statement::Update(update) => {
                let mut updated = 0;
                for key in &keys {
                    let Some(mut row) = self.store.get_row(&plan.table, key, self.config.max_versions)? else { continue };
                    for assignment in &update.assignments {
                        let value = match &assignment.value {
                            Expr::Literal(literal) => Value::from_literal(literal),
                            _ => None,
                        }
                        .ok_or_else(|| anyhow!("SET {} needs a non-NULL literal", assignment.column))?;
                        row.attributes.insert(assignment.column.clone(), value);
                    }
                    self.store.put_row(&plan.table, &row)?;
                    updated += 1;
                }
                Ok(updated)
            }
            Statement::Select(_) => Err(anyhow!("use fetch for SELECT")),
        }
    }
}
