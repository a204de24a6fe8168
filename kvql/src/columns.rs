//! Read-only traversal helpers used by planners to work out which fields a statement touches.

use std::collections::BTreeSet;

use crate::ast::{Expr, Identifier, Limit, OrderByItem, Predicate, Select, Statement};

impl Statement {
    pub fn table(&self) -> &str {
        match self {
            Statement::Select(select) => &select.table,
            Statement::Update(update) => &update.table,
            Statement::Delete(delete) => &delete.table,
        }
    }

    pub fn selection(&self) -> Option<&Predicate> {
        match self {
            Statement::Select(select) => select.selection.as_ref(),
            Statement::Update(update) => update.selection.as_ref(),
            Statement::Delete(delete) => delete.selection.as_ref(),
        }
    }

    pub fn order_by(&self) -> &[OrderByItem] {
        match self {
            Statement::Select(select) => &select.order_by,
            Statement::Update(update) => &update.order_by,
            Statement::Delete(delete) => &delete.order_by,
        }
    }

    pub fn limit(&self) -> Option<Limit> {
        match self {
            Statement::Select(select) => select.limit,
            Statement::Update(update) => update.limit,
            Statement::Delete(delete) => delete.limit,
        }
    }
}

impl Predicate {
    /// Every column referenced anywhere in the predicate, in order of appearance
    pub fn columns(&self) -> Vec<&Identifier> {
        let mut columns = Vec::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a Identifier>) {
        match self {
            Predicate::Comparison { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Predicate::Between { expr, low, high, .. } => {
                expr.collect_columns(out);
                low.collect_columns(out);
                high.collect_columns(out);
            }
            Predicate::Is { expr, right, .. } => {
                expr.collect_columns(out);
                right.collect_columns(out);
            }
            Predicate::In { expr, list, .. } => {
                expr.collect_columns(out);
                for item in list {
                    item.collect_columns(out);
                }
            }
            Predicate::Like { expr, pattern, .. } => {
                expr.collect_columns(out);
                pattern.collect_columns(out);
            }
            Predicate::And(left, right) | Predicate::Or(left, right) | Predicate::Xor(left, right) => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Predicate::Not(inner) => inner.collect_columns(out),
        }
    }
}

impl Expr {
    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a Identifier>) {
        match self {
            Expr::Identifier(identifier) => out.push(identifier),
            Expr::Aggregate { arg, .. } => arg.collect_columns(out),
            Expr::Literal(_) | Expr::Wildcard => {}
        }
    }
}

impl Select {
    /// Columns used as aggregate-function arguments. `COUNT(*)` contributes nothing.
    pub fn aggregate_columns(&self) -> Vec<&Identifier> {
        let mut columns = Vec::new();
        for item in &self.projection {
            if let Expr::Aggregate { arg, .. } = &item.expr {
                arg.collect_columns(&mut columns);
            }
        }
        columns
    }

    pub fn has_aggregates(&self) -> bool { self.projection.iter().any(|item| matches!(item.expr, Expr::Aggregate { .. })) }

    pub fn has_wildcard(&self) -> bool { self.projection.iter().any(|item| item.expr == Expr::Wildcard) }

    /// Output aliases declared in the projection (`SELECT a AS b` yields `b`)
    pub fn aliases(&self) -> BTreeSet<&str> { self.projection.iter().filter_map(|item| item.alias.as_deref()).collect() }
}
