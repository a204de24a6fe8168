//! Predicate tree to search-index query translation.

use kvql::ast::{ComparisonOperator, Expr, Literal, Predicate};
use kvql_core::error::PlanError;
use kvql_core::query::StructuredQuery;
use kvql_core::value::Value;
use tracing::trace;

/// Translate an optional WHERE predicate into the search index's structured query.
///
/// No predicate matches everything. Every node produces exactly one query; `AND`, `OR` and `NOT`
/// each populate a single list of a `Bool` query.
pub fn translate(predicate: Option<&Predicate>) -> Result<StructuredQuery, PlanError> {
    let query = match predicate {
        None => StructuredQuery::MatchAll,
        Some(predicate) => translate_predicate(predicate)?,
    };
    trace!("translated predicate into {:?}", query);
    Ok(query)
}

fn translate_predicate(predicate: &Predicate) -> Result<StructuredQuery, PlanError> {
    match predicate {
        Predicate::Comparison { left, operator, right } => {
            let (field, operator, value) = comparison_operands(left, *operator, right)?;
            Ok(comparison_query(field, operator, value))
        }
        Predicate::Between { expr, low, high, negated } => {
            let field = column_name(expr, "BETWEEN")?;
            let range = StructuredQuery::Range {
                field,
                from: Some(literal_value(low, "BETWEEN")?),
                to: Some(literal_value(high, "BETWEEN")?),
                include_lower: true,
                include_upper: true,
            };
            Ok(negate_if(*negated, range))
        }
        Predicate::Is { expr, right, negated } => {
            let field = column_name(expr, "IS")?;
            if !matches!(right.as_ref(), Expr::Literal(Literal::Null)) {
                return Err(PlanError::InvalidExpressionShape(format!("IS on {field} only supports NULL")));
            }
            // IS NOT NULL means the field is present, IS NULL that it is absent
            Ok(negate_if(!*negated, StructuredQuery::Exists { field }))
        }
        Predicate::In { expr, list, negated } => {
            let field = column_name(expr, "IN")?;
            if list.is_empty() {
                return Err(PlanError::InvalidExpressionShape(format!("IN on {field} has an empty value list")));
            }
            let values = list.iter().map(|item| literal_value(item, "IN")).collect::<Result<Vec<_>, _>>()?;
            Ok(negate_if(*negated, StructuredQuery::Terms { field, values }))
        }
        Predicate::Like { expr, pattern, negated } => {
            let field = column_name(expr, "LIKE")?;
            let pattern = match literal_value(pattern, "LIKE")? {
                Value::String(pattern) => pattern.replace('%', "*"),
                other => other.to_string(),
            };
            Ok(negate_if(*negated, StructuredQuery::Wildcard { field, pattern }))
        }
        Predicate::And(left, right) => Ok(StructuredQuery::must(vec![translate_predicate(left)?, translate_predicate(right)?])),
        Predicate::Or(left, right) => Ok(StructuredQuery::should(vec![translate_predicate(left)?, translate_predicate(right)?])),
        Predicate::Not(inner) => Ok(StructuredQuery::must_not(vec![translate_predicate(inner)?])),
        Predicate::Xor(_, _) => Err(PlanError::UnsupportedOperation("XOR has no search index equivalent".into())),
    }
}

fn comparison_query(field: String, operator: ComparisonOperator, value: Value) -> StructuredQuery {
    let range = |from: Option<Value>, to: Option<Value>, include_lower: bool, include_upper: bool| StructuredQuery::Range {
        field: field.clone(),
        from,
        to,
        include_lower,
        include_upper,
    };
    match operator {
        ComparisonOperator::Equal => StructuredQuery::Term { field, value },
        ComparisonOperator::NotEqual => StructuredQuery::must_not(vec![StructuredQuery::Term { field, value }]),
        ComparisonOperator::GreaterThan => range(Some(value), None, false, false),
        ComparisonOperator::GreaterThanOrEqual => range(Some(value), None, true, false),
        ComparisonOperator::LessThan => range(None, Some(value), false, false),
        ComparisonOperator::LessThanOrEqual => range(None, Some(value), false, true),
    }
}

fn negate_if(negated: bool, query: StructuredQuery) -> StructuredQuery {
    if negated {
        StructuredQuery::must_not(vec![query])
    } else {
        query
    }
}

/// Normalizes a comparison to `field <operator> value`, mirroring the operator when the literal comes first
pub(crate) fn comparison_operands(left: &Expr, operator: ComparisonOperator, right: &Expr) -> Result<(String, ComparisonOperator, Value), PlanError> {
    match (left, right) {
        (Expr::Identifier(identifier), Expr::Literal(literal)) => Ok((identifier.column().to_string(), operator, to_value(literal, operator.as_str())?)),
        (Expr::Literal(literal), Expr::Identifier(identifier)) => {
            Ok((identifier.column().to_string(), operator.mirrored(), to_value(literal, operator.as_str())?))
        }
        _ => Err(PlanError::InvalidExpressionShape(format!(
            "comparison {} {} {} needs exactly one column and one literal",
            describe(left),
            operator,
            describe(right)
        ))),
    }
}

pub(crate) fn column_name(expr: &Expr, construct: &str) -> Result<String, PlanError> {
    match expr {
        Expr::Identifier(identifier) => Ok(identifier.column().to_string()),
        other => Err(PlanError::InvalidExpressionShape(format!("{construct} expects a column on its left side, got {}", describe(other)))),
    }
}

pub(crate) fn literal_value(expr: &Expr, construct: &str) -> Result<Value, PlanError> {
    match expr {
        Expr::Literal(literal) => to_value(literal, construct),
        other => Err(PlanError::InvalidExpressionShape(format!("{construct} expects literal operands, got {}", describe(other)))),
    }
}

fn to_value(literal: &Literal, construct: &str) -> Result<Value, PlanError> {
    Value::from_literal(literal).ok_or_else(|| PlanError::InvalidExpressionShape(format!("NULL is not a valid {construct} operand; use IS [NOT] NULL")))
}

fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Literal(_) => "literal",
        Expr::Identifier(_) => "column",
        Expr::Wildcard => "*",
        Expr::Aggregate { .. } => "aggregate",
    }
}
