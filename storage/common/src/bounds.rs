//! Construction of primary-key access descriptors from extracted key constraints.

use std::cmp::Ordering;

use indexmap::IndexMap;
use kvql_core::access::{AccessDescriptor, ConstraintKind, KeyConstraint, ScanDirection};
use kvql_core::error::PlanError;
use kvql_core::row::{KeyBound, PrimaryKey, RangeKey};
use kvql_core::value::Value;
use tracing::debug;

/// What the constraints on one primary-key field allow
#[derive(Debug, Clone, PartialEq)]
enum FieldSpan {
    /// No constraint; every value
    Open,
    /// `=` gives one value, `IN` several (`enumerated`)
    Points { values: Vec<Value>, enumerated: bool },
    /// `>= lower` and/or `< upper`
    Range { lower: Option<Value>, upper: Option<Value> },
}

/// Groups constraints by field, keeping the order in which fields first appear
pub fn group_constraints(constraints: &[KeyConstraint]) -> IndexMap<&str, Vec<&ConstraintKind>> {
    let mut grouped: IndexMap<&str, Vec<&ConstraintKind>> = IndexMap::new();
    for constraint in constraints {
        grouped.entry(constraint.field.as_str()).or_default().push(&constraint.kind);
    }
    grouped
}

/// Builds the primary-key access descriptor for `constraints` over a table whose key is `primary_key`.
///
/// Point and `IN` constraints on every field enumerate concrete keys (a get or a batch). Any open or
/// inequality-bounded field turns the plan into a forward range scan. The two cannot be mixed.
pub fn primary_key_access(primary_key: &[String], constraints: Vec<KeyConstraint>) -> Result<AccessDescriptor, PlanError> {
    if primary_key.is_empty() {
        return Err(PlanError::InternalInvariantViolation("table declares no primary key fields".into()));
    }

    let spans = {
        let grouped = group_constraints(&constraints);
        if let Some(field) = grouped.keys().find(|field| !primary_key.iter().any(|pk| pk.as_str() == **field)) {
            return Err(PlanError::InternalInvariantViolation(format!("constraint on {field} which is not a primary key field")));
        }
        primary_key
            .iter()
            .map(|field| field_span(field, grouped.get(field.as_str()).map(Vec::as_slice).unwrap_or_default()))
            .collect::<Result<Vec<_>, _>>()?
    };

    let enumerated = spans.iter().any(|span| matches!(span, FieldSpan::Points { enumerated: true, .. }));
    let ranged = spans.iter().any(|span| !matches!(span, FieldSpan::Points { .. }));
    if enumerated && ranged {
        return Err(PlanError::UnsupportedOperation("IN cannot be combined with a range over the primary key".into()));
    }

    let access = if ranged {
        range_access(primary_key, &spans, constraints)
    } else {
        let mut keys = cartesian_keys(primary_key, &spans);
        if keys.len() == 1 {
            AccessDescriptor::PrimaryKeyGet { key: keys.remove(0) }
        } else {
            AccessDescriptor::PrimaryKeyBatch { keys }
        }
    };
    debug!("primary key access: {:?}", access);
    Ok(access)
}

fn field_span(field: &str, kinds: &[&ConstraintKind]) -> Result<FieldSpan, PlanError> {
    match kinds {
        [] => Ok(FieldSpan::Open),
        [ConstraintKind::Eq(value)] => Ok(FieldSpan::Points { values: vec![value.clone()], enumerated: false }),
        [ConstraintKind::In(values)] => Ok(FieldSpan::Points { values: distinct(values), enumerated: true }),
        [ConstraintKind::GtEq(lower)] => Ok(FieldSpan::Range { lower: Some(lower.clone()), upper: None }),
        [ConstraintKind::Lt(upper)] => Ok(FieldSpan::Range { lower: None, upper: Some(upper.clone()) }),
        [ConstraintKind::GtEq(lower), ConstraintKind::Lt(upper)] | [ConstraintKind::Lt(upper), ConstraintKind::GtEq(lower)] => {
            Ok(FieldSpan::Range { lower: Some(lower.clone()), upper: Some(upper.clone()) })
        }
        [single] => Err(PlanError::UnsupportedOperation(format!(
            "{field} {} cannot bound a primary key range; use >= for the start and < for the end",
            single.symbol()
        ))),
        [_, _] => Err(PlanError::UnsupportedOperation(format!("two constraints on {field} must be one >= and one <"))),
        _ => Err(PlanError::UnsupportedOperation(format!("more than two constraints on primary key field {field}"))),
    }
}

/// Drops values equal to an earlier one, so `IN (1, 1.0)` names a single key
fn distinct(values: &[Value]) -> Vec<Value> {
    let mut kept: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        if !kept.iter().any(|k| k.compare(value) == Some(Ordering::Equal)) {
            kept.push(value.clone());
        }
    }
    kept
}

/// Every combination of point values, in primary-key field order
fn cartesian_keys(primary_key: &[String], spans: &[FieldSpan]) -> Vec<PrimaryKey> {
    let mut keys = vec![PrimaryKey::default()];
    for (field, span) in primary_key.iter().zip(spans) {
        if let FieldSpan::Points { values, .. } = span {
            keys = keys.into_iter().flat_map(|key| values.iter().map(move |value| key.clone().with(field.clone(), value.clone()))).collect();
        }
    }
    keys
}

/// Builds `[start, end)` over the whole key.
///
/// Fields before the first non-point field pin both ends. Unconstrained fields take `Min` on the start and,
/// on the end, `Min` right after an exclusive upper bound (so that bound stays exclusive) or `Max` otherwise.
/// The range is exact when no field after the first non-point one is constrained; otherwise every
/// constraint is carried as a residual filter.
fn range_access(primary_key: &[String], spans: &[FieldSpan], constraints: Vec<KeyConstraint>) -> AccessDescriptor {
    let mut start = RangeKey::default();
    let mut end = RangeKey::default();
    let mut seen_non_point = false;
    let mut exact = true;
    // what an unconstrained field contributes to the end key
    let mut end_fill = KeyBound::Max;

    for (field, span) in primary_key.iter().zip(spans) {
        if seen_non_point && *span != FieldSpan::Open {
            exact = false;
        }
        match span {
            FieldSpan::Points { values, .. } => {
                // IN never reaches a range, so a point here is a single `=` value
                let value = values.first().cloned().map_or(KeyBound::Min, KeyBound::Value);
                start.push(field.clone(), value.clone());
                end.push(field.clone(), value);
                end_fill = KeyBound::Max;
            }
            FieldSpan::Open => {
                seen_non_point = true;
                start.push(field.clone(), KeyBound::Min);
                end.push(field.clone(), end_fill.clone());
            }
            FieldSpan::Range { lower, upper } => {
                seen_non_point = true;
                start.push(field.clone(), lower.clone().map_or(KeyBound::Min, KeyBound::Value));
                match upper {
                    Some(upper) => {
                        end.push(field.clone(), KeyBound::Value(upper.clone()));
                        end_fill = KeyBound::Min;
                    }
                    None => {
                        end.push(field.clone(), KeyBound::Max);
                        end_fill = KeyBound::Max;
                    }
                }
            }
        }
    }

    let residual = if exact { Vec::new() } else { constraints };
    AccessDescriptor::PrimaryKeyRange { start, end, direction: ScanDirection::Forward, residual }
}
