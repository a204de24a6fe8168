use kvql::ast::{ComparisonOperator, Predicate};
use kvql_core::access::{ConstraintKind, KeyConstraint};
use kvql_core::error::PlanError;

use crate::translate::{column_name, comparison_operands, literal_value};

/// Flattens a predicate into the per-field comparisons a primary-key lookup can use.
///
/// Only `AND` may combine conditions here: the primary-key space cannot express disjunction or negation.
/// Literal-first comparisons are rewritten to their column-first equivalent, so `10 <= id` yields `id >= 10`.
/// `BETWEEN` becomes a `>=` and a `<=` constraint.
///
/// The result is in order of appearance; consumers group it by field.
pub fn extract(predicate: &Predicate) -> Result<Vec<KeyConstraint>, PlanError> {
    let mut constraints = Vec::new();
    extract_into(predicate, &mut constraints)?;
    Ok(constraints)
}

fn extract_into(predicate: &Predicate, out: &mut Vec<KeyConstraint>) -> Result<(), PlanError> {
    match predicate {
        Predicate::And(left, right) => {
            extract_into(left, out)?;
            extract_into(right, out)?;
        }
        Predicate::Comparison { left, operator, right } => {
            let (field, operator, value) = comparison_operands(left, *operator, right)?;
            let kind = match operator {
                ComparisonOperator::Equal => ConstraintKind::Eq(value),
                ComparisonOperator::LessThan => ConstraintKind::Lt(value),
                ComparisonOperator::LessThanOrEqual => ConstraintKind::LtEq(value),
                ComparisonOperator::GreaterThan => ConstraintKind::Gt(value),
                ComparisonOperator::GreaterThanOrEqual => ConstraintKind::GtEq(value),
                ComparisonOperator::NotEqual => {
                    return Err(PlanError::UnsupportedOperation(format!("{field} != cannot be served by a primary key lookup")));
                }
            };
            out.push(KeyConstraint::new(field, kind));
        }
        Predicate::Between { expr, low, high, negated } => {
            let field = column_name(expr, "BETWEEN")?;
            if *negated {
                return Err(PlanError::UnsupportedOperation(format!("{field} NOT BETWEEN cannot be served by a primary key lookup")));
            }
            out.push(KeyConstraint::new(field.clone(), ConstraintKind::GtEq(literal_value(low, "BETWEEN")?)));
            out.push(KeyConstraint::new(field, ConstraintKind::LtEq(literal_value(high, "BETWEEN")?)));
        }
        Predicate::In { expr, list, negated } => {
            let field = column_name(expr, "IN")?;
            if *negated {
                return Err(PlanError::UnsupportedOperation(format!("{field} NOT IN cannot be served by a primary key lookup")));
            }
            if list.is_empty() {
                return Err(PlanError::InvalidExpressionShape(format!("IN on {field} has an empty value list")));
            }
            let values = list.iter().map(|item| literal_value(item, "IN")).collect::<Result<Vec<_>, _>>()?;
            out.push(KeyConstraint::new(field, ConstraintKind::In(values)));
        }
        Predicate::Is { .. } => return Err(PlanError::UnsupportedOperation("IS [NOT] NULL cannot be served by a primary key lookup".into())),
        Predicate::Like { .. } => return Err(PlanError::UnsupportedOperation("LIKE cannot be served by a primary key lookup".into())),
        Predicate::Or(_, _) => return Err(PlanError::UnsupportedOperation("OR cannot be served by a primary key lookup".into())),
        Predicate::Not(_) => return Err(PlanError::UnsupportedOperation("NOT cannot be served by a primary key lookup".into())),
        Predicate::Xor(_, _) => return Err(PlanError::UnsupportedOperation("XOR cannot be served by a primary key lookup".into())),
    }
    Ok(())
}
