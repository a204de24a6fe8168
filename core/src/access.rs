use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::row::{PrimaryKey, RangeKey};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanDirection {
    Forward,
    Reverse,
}

/// The concrete access path chosen for one statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AccessDescriptor {
    SearchIndex {
        index_name: String,
    },
    PrimaryKeyGet {
        key: PrimaryKey,
    },
    PrimaryKeyBatch {
        keys: Vec<PrimaryKey>,
    },
    /// `start` is inclusive, `end` exclusive. Both list every primary-key field in table order.
    /// Rows inside the range that fail `residual` are not part of the result.
    PrimaryKeyRange {
        start: RangeKey,
        end: RangeKey,
        direction: ScanDirection,
        residual: Vec<KeyConstraint>,
    },
}

impl AccessDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            AccessDescriptor::SearchIndex { .. } => "search index",
            AccessDescriptor::PrimaryKeyGet { .. } => "primary key get",
            AccessDescriptor::PrimaryKeyBatch { .. } => "primary key batch",
            AccessDescriptor::PrimaryKeyRange { .. } => "primary key range",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Eq(Value),
    Lt(Value),
    LtEq(Value),
    Gt(Value),
    GtEq(Value),
    In(Vec<Value>),
}

/// One primary-key field comparison extracted from a predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyConstraint {
    pub field: String,
    pub kind: ConstraintKind,
}

impl KeyConstraint {
    pub fn new(field: impl Into<String>, kind: ConstraintKind) -> Self { Self { field: field.into(), kind } }

    /// Whether `value` satisfies the constraint. Unordered pairs never match.
    pub fn matches(&self, value: &Value) -> bool {
        let ord = |bound: &Value| value.compare(bound);
        match &self.kind {
            ConstraintKind::Eq(v) => ord(v) == Some(Ordering::Equal),
            ConstraintKind::Lt(v) => ord(v) == Some(Ordering::Less),
            ConstraintKind::LtEq(v) => matches!(ord(v), Some(Ordering::Less | Ordering::Equal)),
            ConstraintKind::Gt(v) => ord(v) == Some(Ordering::Greater),
            ConstraintKind::GtEq(v) => matches!(ord(v), Some(Ordering::Greater | Ordering::Equal)),
            ConstraintKind::In(values) => values.iter().any(|v| ord(v) == Some(Ordering::Equal)),
        }
    }

    /// Whether a primary key satisfies the constraint; a key missing the field does not
    pub fn matches_key(&self, key: &PrimaryKey) -> bool { key.get(&self.field).is_some_and(|value| self.matches(value)) }
}

impl ConstraintKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ConstraintKind::Eq(_) => "=",
            ConstraintKind::Lt(_) => "<",
            ConstraintKind::LtEq(_) => "<=",
            ConstraintKind::Gt(_) => ">",
            ConstraintKind::GtEq(_) => ">=",
            ConstraintKind::In(_) => "IN",
        }
    }
}
