use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::ReturnShape;
use crate::value::Value;

/// An ordered `(field, value)` list covering every primary-key field, in the table's declared order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrimaryKey(Vec<(String, Value)>);

impl PrimaryKey {
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<Value>) { self.0.push((field.into(), value.into())) }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> { self.0.iter().find(|(name, _)| name == field).map(|(_, value)| value) }

    pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.iter().map(|(name, _)| name.as_str()) }

    pub fn values(&self) -> impl Iterator<Item = &Value> { self.0.iter().map(|(_, value)| value) }

    /// Whether the key names exactly `fields`, in that order
    pub fn has_field_order(&self, fields: &[String]) -> bool { self.0.len() == fields.len() && self.fields().zip(fields).all(|(a, b)| a == b) }
}

/// One endpoint component of a range scan. `Min` and `Max` sort below and above every value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyBound {
    Min,
    Value(Value),
    Max,
}

macro_rules! key_bound_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for KeyBound {
            fn from(value: $ty) -> Self { KeyBound::Value(value.into()) }
        })*
    };
}

key_bound_from!(Value, &str, String, i64, i32, f64, bool);

/// An ordered `(field, bound)` list used as the start or end of a primary-key range scan
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeKey(Vec<(String, KeyBound)>);

impl RangeKey {
    pub fn push(&mut self, field: impl Into<String>, bound: KeyBound) { self.0.push((field.into(), bound)) }

    pub fn with(mut self, field: impl Into<String>, bound: impl Into<KeyBound>) -> Self {
        self.push(field, bound.into());
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.iter().map(|(name, _)| name.as_str()) }

    pub fn bounds(&self) -> impl Iterator<Item = &KeyBound> { self.0.iter().map(|(_, bound)| bound) }

    pub fn has_field_order(&self, fields: &[String]) -> bool { self.0.len() == fields.len() && self.fields().zip(fields).all(|(a, b)| a == b) }
}

impl From<PrimaryKey> for RangeKey {
    fn from(key: PrimaryKey) -> Self { Self(key.0.into_iter().map(|(field, value)| (field, KeyBound::Value(value))).collect()) }
}

/// A row as returned by the store: its primary key plus whatever attribute columns were requested
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub primary_key: PrimaryKey,
    pub attributes: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(primary_key: PrimaryKey) -> Self { Self { primary_key, attributes: BTreeMap::new() } }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(column.into(), value.into());
        self
    }

    /// Looks a field up in the primary key first, then in the attributes
    pub fn get(&self, field: &str) -> Option<&Value> { self.primary_key.get(field).or_else(|| self.attributes.get(field)) }

    /// Drops attribute columns the return shape does not ask for
    pub fn shaped(mut self, shape: &ReturnShape) -> Self {
        match shape {
            ReturnShape::AllColumns => {}
            ReturnShape::PrimaryKeyOnly => self.attributes.clear(),
            ReturnShape::Columns(columns) => self.attributes.retain(|name, _| columns.iter().any(|c| c == name)),
        }
        self
    }
}
