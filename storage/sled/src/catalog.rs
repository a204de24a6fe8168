use kvql_core::error::StoreError;
use serde::{Deserialize, Serialize};
use sled::Tree;

use crate::error::{bincode_error, sled_error};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub name: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    pub name: String,
    pub primary_key: Vec<String>,
    /// In creation order
    pub indexes: Vec<IndexRecord>,
}

impl TableRecord {
    pub fn index(&self, name: &str) -> Result<&IndexRecord, StoreError> {
        self.indexes
            .iter()
            .find(|index| index.name == name)
            .ok_or_else(|| StoreError::IndexNotFound { table: self.name.clone(), index: name.to_string() })
    }

    pub fn key_order_error(&self, what: &str) -> StoreError {
        StoreError::InvalidRequest(format!("{what} for table {} must list primary key fields {:?} in order", self.name, self.primary_key))
    }
}

/// Table metadata, one bincode record per table keyed by name
pub struct Catalog {
    tree: Tree,
}

impl Catalog {
    pub fn open(tree: Tree) -> Self { Self { tree } }

    pub fn get(&self, table: &str) -> Result<TableRecord, StoreError> {
        match self.tree.get(table).map_err(sled_error)? {
            Some(bytes) => bincode::deserialize(&bytes).map_err(bincode_error),
            None => Err(StoreError::TableNotFound(table.to_string())),
        }
    }

    pub fn contains(&self, table: &str) -> Result<bool, StoreError> { self.tree.contains_key(table).map_err(sled_error) }

    pub fn put(&self, record: &TableRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(bincode_error)?;
        self.tree.insert(record.name.as_str(), bytes).map_err(sled_error)?;
        Ok(())
    }

    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        self.tree
            .iter()
            .keys()
            .map(|key| {
                let key = key.map_err(sled_error)?;
                Ok(String::from_utf8_lossy(&key).into_owned())
            })
            .collect()
    }
}
