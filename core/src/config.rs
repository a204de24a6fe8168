use serde::{Deserialize, Serialize};

/// Limits applied while planning and executing statements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Page size cap for every remote call
    pub max_rows_per_request: u64,
    pub max_versions: u32,
    /// Implicit LIMIT for a SELECT without one
    pub max_select_rows: u64,
    pub max_update_rows: u64,
    pub max_delete_rows: u64,
    /// Upper bound on `offset + count` of an explicit LIMIT
    pub max_total_rows: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_rows_per_request: 100,
            max_versions: 1,
            max_select_rows: 100,
            max_update_rows: 1000,
            max_delete_rows: 1000,
            max_total_rows: 10000,
        }
    }
}

impl QueryConfig {
    pub fn new() -> Self { Self::default() }

    pub fn with_max_rows_per_request(mut self, rows: u64) -> Self {
        self.max_rows_per_request = rows;
        self
    }

    pub fn with_max_versions(mut self, versions: u32) -> Self {
        self.max_versions = versions;
        self
    }

    pub fn with_max_select_rows(mut self, rows: u64) -> Self {
        self.max_select_rows = rows;
        self
    }

    pub fn with_max_update_rows(mut self, rows: u64) -> Self {
        self.max_update_rows = rows;
        self
    }

    pub fn with_max_delete_rows(mut self, rows: u64) -> Self {
        self.max_delete_rows = rows;
        self
    }

    pub fn with_max_total_rows(mut self, rows: u64) -> Self {
        self.max_total_rows = rows;
        self
    }
}
