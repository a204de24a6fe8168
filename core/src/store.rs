//! The two collaborators the planner and executor talk to: schema lookup and the remote row store.
//!
//! Both are synchronous. A statement issues its remote calls one after another from the caller's thread.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::access::ScanDirection;
use crate::error::StoreError;
use crate::query::{Sort, StructuredQuery};
use crate::row::{PrimaryKey, RangeKey, Row};

/// Which columns the store should return for each row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnShape {
    PrimaryKeyOnly,
    AllColumns,
    Columns(Vec<String>),
}

/// Opaque cursor returned by a search call; only the store that issued it can interpret it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken(pub Vec<u8>);

#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub table: &'a str,
    pub index: &'a str,
    pub query: &'a StructuredQuery,
    pub sort: &'a [Sort],
    /// Only valid without a token
    pub offset: Option<u64>,
    pub token: Option<&'a ContinuationToken>,
    pub limit: u64,
    pub return_shape: &'a ReturnShape,
}

#[derive(Debug, Clone, Default)]
pub struct SearchResponse {
    pub rows: Vec<Row>,
    pub next_token: Option<ContinuationToken>,
}

#[derive(Debug, Clone, Copy)]
pub struct RangeRequest<'a> {
    pub table: &'a str,
    pub direction: ScanDirection,
    /// Inclusive
    pub start: &'a RangeKey,
    /// Exclusive
    pub end: &'a RangeKey,
    pub limit: u64,
    pub max_versions: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RangeResponse {
    pub rows: Vec<Row>,
    /// The first key after the last row returned, present when more rows may follow
    pub next_start_key: Option<PrimaryKey>,
}

pub trait SchemaSource {
    /// Primary-key field names in declared order
    fn describe_table(&self, table: &str) -> Result<Vec<String>, StoreError>;

    /// Search index names in the order the store reports them
    fn list_search_indexes(&self, table: &str) -> Result<Vec<String>, StoreError>;

    fn describe_search_index(&self, table: &str, index: &str) -> Result<BTreeSet<String>, StoreError>;
}

pub trait RemoteStore {
    fn search(&self, request: SearchRequest<'_>) -> Result<SearchResponse, StoreError>;

    fn get_row(&self, table: &str, key: &PrimaryKey, max_versions: u32) -> Result<Option<Row>, StoreError>;

    fn batch_get_row(&self, table: &str, keys: &[PrimaryKey], max_versions: u32) -> Result<Vec<Row>, StoreError>;

    fn get_range(&self, request: RangeRequest<'_>) -> Result<RangeResponse, StoreError>;
}
