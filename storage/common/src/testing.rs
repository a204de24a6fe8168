//! Fake collaborators for planner and executor tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use kvql_core::error::StoreError;
use kvql_core::row::{PrimaryKey, RangeKey, Row};
use kvql_core::store::{ContinuationToken, RangeRequest, RangeResponse, RemoteStore, SchemaSource, SearchRequest, SearchResponse};
use tracing::Level;

#[ctor::ctor]
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").ok().and_then(|level| level.parse().ok()).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).with_test_writer().init();
}

#[derive(Default)]
struct FakeTable {
    primary_key: Vec<String>,
    indexes: Vec<(String, BTreeSet<String>)>,
}

/// In-memory schema: tables with a primary key and search indexes in registration order
#[derive(Default)]
pub struct FakeSchema {
    tables: BTreeMap<String, FakeTable>,
}

impl FakeSchema {
    pub fn new() -> Self { Self::default() }

    pub fn table(mut self, name: &str, primary_key: &[&str]) -> Self {
        self.tables.entry(name.to_string()).or_default().primary_key = primary_key.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn index(mut self, table: &str, index: &str, fields: &[&str]) -> Self {
        let fields = fields.iter().map(|f| f.to_string()).collect();
        self.tables.entry(table.to_string()).or_default().indexes.push((index.to_string(), fields));
        self
    }

    fn get(&self, table: &str) -> Result<&FakeTable, StoreError> { self.tables.get(table).ok_or_else(|| StoreError::TableNotFound(table.to_string())) }
}

impl SchemaSource for FakeSchema {
    fn describe_table(&self, table: &str) -> Result<Vec<String>, StoreError> { Ok(self.get(table)?.primary_key.clone()) }

    fn list_search_indexes(&self, table: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.get(table)?.indexes.iter().map(|(name, _)| name.clone()).collect())
    }

    fn describe_search_index(&self, table: &str, index: &str) -> Result<BTreeSet<String>, StoreError> {
        self.get(table)?
            .indexes
            .iter()
            .find(|(name, _)| name == index)
            .map(|(_, fields)| fields.clone())
            .ok_or_else(|| StoreError::IndexNotFound { table: table.to_string(), index: index.to_string() })
    }
}

/// A remote call as the fake store saw it
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search { offset: Option<u64>, token: Option<ContinuationToken>, limit: u64, sorted: bool },
    Get(PrimaryKey),
    Batch(Vec<PrimaryKey>),
    Range { start: RangeKey, limit: u64 },
}

/// Replays scripted search and range pages, and serves gets from a fixed row set
#[derive(Default)]
pub struct ScriptedStore {
    search_pages: RefCell<VecDeque<Result<SearchResponse, StoreError>>>,
    range_pages: RefCell<VecDeque<RangeResponse>>,
    rows: Vec<Row>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedStore {
    pub fn new() -> Self { Self::default() }

    pub fn search_page(self, rows: Vec<Row>, token: Option<&str>) -> Self {
        let next_token = token.map(|t| ContinuationToken(t.as_bytes().to_vec()));
        self.search_pages.borrow_mut().push_back(Ok(SearchResponse { rows, next_token }));
        self
    }

    pub fn search_failure(self, message: &str) -> Self {
        self.search_pages.borrow_mut().push_back(Err(StoreError::InvalidRequest(message.to_string())));
        self
    }

    pub fn range_page(self, rows: Vec<Row>, next_start_key: Option<PrimaryKey>) -> Self {
        self.range_pages.borrow_mut().push_back(RangeResponse { rows, next_start_key });
        self
    }

    pub fn row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    pub fn calls(&self) -> Vec<Call> { self.calls.borrow().clone() }
}

impl RemoteStore for ScriptedStore {
    fn search(&self, request: SearchRequest<'_>) -> Result<SearchResponse, StoreError> {
        self.calls.borrow_mut().push(Call::Search {
            offset: request.offset,
            token: request.token.cloned(),
            limit: request.limit,
            sorted: !request.sort.is_empty(),
        });
        self.search_pages.borrow_mut().pop_front().unwrap_or_else(|| Ok(SearchResponse::default()))
    }

    fn get_row(&self, _table: &str, key: &PrimaryKey, _max_versions: u32) -> Result<Option<Row>, StoreError> {
        self.calls.borrow_mut().push(Call::Get(key.clone()));
        Ok(self.rows.iter().find(|row| &row.primary_key == key).cloned())
    }

    fn batch_get_row(&self, _table: &str, keys: &[PrimaryKey], _max_versions: u32) -> Result<Vec<Row>, StoreError> {
        self.calls.borrow_mut().push(Call::Batch(keys.to_vec()));
        Ok(keys.iter().filter_map(|key| self.rows.iter().find(|row| &row.primary_key == key).cloned()).collect())
    }

    fn get_range(&self, request: RangeRequest<'_>) -> Result<RangeResponse, StoreError> {
        self.calls.borrow_mut().push(Call::Range { start: request.start.clone(), limit: request.limit });
        Ok(self.range_pages.borrow_mut().pop_front().unwrap_or_default())
    }
}

pub fn row(id: i64) -> Row { Row::new(PrimaryKey::default().with("id", id)).with("name", format!("row{id}")) }

pub fn rows(ids: std::ops::Range<i64>) -> Vec<Row> { ids.map(row).collect() }
