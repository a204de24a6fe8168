use std::collections::BTreeSet;
use std::ops::Bound;
use std::path::PathBuf;

use kvql_core::access::ScanDirection;
use kvql_core::error::StoreError;
use kvql_core::query::Sort;
use kvql_core::row::{PrimaryKey, Row};
use kvql_core::store::{ContinuationToken, RangeRequest, RangeResponse, RemoteStore, SchemaSource, SearchRequest, SearchResponse};
use serde::{Deserialize, Serialize};
use sled::{Config, Db, IVec, Tree};
use tracing::debug;

use crate::catalog::{Catalog, IndexRecord, TableRecord};
use crate::encoding::{encode_key, encode_range_key};
use crate::error::{bincode_error, sled_error};
use crate::filtering::{matches, sort_rows};

/// A local store holding each table's rows in a sled tree keyed by the encoded primary key.
///
/// Search indexes are declared field sets; a search evaluates the query over the table's rows and
/// pages the sorted result with a continuation token. Only one version of each row is kept.
pub struct SledStore {
    db: Db,
    catalog: Catalog,
}

/// Where the next search page starts, and the sort the first page was requested with
#[derive(Debug, Serialize, Deserialize)]
struct SearchToken {
    position: u64,
    sort: Vec<Sort>,
}

impl SearchToken {
    fn encode(&self) -> Result<ContinuationToken, StoreError> { Ok(ContinuationToken(bincode::serialize(self).map_err(bincode_error)?)) }

    fn decode(token: &ContinuationToken) -> Result<Self, StoreError> {
        bincode::deserialize(&token.0).map_err(|err| StoreError::InvalidToken(err.to_string()))
    }
}

impl SledStore {
    pub fn open(db: Db) -> anyhow::Result<Self> {
        let catalog = Catalog::open(db.open_tree("catalog")?); // table and index metadata
        Ok(Self { db, catalog })
    }

    pub fn with_path(path: PathBuf) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&path)?;
        let db = sled::open(path.join("sled"))?;
        Self::open(db)
    }

    pub fn new_test() -> anyhow::Result<Self> {
        let db = Config::new().temporary(true).flush_every_ms(None).open()?;
        Self::open(db)
    }

    pub fn create_table(&self, name: &str, primary_key: &[&str]) -> Result<(), StoreError> {
        if primary_key.is_empty() {
            return Err(StoreError::InvalidRequest(format!("table {name} needs at least one primary key field")));
        }
        if self.catalog.contains(name)? {
            return Err(StoreError::InvalidRequest(format!("table {name} already exists")));
        }
        let record = TableRecord { name: name.to_string(), primary_key: primary_key.iter().map(|f| f.to_string()).collect(), indexes: Vec::new() };
        self.catalog.put(&record)?;
        debug!("created table {name} with primary key {primary_key:?}");
        Ok(())
    }

    pub fn create_search_index(&self, table: &str, index: &str, fields: &[&str]) -> Result<(), StoreError> {
        let mut record = self.catalog.get(table)?;
        if fields.is_empty() {
            return Err(StoreError::InvalidRequest(format!("search index {index} needs at least one field")));
        }
        if record.index(index).is_ok() {
            return Err(StoreError::InvalidRequest(format!("search index {index} already exists on table {table}")));
        }
        record.indexes.push(IndexRecord { name: index.to_string(), fields: fields.iter().map(|f| f.to_string()).collect() });
        self.catalog.put(&record)?;
        debug!("created search index {index} on {table} over {fields:?}");
        Ok(())
    }

    pub fn list_tables(&self) -> Result<Vec<String>, StoreError> { self.catalog.names() }

    /// Insert or replace a row
    pub fn put_row(&self, table: &str, row: &Row) -> Result<(), StoreError> {
        let record = self.catalog.get(table)?;
        if !row.primary_key.has_field_order(&record.primary_key) {
            return Err(record.key_order_error("row key"));
        }
        let bytes = bincode::serialize(row).map_err(bincode_error)?;
        self.rows(table)?.insert(encode_key(&row.primary_key), bytes).map_err(sled_error)?;
        Ok(())
    }

    /// Returns whether a row was removed
    pub fn delete_row(&self, table: &str, key: &PrimaryKey) -> Result<bool, StoreError> {
        let record = self.catalog.get(table)?;
        if !key.has_field_order(&record.primary_key) {
            return Err(record.key_order_error("row key"));
        }
        Ok(self.rows(table)?.remove(encode_key(key)).map_err(sled_error)?.is_some())
    }

    fn rows(&self, table: &str) -> Result<Tree, StoreError> { self.db.open_tree(format!("table_{table}")).map_err(sled_error) }
}

fn decode_row(bytes: &IVec) -> Result<Row, StoreError> { bincode::deserialize(bytes).map_err(bincode_error) }

impl SchemaSource for SledStore {
    fn describe_table(&self, table: &str) -> Result<Vec<String>, StoreError> { Ok(self.catalog.get(table)?.primary_key) }

    fn list_search_indexes(&self, table: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.catalog.get(table)?.indexes.into_iter().map(|index| index.name).collect())
    }

    fn describe_search_index(&self, table: &str, index: &str) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.catalog.get(table)?.index(index)?.fields.iter().cloned().collect())
    }
}

impl RemoteStore for SledStore {
    fn search(&self, request: SearchRequest<'_>) -> Result<SearchResponse, StoreError> {
        let record = self.catalog.get(request.table)?;
        let index = record.index(request.index)?;
        if request.limit == 0 {
            return Err(StoreError::InvalidRequest("search limit must be positive".into()));
        }

        let (position, sort) = match request.token {
            Some(token) => {
                if request.offset.is_some() {
                    return Err(StoreError::InvalidRequest("offset cannot be combined with a continuation token".into()));
                }
                let token = SearchToken::decode(token)?;
                (token.position, token.sort)
            }
            None => (request.offset.unwrap_or(0), request.sort.to_vec()),
        };

        let fields = request.query.fields();
        if let Some(field) = fields.into_iter().chain(sort.iter().map(|s| s.field.as_str())).find(|field| !index.fields.iter().any(|f| f == field))
        {
            return Err(StoreError::InvalidRequest(format!("field {field} is not in search index {}", index.name)));
        }

        let mut rows = Vec::new();
        for item in self.rows(request.table)?.iter() {
            let (_, bytes) = item.map_err(sled_error)?;
            let row = decode_row(&bytes)?;
            if matches(request.query, &row) {
                rows.push(row);
            }
        }
        sort_rows(&mut rows, &sort);

        let total = rows.len() as u64;
        let end = position.saturating_add(request.limit).min(total);
        let page: Vec<Row> = rows
            .into_iter()
            .skip(position as usize)
            .take(end.saturating_sub(position) as usize)
            .map(|row| row.shaped(request.return_shape))
            .collect();
        let next_token = if end < total { Some(SearchToken { position: end, sort }.encode()?) } else { None };
        debug!("search {}.{} at {position}: {} of {total} rows", request.table, request.index, page.len());

        Ok(SearchResponse { rows: page, next_token })
    }

    fn get_row(&self, table: &str, key: &PrimaryKey, _max_versions: u32) -> Result<Option<Row>, StoreError> {
        let record = self.catalog.get(table)?;
        if !key.has_field_order(&record.primary_key) {
            return Err(record.key_order_error("get key"));
        }
        self.rows(table)?.get(encode_key(key)).map_err(sled_error)?.map(|bytes| decode_row(&bytes)).transpose()
    }

    fn batch_get_row(&self, table: &str, keys: &[PrimaryKey], _max_versions: u32) -> Result<Vec<Row>, StoreError> {
        let record = self.catalog.get(table)?;
        if keys.iter().any(|key| !key.has_field_order(&record.primary_key)) {
            return Err(record.key_order_error("batch get key"));
        }
        let tree = self.rows(table)?;
        let mut rows = Vec::new();
        for key in keys {
            if let Some(bytes) = tree.get(encode_key(key)).map_err(sled_error)? {
                rows.push(decode_row(&bytes)?);
            }
        }
        Ok(rows)
    }

    fn get_range(&self, request: RangeRequest<'_>) -> Result<RangeResponse, StoreError> {
        let record = self.catalog.get(request.table)?;
        if !request.start.has_field_order(&record.primary_key) || !request.end.has_field_order(&record.primary_key) {
            return Err(record.key_order_error("range key"));
        }
        if request.limit == 0 {
            return Err(StoreError::InvalidRequest("range limit must be positive".into()));
        }

        let start = encode_range_key(request.start);
        let end = encode_range_key(request.end);
        let tree = self.rows(request.table)?;
        let iter: Box<dyn Iterator<Item = sled::Result<(IVec, IVec)>>> = match request.direction {
            ScanDirection::Forward if start < end => Box::new(tree.range(start..end)),
            ScanDirection::Reverse if start > end => Box::new(tree.range((Bound::Excluded(end), Bound::Included(start))).rev()),
            _ => return Ok(RangeResponse::default()),
        };

        let mut rows = Vec::new();
        let mut next_start_key = None;
        for item in iter {
            let (_, bytes) = item.map_err(sled_error)?;
            let row = decode_row(&bytes)?;
            if rows.len() as u64 == request.limit {
                next_start_key = Some(row.primary_key);
                break;
            }
            rows.push(row);
        }
        debug!("range {} {:?}: {} rows, more: {}", request.table, request.direction, rows.len(), next_start_key.is_some());

        Ok(RangeResponse { rows, next_start_key })
    }
}
