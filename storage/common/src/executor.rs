//! Paginated execution of a planned statement.
//!
//! [`RowStream`] is a pull-based cursor: each call to `next` either hands out a buffered row or issues the
//! next remote call. Nothing is fetched before the first `next`, and dropping the stream simply abandons the
//! cursor; every page request is self-contained, so there is nothing to clean up on the store side.

use std::collections::VecDeque;

use kvql_core::access::{AccessDescriptor, KeyConstraint, ScanDirection};
use kvql_core::config::QueryConfig;
use kvql_core::error::ExecutionError;
use kvql_core::query::{Sort, StructuredQuery};
use kvql_core::row::{PrimaryKey, RangeKey, Row};
use kvql_core::store::{ContinuationToken, RangeRequest, RemoteStore, ReturnShape, SearchRequest};
use tracing::debug;

use crate::planner::StatementPlan;

pub struct Executor<'a, R: RemoteStore + ?Sized> {
    store: &'a R,
    config: QueryConfig,
}

impl<'a, R: RemoteStore + ?Sized> Executor<'a, R> {
    pub fn new(store: &'a R, config: QueryConfig) -> Self { Self { store, config } }

    /// Start executing `plan`. Fails up front for an offset on a range scan; remote failures surface from the stream.
    pub fn execute(&self, plan: &StatementPlan) -> Result<RowStream<'a, R>, ExecutionError> {
        self.execute_access(&plan.table, &plan.access, &plan.query, &plan.sort, plan.offset, plan.limit, &plan.return_shape)
    }

    /// Execute one access descriptor over a row window. `query` and `sort` only apply to search indexes.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_access(
        &self,
        table: &str,
        access: &AccessDescriptor,
        query: &StructuredQuery,
        sort: &[Sort],
        offset: u64,
        limit: u64,
        return_shape: &ReturnShape,
    ) -> Result<RowStream<'a, R>, ExecutionError> {
        let source = match access {
            AccessDescriptor::SearchIndex { index_name } => {
                Source::Search { index: index_name.clone(), query: query.clone(), sort: sort.to_vec(), first_offset: offset }
            }
            AccessDescriptor::PrimaryKeyGet { key } => Source::Get { key: key.clone(), skip: offset },
            AccessDescriptor::PrimaryKeyBatch { keys } => Source::Batch { keys: keys.clone(), skip: offset },
            AccessDescriptor::PrimaryKeyRange { start, end, direction, residual } => {
                if offset != 0 {
                    return Err(ExecutionError::UnsupportedOperation(format!("OFFSET {offset} on a primary key range scan")));
                }
                Source::Range { start: start.clone(), end: end.clone(), direction: *direction, residual: residual.clone() }
            }
        };

        Ok(RowStream {
            store: self.store,
            table: table.to_string(),
            source,
            return_shape: return_shape.clone(),
            page_size: self.config.max_rows_per_request.max(1),
            max_versions: self.config.max_versions,
            remaining: limit,
            buffer: VecDeque::new(),
            cursor: Cursor::Start,
            calls: 0,
        })
    }
}

enum Source {
    Search { index: String, query: StructuredQuery, sort: Vec<Sort>, first_offset: u64 },
    Get { key: PrimaryKey, skip: u64 },
    Batch { keys: Vec<PrimaryKey>, skip: u64 },
    Range { start: RangeKey, end: RangeKey, direction: ScanDirection, residual: Vec<KeyConstraint> },
}

/// Where the next remote call starts
enum Cursor {
    Start,
    Token(ContinuationToken),
    StartKey(RangeKey),
    Exhausted,
}

/// A finite, non-restartable sequence of at most `limit` rows.
///
/// A remote failure is yielded once, after which the stream is exhausted.
pub struct RowStream<'a, R: RemoteStore + ?Sized> {
    store: &'a R,
    table: String,
    source: Source,
    return_shape: ReturnShape,
    page_size: u64,
    max_versions: u32,
    remaining: u64,
    buffer: VecDeque<Row>,
    cursor: Cursor,
    calls: usize,
}

impl<'a, R: RemoteStore + ?Sized> RowStream<'a, R> {
    /// Number of remote calls issued so far
    pub fn calls(&self) -> usize { self.calls }

    /// Only the primary keys, as UPDATE and DELETE need them
    pub fn primary_keys(self) -> impl Iterator<Item = Result<PrimaryKey, ExecutionError>> + 'a
    where R: 'a {
        self.map(|row| row.map(|row| row.primary_key))
    }

    fn fetch(&mut self) -> Result<(), ExecutionError> {
        let cursor = std::mem::replace(&mut self.cursor, Cursor::Exhausted);
        self.calls += 1;
        match &self.source {
            Source::Search { index, query, sort, first_offset } => {
                let first = matches!(cursor, Cursor::Start);
                let token = match &cursor {
                    Cursor::Token(token) => Some(token),
                    _ => None,
                };
                let request = SearchRequest {
                    table: &self.table,
                    index,
                    query,
                    // the token carries the sort after the first page
                    sort: if first { sort.as_slice() } else { &[] },
                    offset: if first { Some(*first_offset) } else { None },
                    token,
                    limit: if first { self.remaining.min(self.page_size) } else { self.page_size },
                    return_shape: &self.return_shape,
                };
                let response = self.store.search(request)?;
                debug!(
                    "{}: search {} call {} returned {} rows, more: {}",
                    self.table,
                    index,
                    self.calls,
                    response.rows.len(),
                    response.next_token.is_some()
                );
                self.buffer.extend(response.rows);
                if let Some(token) = response.next_token {
                    self.cursor = Cursor::Token(token);
                }
            }
            Source::Get { key, skip } => {
                let row = self.store.get_row(&self.table, key, self.max_versions)?;
                debug!("{}: get returned {} rows", self.table, row.is_some() as usize);
                let shape = &self.return_shape;
                self.buffer.extend(row.into_iter().skip(*skip as usize).map(|row| row.shaped(shape)));
            }
            Source::Batch { keys, skip } => {
                let rows = self.store.batch_get_row(&self.table, keys, self.max_versions)?;
                debug!("{}: batch get of {} keys returned {} rows", self.table, keys.len(), rows.len());
                let shape = &self.return_shape;
                self.buffer.extend(rows.into_iter().skip(*skip as usize).map(|row| row.shaped(shape)));
            }
            Source::Range { start, end, direction, residual } => {
                let start = match &cursor {
                    Cursor::StartKey(next) => next,
                    _ => start,
                };
                let request = RangeRequest {
                    table: &self.table,
                    direction: *direction,
                    start,
                    end,
                    limit: self.page_size,
                    max_versions: self.max_versions,
                };
                let response = self.store.get_range(request)?;
                debug!(
                    "{}: range call {} returned {} rows, more: {}",
                    self.table,
                    self.calls,
                    response.rows.len(),
                    response.next_start_key.is_some()
                );
                let shape = &self.return_shape;
                self.buffer.extend(
                    response
                        .rows
                        .into_iter()
                        .filter(|row| residual.iter().all(|constraint| constraint.matches_key(&row.primary_key)))
                        .map(|row| row.shaped(shape)),
                );
                if let Some(next) = response.next_start_key {
                    self.cursor = Cursor::StartKey(next.into());
                }
            }
        }
        Ok(())
    }
}

impl<'a, R: RemoteStore + ?Sized> Iterator for RowStream<'a, R> {
    type Item = Result<Row, ExecutionError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining == 0 {
                self.buffer.clear();
                self.cursor = Cursor::Exhausted;
                return None;
            }
            if let Some(row) = self.buffer.pop_front() {
                self.remaining -= 1;
                return Some(Ok(row));
            }
            if matches!(self.cursor, Cursor::Exhausted) {
                return None;
            }
            if let Err(err) = self.fetch() {
                self.cursor = Cursor::Exhausted;
                return Some(Err(err));
            }
        }
    }
}
