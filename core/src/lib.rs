pub mod access;
pub mod config;
pub mod error;
pub mod query;
pub mod row;
pub mod store;
pub mod value;

pub use access::{AccessDescriptor, ConstraintKind, KeyConstraint, ScanDirection};
pub use config::QueryConfig;
pub use error::{ExecutionError, PlanError, StoreError};
pub use query::{BoolQuery, Sort, SortOrder, StructuredQuery};
pub use row::{KeyBound, PrimaryKey, RangeKey, Row};
pub use store::{ContinuationToken, RangeRequest, RangeResponse, RemoteStore, ReturnShape, SchemaSource, SearchRequest, SearchResponse};
pub use value::Value;
