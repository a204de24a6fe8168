use thiserror::Error;

/// Failures reported by the schema or row-store collaborators
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("table {0} not found")]
    TableNotFound(String),
    #[error("search index {index} not found on table {table}")]
    IndexNotFound { table: String, index: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid continuation token: {0}")]
    InvalidToken(String),
    #[error("storage error: {0}")]
    StorageError(Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Reasons a statement cannot be turned into an access plan
#[derive(Error, Debug)]
pub enum PlanError {
    /// Operands are arranged in a way that cannot be translated, such as two columns or two literals
    #[error("invalid expression shape: {0}")]
    InvalidExpressionShape(String),
    /// The predicate is well formed but the chosen access path cannot express it
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("no index on table {table} covers fields {fields:?}")]
    NoSatisfyingIndex { table: String, fields: Vec<String> },
    #[error("schema for table {table} unavailable: {source}")]
    SchemaUnavailable {
        table: String,
        #[source]
        source: StoreError,
    },
    /// A planner bug rather than a user error
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
