use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database connection failed: {0}")]
    Connectivity(String),
    #[error("Bulk insert failed: {0}")]
    BulkWrite(String),
    #[error("Balance query failed: {0}")]
    Query(String),
    #[error("Unexpected aggregation result: {0}")]
    MalformedResult(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
