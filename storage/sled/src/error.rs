use kvql_core::error::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SledStoreError {
    #[error("Storage error: {0}")]
    StorageError(#[from] sled::Error),
    #[error("Bincode error: {0}")]
    BincodeError(#[from] bincode::Error),
}

impl From<SledStoreError> for StoreError {
    fn from(err: SledStoreError) -> Self { StoreError::StorageError(Box::new(err)) }
}

pub fn sled_error(err: sled::Error) -> StoreError { SledStoreError::StorageError(err).into() }

pub fn bincode_error(err: bincode::Error) -> StoreError { SledStoreError::BincodeError(err).into() }
