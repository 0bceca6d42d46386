//! Shared errors used in multiple services.
use redis::RedisError;
use thiserror::Error;

use crate::{cache::errors::CacheError, db::errors::DatabaseError};

/// Errors returned by underlying storage layers.
#[derive(Error, Debug)]
pub enum StorageError {
    /// An error returned by the database.
    #[error(transparent)]
    DatabaseError(#[from] DatabaseError),
    /// An error returned by the Redis store.
    #[error(transparent)]
    CacheError(#[from] CacheError),
}

impl From<RedisError> for StorageError {
    fn from(err: RedisError) -> Self {
        Self::CacheError(CacheError::from(err))
    }
}
