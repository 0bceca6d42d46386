//! Pooled connections to Redis, which stores carts and sessions.
use core::time::Duration;

use deadpool_redis::{Config, PoolConfig, Runtime, Timeouts};
use redis::cmd;

use crate::constants::redis as constants;

/// A pool of Redis connections. Cheap to clone and share between threads.
pub type Pool = deadpool_redis::Pool;
/// A single connection checked out of the pool.
pub type Connection = deadpool_redis::Connection;

/// Build a pool without connecting. Connections are opened on first use and
/// every wait for one is bounded by `timeout`.
pub fn connect_lazy(url: &str, timeout: Duration) -> Result<Pool, errors::CacheError> {
    let mut config = Config::from_url(url);
    config.pool = Some(PoolConfig {
        timeouts: Timeouts {
            wait: Some(timeout),
            create: Some(timeout),
            recycle: Some(timeout),
        },
        ..PoolConfig::default()
    });
    Ok(config.create_pool(Some(Runtime::Tokio1))?)
}

/// Build the application's pool from the environment configuration.
pub fn connect() -> Result<Pool, errors::CacheError> {
    connect_lazy(&constants::REDIS_URL, constants::REDIS_TIMEOUT)
}

/// Check a connection out of the pool.
pub async fn connection(pool: &Pool) -> Result<Connection, errors::CacheError> {
    Ok(pool.get().await?)
}

/// Send a `PING` to prove Redis is reachable.
pub async fn ping(pool: &Pool) -> Result<(), errors::CacheError> {
    let mut conn = connection(pool).await?;
    let _: String = cmd("PING").query_async(&mut conn).await?;
    Ok(())
}

pub mod errors {
    use deadpool_redis::{CreatePoolError, PoolError};
    use redis::RedisError;
    use thiserror::Error;

    /// Errors raised by the Redis layer.
    #[derive(Error, Debug)]
    pub enum CacheError {
        /// The pool configuration was rejected.
        #[error("Failed to create the Redis pool: {0}")]
        CreatePool(#[from] CreatePoolError),
        /// No connection could be checked out of the pool.
        #[error("Failed to get a Redis connection: {0}")]
        Pool(#[from] PoolError),
        /// A command failed.
        #[error(transparent)]
        Redis(#[from] RedisError),
    }
}
