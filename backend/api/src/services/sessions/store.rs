//! Provides an abstracted interface to the underlying session store. Accessible only
//! within the session service, since no other part of the code should ever access
//! the session store.
use redis::AsyncCommands as _;
use uuid::Uuid;

use crate::cache;

/// A connection to the session store, checked out of the Redis pool.
pub struct Connection(cache::Connection);

/// Information stored under a given session token.
#[derive(Clone, Debug)]
pub struct SessionInfo {
    /// The authenticated user.
    pub user_id: Uuid,
    /// The CSRF token state-changing requests must echo.
    pub csrf: String,
}

fn key_for(token: &str) -> String {
    format!("sessions:authenticated:{token}")
}

impl Connection {
    /// Check a connection to the session store out of the pool.
    pub async fn open(pool: &cache::Pool) -> Result<Self, errors::SessionStorageError> {
        Ok(Self(cache::connection(pool).await?))
    }

    /// Store a new session under `token`. Fails with `Duplicate` if the token
    /// is already taken, leaving the existing session untouched.
    pub(super) async fn create(
        &mut self,
        token: &str,
        info: &SessionInfo,
        seconds: u32,
    ) -> Result<(), errors::SessionCreationError> {
        let key = key_for(token);
        let created: bool = self.0.hset_nx(&key, "user_id", info.user_id.to_string()).await?;
        if !created {
            return Err(errors::SessionCreationError::Duplicate);
        }
        let _: () = self.0.hset(&key, "csrf", &info.csrf).await?;
        let _: () = self.0.expire(&key, i64::from(seconds)).await?;
        Ok(())
    }

    /// Delete a token and all associated data from the store.
    pub(super) async fn delete(&mut self, token: &str) -> Result<(), errors::SessionStorageError> {
        let _: () = self.0.del(key_for(token)).await?;
        Ok(())
    }

    /// Get stored session info associated with a given token.
    pub(super) async fn get_info(
        &mut self,
        token: &str,
    ) -> Result<Option<SessionInfo>, errors::SessionStorageError> {
        let (user_id, csrf): (Option<String>, Option<String>) =
            self.0.hget(key_for(token), &["user_id", "csrf"]).await?;
        Ok(user_id
            .and_then(|user_id| Uuid::parse_str(&user_id).ok())
            .zip(csrf)
            .map(|(user_id, csrf)| SessionInfo { user_id, csrf }))
    }
}

/// Errors returned by functions in this module.
pub mod errors {
    use redis::RedisError;
    use thiserror::Error;

    use crate::cache::errors::CacheError;

    /// An error returned by the underlying storage layer.
    #[derive(Error, Debug)]
    #[error(transparent)]
    pub struct SessionStorageError(#[from] CacheError);

    impl From<RedisError> for SessionStorageError {
        fn from(err: RedisError) -> Self {
            Self(CacheError::from(err))
        }
    }

    /// Errors which can be thrown when creating a new session in the store.
    #[derive(Error, Debug)]
    pub enum SessionCreationError {
        /// There is already a session with the same token.
        #[error("Attempted to store a session token which already exists.")]
        Duplicate,
        /// There was an error while writing to/reading from the store.
        #[error(transparent)]
        StorageError(#[from] SessionStorageError),
    }

    impl From<RedisError> for SessionCreationError {
        fn from(err: RedisError) -> Self {
            Self::from(SessionStorageError::from(err))
        }
    }
}
