//! Logic for session handling. Creating, looking up and revoking session tokens.
pub mod store;

use uuid::Uuid;

use crate::{cache, constants::sessions::SESSION_TIMEOUT, utils::tokens::generate_token};
use store::SessionInfo;

/// A session associating a session token with an authenticated user.
/// Constructed by logging in, or by looking up a token presented in a cookie.
#[derive(Clone, Debug)]
pub struct UserSession {
    /// The session token used to identify this session.
    token: String,
    /// The information stored in this session.
    info: SessionInfo,
}

impl UserSession {
    /// Create a new session for a user, with a fresh token and CSRF token.
    pub async fn create(
        user_id: Uuid,
        cache_pool: &cache::Pool,
    ) -> Result<Self, errors::SessionError> {
        let mut session_store = store::Connection::open(cache_pool).await?;
        let info = SessionInfo {
            user_id,
            csrf: generate_token()?,
        };
        let token = loop {
            // Loop and return a token once we successfully store the session.
            let candidate = generate_token()?;
            match session_store
                .create(&candidate, &info, SESSION_TIMEOUT)
                .await
            {
                Ok(()) => break candidate,
                Err(store::errors::SessionCreationError::StorageError(error)) => {
                    return Err(error.into())
                }
                Err(store::errors::SessionCreationError::Duplicate) => {} // keep looping
            }
        };
        Ok(Self { token, info })
    }

    /// Get the session identified by a token, if it exists and has not expired.
    pub async fn get(
        token: &str,
        cache_pool: &cache::Pool,
    ) -> Result<Option<Self>, errors::SessionError> {
        let mut session_store = store::Connection::open(cache_pool).await?;
        Ok(session_store
            .get_info(token)
            .await?
            .map(|info| Self {
                token: token.to_owned(),
                info,
            }))
    }

    /// Delete this session, immediately invalidating it.
    pub async fn delete(self, cache_pool: &cache::Pool) -> Result<(), errors::SessionError> {
        let mut session_store = store::Connection::open(cache_pool).await?;
        Ok(session_store.delete(&self.token).await?)
    }

    /// Get the session token which identifies this session.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Get the ID of the user authenticated by this session.
    pub const fn user_id(&self) -> Uuid {
        self.info.user_id
    }

    /// Get this session's CSRF token.
    pub fn csrf_token(&self) -> &str {
        &self.info.csrf
    }
}

/// Errors returned by function within this module.
pub mod errors {
    use thiserror::Error;

    pub use super::store::errors::SessionStorageError;

    #[derive(Error, Debug)]
    pub enum SessionError {
        #[error(transparent)]
        Storage(#[from] SessionStorageError),
        #[error("Failed to generate a session token: {0}")]
        Entropy(#[from] getrandom::Error),
    }
}
