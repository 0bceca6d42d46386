//! Defines the state shared across the Axum application.
use crate::{cache, db, services::openai};

#[derive(Clone)]
/// The state struct shared across routers.
pub struct AppState {
    /// A database connection pool for getting new database connections.
    pub db: db::ConnectionPool,
    /// A pool of Redis connections backing carts and sessions.
    pub cache: cache::Pool,
    /// The client for the text generation provider.
    pub openai: openai::Client,
}
