//! HTTP error handling and automated response generation
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::{error, info};

use crate::{cache::errors::CacheError, db::errors::DatabaseError};

/// The status code used for a CSRF failure. 419 is non-standard but
/// it's what Laravel does.
pub fn status_code_bad_csrf() -> StatusCode {
    StatusCode::from_u16(419).unwrap_or(StatusCode::FORBIDDEN)
}

/// A JSON body whose rejection is answered as an [`HttpError`].
pub type JsonBody<T> = WithRejection<Json<T>, HttpError>;
/// Path parameters whose rejection is answered as an [`HttpError`].
pub type PathParams<T> = WithRejection<Path<T>, HttpError>;
pub type QueryParams<T> = WithRejection<Query<T>, HttpError>;

/// Represents an HTTP status code, optionally with a custom message.
#[derive(Debug)]
pub struct HttpError {
    /// The numeric HTTP status code to respond with.
    status: StatusCode,
    /// The message to include in the response.
    message: Option<String>,
}

impl From<StatusCode> for HttpError {
    fn from(err: StatusCode) -> Self {
        Self {
            status: err,
            message: None,
        }
    }
}

impl HttpError {
    /// Construct a new HTTP error with a given status code and message.
    pub const fn new(status: StatusCode, message: Option<String>) -> Self {
        Self { status, message }
    }
    /// The status code this error responds with.
    #[cfg(test)]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let message = self
            .message
            .unwrap_or_else(|| self.status.canonical_reason().unwrap_or("").to_owned());
        (self.status, Json(json!({"message": message}))).into_response()
    }
}

impl From<DatabaseError> for HttpError {
    fn from(err: DatabaseError) -> Self {
        error!(error = %err, "Error raised from database in handler");
        Self::from(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<CacheError> for HttpError {
    fn from(err: CacheError) -> Self {
        error!(error = %err, "Error raised from Redis in handler");
        Self::from(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        info!(error = %rejection.body_text(), "Rejected request body");
        Self::new(rejection.status(), Some(rejection.body_text()))
    }
}

impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        info!(error = %rejection.body_text(), "Rejected path parameters");
        Self::new(rejection.status(), Some(rejection.body_text()))
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        info!(error = %rejection.body_text(), "Rejected query string");
        Self::new(rejection.status(), Some(rejection.body_text()))
    }
}

impl From<getrandom::Error> for HttpError {
    fn from(err: getrandom::Error) -> Self {
        error!(error = %err, "Failed to read OS randomness");
        Self::from(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn message_defaults_to_canonical_reason() {
        let response = HttpError::from(StatusCode::NOT_FOUND).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Not Found");
    }

    #[tokio::test]
    async fn storage_errors_do_not_leak_details() {
        let err = DatabaseError::from(sqlx::Error::PoolTimedOut);
        let response = HttpError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal Server Error");
    }

    #[test]
    fn csrf_status_is_419() {
        assert_eq!(status_code_bad_csrf().as_u16(), 419);
    }
}
