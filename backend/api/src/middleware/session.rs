//! Middleware used for checking user authentication.
use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::{error, warn};

use crate::{
    constants::sessions::{CSRF_HEADER, SESSION_COOKIE},
    services::sessions::UserSession,
    state::AppState,
    utils::{
        httperror::{status_code_bad_csrf, HttpError},
        tokens::is_well_formed,
    },
};

fn unauthenticated() -> HttpError {
    HttpError::new(StatusCode::UNAUTHORIZED, Some("Unauthenticated.".to_owned()))
}

/// Whether a request method can change state and so needs a CSRF token.
fn needs_csrf(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Check the CSRF header of a request against the session's token. Safe
/// methods pass without one.
fn check_csrf(method: &Method, headers: &HeaderMap, expected: &str) -> Result<(), HttpError> {
    if !needs_csrf(method) {
        return Ok(());
    }
    let csrf_token = headers
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok());
    if csrf_token == Some(expected) {
        Ok(())
    } else {
        warn!("Missing or incorrect {CSRF_HEADER} in request");
        Err(HttpError::new(
            status_code_bad_csrf(),
            Some("CSRF token mismatch.".to_owned()),
        ))
    }
}

/// Middleware to parse a session cookie and identify the associated user.
/// The [`UserSession`] is inserted as a request extension for handlers.
pub async fn session_middleware(
    State(state): State<AppState>,
    cookie_jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let token = cookie_jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|token| is_well_formed(token))
        .ok_or_else(unauthenticated)?;
    let session = UserSession::get(token, &state.cache)
        .await
        .map_err(|err| {
            error!(error = %err, "Error loading session from store");
            HttpError::from(StatusCode::INTERNAL_SERVER_ERROR)
        })?
        .ok_or_else(|| {
            warn!("Invalid session token");
            unauthenticated()
        })?;
    check_csrf(req.method(), req.headers(), session.csrf_token())?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::HeaderValue, response::IntoResponse as _};

    use super::*;

    fn headers_with(csrf_token: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, HeaderValue::from_static(csrf_token));
        headers
    }

    #[tokio::test]
    async fn mismatched_csrf_tokens_are_419() {
        for headers in [HeaderMap::new(), headers_with("forged")] {
            let response = check_csrf(&Method::POST, &headers, "expected")
                .unwrap_err()
                .into_response();
            assert_eq!(response.status().as_u16(), 419);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["message"], "CSRF token mismatch.");
        }
    }

    #[test]
    fn matching_csrf_tokens_pass() {
        assert!(check_csrf(&Method::POST, &headers_with("expected"), "expected").is_ok());
    }

    #[test]
    fn safe_requests_need_no_csrf_token() {
        assert!(check_csrf(&Method::GET, &HeaderMap::new(), "expected").is_ok());
    }

    #[test]
    fn safe_methods_skip_csrf() {
        assert!(!needs_csrf(&Method::GET));
        assert!(!needs_csrf(&Method::HEAD));
        assert!(!needs_csrf(&Method::OPTIONS));
        assert!(needs_csrf(&Method::POST));
        assert!(needs_csrf(&Method::DELETE));
    }
}
