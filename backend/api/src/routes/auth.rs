//! Routes under /auth handling authentication related mechanisms.
use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar, WithRejection,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    constants::sessions::SESSION_COOKIE,
    routes::{names::RouteName, RouteTable},
    services::{
        auth::{self, errors::AuthenticationError},
        sessions::UserSession,
    },
    state::AppState,
    utils::httperror::{HttpError, JsonBody},
};

/// Register the /auth routes.
pub fn register(routes: RouteTable) -> RouteTable {
    routes
        .add(RouteName::AuthLogin, login)
        .add(RouteName::AuthLogout, logout)
        .add(RouteName::AuthWhoami, whoami)
}

/// The answer to a login with an unknown email or a wrong password.
fn invalid_credentials() -> HttpError {
    HttpError::new(
        StatusCode::UNAUTHORIZED,
        Some(String::from("Invalid credentials.")),
    )
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

#[derive(Deserialize)]
/// A request to /auth/login.
struct AuthenticateRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
/// A response to /auth/login. The CSRF token must be echoed on every
/// state-changing request made with the session.
struct AuthenticateResponse {
    csrf_token: String,
}

async fn login(
    cookies: CookieJar,
    State(state): State<AppState>,
    WithRejection(Json(body), _): JsonBody<AuthenticateRequest>,
) -> Result<(CookieJar, Json<AuthenticateResponse>), HttpError> {
    let session = auth::authenticate(&body.email, &body.password, &state.db, &state.cache)
        .await?
        .ok_or_else(|| {
            warn!(email = %body.email, "Failed authentication");
            invalid_credentials()
        })?;
    info!(user_id = %session.user_id(), "User logged in");
    Ok((
        cookies.add(session_cookie(session.token().to_owned())),
        Json(AuthenticateResponse {
            csrf_token: session.csrf_token().to_owned(),
        }),
    ))
}

async fn logout(
    cookies: CookieJar,
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> Result<(StatusCode, CookieJar), HttpError> {
    auth::logout(session, &state.cache).await?;
    Ok((
        StatusCode::NO_CONTENT,
        cookies.remove(Cookie::build(SESSION_COOKIE).path("/")),
    ))
}

#[derive(Serialize)]
/// A response to /auth/whoami
struct WhoamiResponse {
    user_id: Uuid,
    email: String,
    name: String,
}

/// Get the currently authenticated user.
async fn whoami(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<WhoamiResponse>, HttpError> {
    let user = auth::current_user(session.user_id(), &state.db)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %session.user_id(), "Session belongs to a user who no longer exists");
            HttpError::new(
                StatusCode::UNAUTHORIZED,
                Some(String::from("Unauthenticated.")),
            )
        })?;
    Ok(Json(WhoamiResponse {
        user_id: user.id(),
        email: user.email().to_owned(),
        name: user.name,
    }))
}

impl From<AuthenticationError> for HttpError {
    fn from(error: AuthenticationError) -> Self {
        match error {
            AuthenticationError::DatabaseError(err) => err.into(),
            AuthenticationError::SessionError(err) => {
                error!(error = %err, "Session store failure during authentication");
                Self::from(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
