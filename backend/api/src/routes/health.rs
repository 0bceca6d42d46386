//! The readiness check used by container orchestration.
use axum::{extract::State, http::StatusCode, Json};

use crate::{
    routes::{names::RouteName, RouteTable},
    services::health::{self, HealthReport},
    state::AppState,
};

pub fn register(routes: RouteTable) -> RouteTable {
    routes.add(RouteName::Health, health_check)
}

/// 200 when the database and Redis both answer, 503 otherwise.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = health::check(&state.db, &state.cache).await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
