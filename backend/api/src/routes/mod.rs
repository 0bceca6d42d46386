//! API routes within the application. Each submodule registers its handlers
//! by route name, and the router is built from the resulting table.
pub mod auth;
pub mod health;
pub mod names;
pub mod openai;
pub mod root;
pub mod shop;

use axum::{
    handler::Handler,
    middleware::{from_fn, from_fn_with_state},
    routing::on,
    Router,
};
use tracing::warn;

use crate::{
    middleware::{logging::log_requests, session::session_middleware},
    routes::names::RouteName,
    state::AppState,
};

/// Handlers registered by route name. Each route lands at its template under
/// its method, and routes needing auth sit behind the session middleware.
pub struct RouteTable {
    router: Router<AppState>,
    state: AppState,
    registered: Vec<RouteName>,
}

impl RouteTable {
    fn new(state: &AppState) -> Self {
        Self {
            router: Router::new(),
            state: state.clone(),
            registered: Vec::with_capacity(RouteName::ALL.len()),
        }
    }

    /// Register the handler serving `route`.
    pub fn add<H, T>(mut self, route: RouteName, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        let mut endpoint = on(route.method_filter(), handler);
        if route.requires_auth() {
            // Only the matched method is wrapped; other methods still get 405.
            endpoint =
                endpoint.route_layer(from_fn_with_state(self.state.clone(), session_middleware));
        }
        self.router = self.router.route(route.template(), endpoint);
        self.registered.push(route);
        self
    }

    /// Routes of the table which have no handler.
    fn unregistered(&self) -> impl Iterator<Item = RouteName> + '_ {
        RouteName::ALL
            .into_iter()
            .filter(|route| !self.registered.contains(route))
    }
}

/// Every route group's registration function.
const GROUPS: [fn(RouteTable) -> RouteTable; 5] = [
    root::register,
    health::register,
    shop::register,
    auth::register,
    openai::register,
];

fn route_table(state: &AppState) -> RouteTable {
    GROUPS
        .into_iter()
        .fold(RouteTable::new(state), |table, register| register(table))
}

/// Build the application router from every route group.
pub fn create_router(state: AppState) -> Router {
    let table = route_table(&state);
    for route in table.unregistered() {
        warn!(route = route.name(), "Named route has no handler");
    }
    table
        .router
        .layer(from_fn(log_requests))
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod tests {
    use core::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt as _;

    use super::*;
    use crate::{
        cache, db,
        routes::names::{url_for, RouteName},
        services::openai,
    };

    const NOWHERE: &str = "127.0.0.1:1";

    /// State whose stores point at a closed port, so every storage call
    /// fails fast.
    pub(crate) fn unreachable_state() -> AppState {
        let timeout = Duration::from_millis(250);
        let db_url = format!("postgres://minishop:minishop@{NOWHERE}/minishop");
        AppState {
            db: db::connect_lazy(&db_url, timeout).unwrap(),
            cache: cache::connect_lazy(&format!("redis://{NOWHERE}"), timeout).unwrap(),
            openai: openai::Client::new(
                &format!("http://{NOWHERE}/v1"),
                Some(String::from("sk-test")),
                "gpt-4o-mini",
                timeout,
            )
            .unwrap(),
        }
    }

    /// A concrete URI for a route, with sample parameter values.
    fn sample_uri(route: RouteName) -> String {
        url_for(
            route,
            &[
                ("slug", "bottega"),
                ("prodotto", "6f1c2a8e-3b5d-4c1e-9a7f-2d4b6c8e0a1b"),
                ("ordine", "0a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d"),
            ],
        )
        .unwrap()
    }

    fn request(route: RouteName) -> Request<Body> {
        Request::builder()
            .method(route.method())
            .uri(sample_uri(route))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_unreachable_stores() {
        let app = create_router(unreachable_state());
        let response = app.oneshot(request(RouteName::Health)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["status"], "unhealthy");
        assert!(body["error"].as_str().is_some_and(|error| !error.is_empty()));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn authenticated_routes_reject_anonymous_requests() {
        let state = unreachable_state();
        for route in RouteName::ALL.into_iter().filter(|route| route.requires_auth()) {
            let response = create_router(state.clone())
                .oneshot(request(route))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", route.name());
            let body = json_body(response).await;
            assert_eq!(body["message"], "Unauthenticated.");
        }
    }

    #[tokio::test]
    async fn malformed_session_cookies_are_unauthenticated() {
        let request = Request::builder()
            .uri(sample_uri(RouteName::OpenAiModels))
            .header(header::COOKIE, "session=not-a-token")
            .body(Body::empty())
            .unwrap();
        let response = create_router(unreachable_state())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn shop_routes_need_no_session() {
        let state = unreachable_state();
        let shop_routes = RouteName::ALL
            .into_iter()
            .filter(|route| route.template().starts_with("/shop/"));
        for route in shop_routes {
            let response = create_router(state.clone())
                .oneshot(request(route))
                .await
                .unwrap();
            assert_ne!(response.status(), StatusCode::UNAUTHORIZED, "{}", route.name());
            assert_ne!(response.status(), StatusCode::NOT_FOUND, "{}", route.name());
            assert_ne!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", route.name());
        }
    }

    #[tokio::test]
    async fn every_named_route_has_a_handler() {
        let table = route_table(&unreachable_state());
        assert_eq!(table.unregistered().count(), 0);
        assert_eq!(table.registered.len(), RouteName::ALL.len());
    }

    #[tokio::test]
    async fn every_route_answers_its_own_method_only() {
        let state = unreachable_state();
        for route in RouteName::ALL {
            let response = create_router(state.clone())
                .oneshot(request(route))
                .await
                .unwrap();
            assert_ne!(response.status(), StatusCode::NOT_FOUND, "{}", route.name());
            assert_ne!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", route.name());

            let wrong_method = Request::builder()
                .method(axum::http::Method::DELETE)
                .uri(sample_uri(route))
                .body(Body::empty())
                .unwrap();
            let response = create_router(state.clone())
                .oneshot(wrong_method)
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", route.name());
        }
    }

    #[tokio::test]
    async fn malformed_product_ids_are_json_bad_requests() {
        let request = Request::builder()
            .uri("/shop/bottega/prodotto/not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = create_router(unreachable_state())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["message"]
            .as_str()
            .is_some_and(|message| message.contains("prodotto")));
    }

    #[tokio::test]
    async fn malformed_checkout_bodies_are_json_unprocessable() {
        let request = Request::builder()
            .method(RouteName::ShopCheckoutProcess.method())
            .uri(sample_uri(RouteName::ShopCheckoutProcess))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"customer_name": 5}"#))
            .unwrap();
        let response = create_router(unreachable_state())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["message"].as_str().is_some_and(|message| !message.is_empty()));
    }

    #[tokio::test]
    async fn malformed_price_filters_are_json_bad_requests() {
        let request = Request::builder()
            .uri("/shop/bottega?min_price=cheap")
            .body(Body::empty())
            .unwrap();
        let response = create_router(unreachable_state())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["message"].is_string());
    }

    #[tokio::test]
    async fn home_serves_the_welcome_page() {
        let response = create_router(unreachable_state())
            .oneshot(request(RouteName::Home))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        assert!(content_type.is_some_and(|value| value.as_bytes().starts_with(b"text/html")));
    }
}
