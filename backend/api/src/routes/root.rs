//! The landing page served at `/`.
use axum::response::Html;

use crate::routes::{names::RouteName, RouteTable};

const WELCOME_PAGE: &str = r#"<!DOCTYPE html>
<html lang="it">
<head>
    <meta charset="utf-8">
    <title>Minishop</title>
</head>
<body>
    <h1>Minishop</h1>
    <p>The shop API is running. Storefronts live under <code>/shop/{slug}</code>.</p>
</body>
</html>
"#;

pub fn register(routes: RouteTable) -> RouteTable {
    routes.add(RouteName::Home, welcome)
}

async fn welcome() -> Html<&'static str> {
    Html(WELCOME_PAGE)
}
