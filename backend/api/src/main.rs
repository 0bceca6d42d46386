//! The minishop API server: public storefronts with guest carts and checkout,
//! plus an authenticated wrapper around a text generation provider.
mod cache;
mod constants;
mod db;
mod middleware;
mod routes;
mod services;
mod state;
mod utils;

use core::future::Future;
use std::io;

use clap::{Parser, Subcommand};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{
    constants::{
        api::{API_BIND_ADDRESS, DEFAULT_LOG_FILTER},
        db::{MIGRATION_RETRY_MAX, MIGRATION_RETRY_MIN},
    },
    routes::names::{url_for, RouteName},
    services::{auth, openai},
    state::AppState,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (the default).
    Serve,
    /// Create a user who may call the authenticated API.
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, env = "MINISHOP_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print every named route with its method and path.
    Routes,
    /// Print the path of a named route, e.g. `url shop.index slug=bottega`.
    Url {
        name: String,
        #[arg(value_parser = parse_parameter)]
        params: Vec<(String, String)>,
    },
}

/// Split a `key=value` route parameter.
fn parse_parameter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("{raw:?} is not of the form key=value"))
}

/// One line per named route: method, path template, name and auth marker.
fn route_list() -> Vec<String> {
    RouteName::ALL
        .into_iter()
        .map(|route| {
            let auth = if route.requires_auth() { "auth" } else { "" };
            format!(
                "{:<5} {:<34} {:<24} {auth}",
                route.method().as_str(),
                route.template(),
                route.name()
            )
            .trim_end()
            .to_owned()
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn core::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(fmt::layer())
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::CreateUser {
            email,
            name,
            password,
        } => {
            let db = db::connect()?;
            db::migrate(&db).await?;
            let user = auth::create_user(&email, &name, &password, &db).await?;
            info!(user_id = %user.id(), email = user.email(), "Created user");
            Ok(())
        }
        Command::Routes => {
            for line in route_list() {
                println!("{line}");
            }
            Ok(())
        }
        Command::Url { name, params } => {
            let route =
                RouteName::from_name(&name).ok_or_else(|| format!("Unknown route {name:?}"))?;
            let params: Vec<(&str, &str)> = params
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect();
            println!("{}", url_for(route, &params)?);
            Ok(())
        }
    }
}

async fn serve() -> Result<(), Box<dyn core::error::Error>> {
    let openai = openai::Client::from_env()?;
    if !openai.is_configured() {
        warn!("OPENAI_API_KEY is not set, /api/openai routes will answer 503");
    }
    let state = AppState {
        db: db::connect()?,
        cache: cache::connect()?,
        openai,
    };
    let listener = TcpListener::bind(API_BIND_ADDRESS.as_str()).await?;
    run(listener, state, shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

/// Serve the API on `listener` until `shutdown` resolves. Migrations are
/// applied in the background, so a database outage at start-up leaves the
/// server up and `/health` answering 503.
async fn run(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> io::Result<()> {
    let migrations = tokio::spawn(db::migrate_with_retry(
        state.db.clone(),
        MIGRATION_RETRY_MIN,
        MIGRATION_RETRY_MAX,
    ));
    let app = routes::create_router(state);
    info!(address = %listener.local_addr()?, "Listening");
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;
    migrations.abort();
    served
}

/// Resolve once SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            core::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
                core::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::unreachable_state;

    #[tokio::test]
    async fn server_starts_and_reports_503_while_the_database_is_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server = tokio::spawn(run(
            listener,
            unreachable_state(),
            core::future::pending::<()>(),
        ));
        let response = reqwest::get(format!("http://{address}/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "unhealthy");
        assert!(!server.is_finished());
        server.abort();
    }

    #[test]
    fn route_parameters_are_key_value_pairs() {
        assert_eq!(
            parse_parameter("slug=bottega"),
            Ok((String::from("slug"), String::from("bottega")))
        );
        assert!(parse_parameter("bottega").is_err());
    }

    #[test]
    fn route_list_marks_authenticated_routes() {
        let lines = route_list();
        assert_eq!(lines.len(), RouteName::ALL.len());
        let models = lines
            .iter()
            .find(|line| line.contains("openai.models"))
            .unwrap();
        assert!(models.starts_with("GET"));
        assert!(models.ends_with("auth"));
        let checkout = lines
            .iter()
            .find(|line| line.contains("shop.checkout.processa"))
            .unwrap();
        assert!(checkout.starts_with("POST"));
        assert!(!checkout.ends_with("auth"));
    }
}
