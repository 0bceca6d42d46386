//! Routes under /api/openai wrapping the text generation provider. Every
//! route needs an authenticated session.
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    routes::{names::RouteName, RouteTable},
    services::openai::{errors::OpenAiError, ChatRequest, GenerateRequest, Message, Usage},
    state::AppState,
};

/// Register the /api/openai routes.
pub fn register(routes: RouteTable) -> RouteTable {
    routes
        .add(RouteName::OpenAiGenerate, generate)
        .add(RouteName::OpenAiChat, chat)
        .add(RouteName::OpenAiModels, models)
        .add(RouteName::OpenAiTest, test_connection)
}

type RequestBody<T> = WithRejection<Json<T>, ProviderFailure>;

/// A failed call, answered as `{"success": false, "message": ...}`.
#[derive(Debug)]
struct ProviderFailure {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ProviderFailure {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({"success": false, "message": self.message})),
        )
            .into_response()
    }
}

impl From<OpenAiError> for ProviderFailure {
    fn from(error: OpenAiError) -> Self {
        let status = match error {
            OpenAiError::NotConfigured => {
                warn!("Text generation requested but no API key is configured");
                StatusCode::SERVICE_UNAVAILABLE
            }
            OpenAiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OpenAiError::Transport(ref err) => {
                error!(error = %err, "Failed to call the text generation provider");
                StatusCode::BAD_GATEWAY
            }
            OpenAiError::Upstream { status, .. } => {
                error!(%status, "Text generation provider returned an error");
                StatusCode::BAD_GATEWAY
            }
            OpenAiError::EmptyResponse => {
                error!("Text generation provider returned no choices");
                StatusCode::BAD_GATEWAY
            }
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl From<JsonRejection> for ProviderFailure {
    fn from(rejection: JsonRejection) -> Self {
        info!(error = %rejection.body_text(), "Rejected text generation request body");
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

#[derive(Serialize)]
struct GenerateResponse {
    success: bool,
    text: String,
    model: String,
    usage: Usage,
}

async fn generate(
    State(state): State<AppState>,
    WithRejection(Json(body), _): RequestBody<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ProviderFailure> {
    let completion = state.openai.generate(body).await?;
    Ok(Json(GenerateResponse {
        success: true,
        text: completion.message.content,
        model: completion.model,
        usage: completion.usage,
    }))
}

#[derive(Serialize)]
struct ChatResponse {
    success: bool,
    message: Message,
    model: String,
    usage: Usage,
}

async fn chat(
    State(state): State<AppState>,
    WithRejection(Json(body), _): RequestBody<ChatRequest>,
) -> Result<Json<ChatResponse>, ProviderFailure> {
    let completion = state.openai.chat(&body).await?;
    Ok(Json(ChatResponse {
        success: true,
        message: completion.message,
        model: completion.model,
        usage: completion.usage,
    }))
}

#[derive(Serialize)]
struct ModelsResponse {
    success: bool,
    models: Vec<String>,
}

async fn models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, ProviderFailure> {
    Ok(Json(ModelsResponse {
        success: true,
        models: state.openai.list_models().await?,
    }))
}

#[derive(Serialize)]
struct ConnectionTestResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_count: Option<usize>,
}

/// Check the provider answers with the configured key.
async fn test_connection(
    State(state): State<AppState>,
) -> (StatusCode, Json<ConnectionTestResponse>) {
    match state.openai.list_models().await {
        Ok(models) => (
            StatusCode::OK,
            Json(ConnectionTestResponse {
                success: true,
                message: String::from("Connection to the provider succeeded"),
                model_count: Some(models.len()),
            }),
        ),
        Err(err) => {
            let failure = ProviderFailure::from(err);
            (
                failure.status,
                Json(ConnectionTestResponse {
                    success: false,
                    message: failure.message,
                    model_count: None,
                }),
            )
        }
    }
}
