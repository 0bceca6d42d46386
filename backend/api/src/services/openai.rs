//! A small client for an OpenAI-compatible chat completions API.
use core::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::openai as constants;

/// Who authored a chat message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Token accounting reported by the provider.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// A single prompt, optionally preceded by a system instruction.
#[derive(Deserialize, Debug, Default)]
pub struct GenerateRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system: Option<String>,
}

/// A whole conversation to be continued by the model.
#[derive(Deserialize, Debug, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    fn into_chat(self) -> Result<ChatRequest, errors::OpenAiError> {
        if self.prompt.trim().is_empty() {
            return Err(errors::OpenAiError::InvalidRequest(
                "The prompt must not be empty".to_owned(),
            ));
        }
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system.filter(|system| !system.trim().is_empty()) {
            messages.push(Message {
                role: Role::System,
                content: system,
            });
        }
        messages.push(Message {
            role: Role::User,
            content: self.prompt,
        });
        Ok(ChatRequest {
            messages,
            model: self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        })
    }
}

impl ChatRequest {
    fn validate(&self) -> Result<(), errors::OpenAiError> {
        let invalid = |reason: &str| Err(errors::OpenAiError::InvalidRequest(reason.to_owned()));
        if self.messages.is_empty() {
            return invalid("At least one message is required");
        }
        if self.messages.iter().any(|message| message.content.is_empty()) {
            return invalid("Message content must not be empty");
        }
        if self
            .temperature
            .is_some_and(|temperature| !(0.0..=2.0).contains(&temperature))
        {
            return invalid("The temperature must be between 0 and 2");
        }
        if self.max_tokens == Some(0) {
            return invalid("max_tokens must be at least 1");
        }
        Ok(())
    }
}

/// The model's reply to a chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub message: Message,
    pub model: String,
    pub usage: Usage,
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<Model>,
}

#[derive(Deserialize)]
struct Model {
    id: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Connection details for the provider. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    default_model: String,
}

impl Client {
    /// Build a client. A `None` key leaves the client unconfigured; every
    /// call then fails with [`errors::OpenAiError::NotConfigured`].
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        default_model: &str,
        timeout: Duration,
    ) -> Result<Self, errors::OpenAiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.filter(|key| !key.is_empty()),
            default_model: default_model.to_owned(),
        })
    }

    /// Build the application's client from the environment configuration.
    pub fn from_env() -> Result<Self, errors::OpenAiError> {
        Self::new(
            &constants::OPENAI_BASE_URL,
            constants::OPENAI_API_KEY.clone(),
            &constants::OPENAI_DEFAULT_MODEL,
            *constants::OPENAI_TIMEOUT,
        )
    }

    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, errors::OpenAiError> {
        self.api_key
            .as_deref()
            .ok_or(errors::OpenAiError::NotConfigured)
    }

    /// Complete a single prompt.
    pub async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<Completion, errors::OpenAiError> {
        self.chat(&request.into_chat()?).await
    }

    /// Continue a conversation.
    pub async fn chat(&self, request: &ChatRequest) -> Result<Completion, errors::OpenAiError> {
        request.validate()?;
        let api_key = self.api_key()?;
        let body = CompletionBody {
            model: request.model.as_deref().unwrap_or(&self.default_model),
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let completion: CompletionResponse = read_json(response).await?;
        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(errors::OpenAiError::EmptyResponse)?;
        Ok(Completion {
            message,
            model: completion.model,
            usage: completion.usage,
        })
    }

    /// The ids of every model the key can use, sorted.
    pub async fn list_models(&self) -> Result<Vec<String>, errors::OpenAiError> {
        let api_key = self.api_key()?;
        let response = self
            .http
            .get(format!("{}/models", self.base_url))
            .bearer_auth(api_key)
            .send()
            .await?;
        let list: ModelList = read_json(response).await?;
        let mut models: Vec<String> = list.data.into_iter().map(|model| model.id).collect();
        models.sort_unstable();
        Ok(models)
    }
}

/// Decode a successful response, or turn a failed one into an upstream
/// error carrying the provider's message when it sent one.
async fn read_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, errors::OpenAiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Upstream request failed")
                .to_owned()
        });
    warn!(%status, %message, "Provider rejected request");
    Err(errors::OpenAiError::Upstream { status, message })
}

pub mod errors {
    use reqwest::StatusCode;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum OpenAiError {
        #[error("No API key is configured for the text generation provider")]
        NotConfigured,
        #[error("{0}")]
        InvalidRequest(String),
        #[error("Could not reach the provider: {0}")]
        Transport(#[from] reqwest::Error),
        #[error("{message}")]
        Upstream { status: StatusCode, message: String },
        #[error("The provider returned no choices")]
        EmptyResponse,
    }
}
