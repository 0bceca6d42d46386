//! Configuration of the upstream text-generation provider.
use core::time::Duration;
use std::{env::var, sync::LazyLock};

use super::secrets::read_secret;

/// The API key used as a bearer token. Absent means the wrapper routes answer
/// 503 instead of calling out.
pub static OPENAI_API_KEY: LazyLock<Option<String>> = LazyLock::new(|| {
    var("OPENAI_API_KEY").ok().or_else(|| {
        var("OPENAI_API_KEY_DOCKER_SECRET").ok().map(|secret_path| {
            read_secret(&secret_path)
                .expect("Failed to read OPENAI_API_KEY docker secret")
                .trim()
                .to_owned()
        })
    })
});

/// Base URL of the OpenAI-compatible API, without a trailing slash.
pub static OPENAI_BASE_URL: LazyLock<String> = LazyLock::new(|| {
    var("OPENAI_BASE_URL")
        .map(|url| url.trim_end_matches('/').to_owned())
        .unwrap_or_else(|_| String::from("https://api.openai.com/v1"))
});

/// The model used when a request does not name one.
pub static OPENAI_DEFAULT_MODEL: LazyLock<String> = LazyLock::new(|| {
    var("OPENAI_DEFAULT_MODEL").unwrap_or_else(|_| String::from("gpt-4o-mini"))
});

/// Timeout for a whole upstream request.
pub static OPENAI_TIMEOUT: LazyLock<Duration> = LazyLock::new(|| {
    Duration::from_secs(
        var("OPENAI_TIMEOUT_SECS")
            .map(|secs| {
                secs.parse()
                    .expect("OPENAI_TIMEOUT_SECS is not a valid number of seconds")
            })
            .unwrap_or(30),
    )
});
