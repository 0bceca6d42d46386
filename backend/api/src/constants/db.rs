//! Database connection related constants.
use core::time::Duration;
use std::{env::var, sync::LazyLock};

use super::secrets::read_secret;

pub static DB_HOST: LazyLock<String> =
    LazyLock::new(|| var("DB_HOST").expect("DB_HOST not provided in environment variables"));

pub static DB_USERNAME: LazyLock<String> = LazyLock::new(|| {
    var("DB_USERNAME").expect("DB_USERNAME not provided in environment variables")
});

pub static DB_DATABASE: LazyLock<String> = LazyLock::new(|| {
    var("DB_DATABASE").expect("DB_DATABASE not provided in environment variables")
});

pub static DB_PASSWORD: LazyLock<String> = LazyLock::new(|| {
    var("DB_PASSWORD").unwrap_or_else(|_| {
        let secret_path = var("DB_PASSWORD_DOCKER_SECRET").expect(
            "Neither DB_PASSWORD nor DB_PASSWORD_DOCKER_SECRET provided in environment variables",
        );
        read_secret(&secret_path).expect("Failed to read DB_PASSWORD docker secret")
    })
});

pub static DB_URL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "postgres://{}:{}@{}/{}",
        *DB_USERNAME, *DB_PASSWORD, *DB_HOST, *DB_DATABASE
    )
});

/// How long a request waits for a pooled connection before giving up. Also
/// bounds how long the health check can take to report an outage.
pub static DB_ACQUIRE_TIMEOUT: LazyLock<Duration> = LazyLock::new(|| {
    Duration::from_millis(
        var("DB_ACQUIRE_TIMEOUT_MS")
            .map(|millis| {
                millis
                    .parse()
                    .expect("DB_ACQUIRE_TIMEOUT_MS is not a valid number of milliseconds")
            })
            .unwrap_or(3000),
    )
});

/// First delay before retrying migrations which failed at start-up.
pub const MIGRATION_RETRY_MIN: Duration = Duration::from_secs(1);
/// Ceiling of the doubling delay between migration attempts.
pub const MIGRATION_RETRY_MAX: Duration = Duration::from_secs(30);
