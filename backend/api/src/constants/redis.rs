//! Redis connection related constants.
use core::time::Duration;
use std::{env::var, sync::LazyLock};

/// The hostname where the Redis cart and session store can be found.
pub static REDIS_HOST: LazyLock<String> =
    LazyLock::new(|| var("REDIS_HOST").expect("REDIS_HOST not provided in environment variables"));

/// The port Redis listens on.
pub static REDIS_PORT: LazyLock<u16> = LazyLock::new(|| {
    var("REDIS_PORT")
        .map(|port| port.parse().expect("REDIS_PORT is not a valid port number"))
        .unwrap_or(6379)
});

pub static REDIS_URL: LazyLock<String> =
    LazyLock::new(|| format!("redis://{}:{}/", *REDIS_HOST, *REDIS_PORT));

/// Upper bound on waiting for, and creating, a pooled Redis connection.
pub const REDIS_TIMEOUT: Duration = Duration::from_secs(3);
