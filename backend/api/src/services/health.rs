//! Readiness checks against the stores the API depends on.
use serde::Serialize;
use time::OffsetDateTime;

use crate::{cache, db};

/// A dependency whose connectivity can be checked.
pub trait Dependency {
    /// Succeeds when the dependency answered.
    async fn check(&self) -> Result<(), errors::DependencyError>;
}

impl Dependency for db::ConnectionPool {
    async fn check(&self) -> Result<(), errors::DependencyError> {
        Ok(db::ping(self).await?)
    }
}

impl Dependency for cache::Pool {
    async fn check(&self) -> Result<(), errors::DependencyError> {
        Ok(cache::ping(self).await?)
    }
}

/// Per-dependency results, only reported when everything is up.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct ServiceStatuses {
    pub database: &'static str,
    pub redis: &'static str,
}

/// The outcome of a health check, serialized as the response body.
#[derive(Serialize, Debug)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HealthReport {
    Healthy {
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
        services: ServiceStatuses,
    },
    Unhealthy {
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
        error: String,
    },
}

impl HealthReport {
    pub const fn is_healthy(&self) -> bool {
        matches!(*self, Self::Healthy { .. })
    }
}

/// Check the database, then the cache. The first failure ends the check and
/// its message is reported.
pub async fn check(database: &impl Dependency, cache: &impl Dependency) -> HealthReport {
    let outcome = match database.check().await {
        Ok(()) => cache.check().await,
        Err(err) => Err(err),
    };
    let timestamp = OffsetDateTime::now_utc();
    match outcome {
        Ok(()) => HealthReport::Healthy {
            timestamp,
            services: ServiceStatuses {
                database: "ok",
                redis: "ok",
            },
        },
        Err(err) => {
            let mut error = err.to_string();
            if error.is_empty() {
                error = String::from(err.dependency()) + " check failed";
            }
            HealthReport::Unhealthy { timestamp, error }
        }
    }
}

pub mod errors {
    use thiserror::Error;

    use crate::{cache::errors::CacheError, db::errors::DatabaseError};

    #[derive(Error, Debug)]
    pub enum DependencyError {
        #[error(transparent)]
        Database(#[from] DatabaseError),
        #[error(transparent)]
        Cache(#[from] CacheError),
    }

    impl DependencyError {
        /// The name of the dependency which failed.
        pub const fn dependency(&self) -> &'static str {
            match *self {
                Self::Database(_) => "database",
                Self::Cache(_) => "redis",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::db::errors::DatabaseError;

    /// A stand-in dependency which records whether it was asked.
    struct FakeDependency {
        up: bool,
        checked: AtomicBool,
    }

    impl FakeDependency {
        const fn new(up: bool) -> Self {
            Self {
                up,
                checked: AtomicBool::new(false),
            }
        }
        fn was_checked(&self) -> bool {
            self.checked.load(Ordering::SeqCst)
        }
    }

    impl Dependency for FakeDependency {
        async fn check(&self) -> Result<(), errors::DependencyError> {
            self.checked.store(true, Ordering::SeqCst);
            if self.up {
                Ok(())
            } else {
                Err(DatabaseError::from(sqlx::Error::PoolTimedOut).into())
            }
        }
    }

    #[tokio::test]
    async fn healthy_when_both_dependencies_answer() {
        let report = check(&FakeDependency::new(true), &FakeDependency::new(true)).await;
        assert!(report.is_healthy());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["services"]["database"], "ok");
        assert_eq!(json["services"]["redis"], "ok");
        assert!(json["timestamp"].as_str().is_some_and(|ts| !ts.is_empty()));
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn database_failure_skips_the_cache_check() {
        let cache = FakeDependency::new(true);
        let report = check(&FakeDependency::new(false), &cache).await;
        assert!(!report.is_healthy());
        assert!(!cache.was_checked());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert!(json["error"].as_str().is_some_and(|error| !error.is_empty()));
        assert!(json.get("services").is_none());
    }

    #[tokio::test]
    async fn cache_failure_is_unhealthy() {
        let database = FakeDependency::new(true);
        let report = check(&database, &FakeDependency::new(false)).await;
        assert!(database.was_checked());
        assert!(!report.is_healthy());
    }
}
