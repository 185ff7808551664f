use anyhow::{Context, Result};
use std::time::Duration;

/// Fixed page size for all paginated list endpoints.
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Server
    pub port: u16,

    // Auth: static bearer token checked by the middleware.
    // When unset, authentication is disabled (local dev / tests).
    pub api_token: Option<String>,

    // Export cache
    pub cache_ttl: Duration,

    // Upper bound on a single store query during an export fill
    pub store_timeout: Duration,

    // Upper bound on a whole request
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL not set")?,

            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            api_token: std::env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),

            cache_ttl: Duration::from_secs(
                std::env::var("CACHE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(24 * 60 * 60),
            ),

            store_timeout: Duration::from_secs(
                std::env::var("STORE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            ),

            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
        })
    }

    /// Config suitable for tests: in-memory store, auth disabled.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 0,
            api_token: None,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            store_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}
