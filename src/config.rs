// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Route the guards and interceptor redirect to when a session is missing.
pub const LOGIN_ROUTE: &str = "/auth/login";

/// Backend path of the login endpoint, relative to the API base URL.
pub const LOGIN_ENDPOINT: &str = "/auth/login";

/// Durable storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, without trailing slash
    pub api_base_url: String,
    /// Location of the durable session file
    pub session_store_path: PathBuf,
    /// Hard safety timeout for the busy indicator
    pub busy_timeout: Duration,
    /// Per-request timeout handed to the HTTP client
    pub request_timeout: Duration,
    /// Attempts made by `send_with_retry` before giving up
    pub retry_max_attempts: u32,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:9".to_string(),
            session_store_path: env::temp_dir().join("dispatch-client-test-session.json"),
            busy_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(5),
            retry_max_attempts: 3,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("API_BASE_URL")
            .map_err(|_| ConfigError::Missing("API_BASE_URL"))?
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid("API_BASE_URL", api_base_url));
        }

        Ok(Self {
            api_base_url,
            session_store_path: env::var("SESSION_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".dispatch/session.json")),
            busy_timeout: Duration::from_secs(parse_or("BUSY_TIMEOUT_SECS", 5)?),
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 30)?),
            retry_max_attempts: parse_or("RETRY_MAX_ATTEMPTS", 3)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
