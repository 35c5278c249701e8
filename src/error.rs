// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types with consistent user-facing messages.
//!
//! Transport failures are categorized exactly once, in
//! [`ApiError::from_status`] / [`ApiError::from_transport`]. Callers react to
//! the category and [`ApiError::user_message`], never to raw status codes.


/// Categorized backend/transport error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Authentication,

    #[error("Permission denied")]
    Authorization,

    #[error("Rate limited")]
    RateLimited,

    #[error("Server error (HTTP {0})")]
    Server(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request rejected (HTTP {status})")]
    Validation {
        status: u16,
        message: Option<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub const SESSION_EXPIRED_MESSAGE: &'static str =
        "Your session has expired. Please sign in again.";
    pub const FORBIDDEN_MESSAGE: &'static str = "You do not have permission to do that.";
    pub const RATE_LIMIT_MESSAGE: &'static str = "Too many requests. Please wait and try again.";
    pub const SERVER_MESSAGE: &'static str = "Server error, please try again later.";
    pub const NETWORK_MESSAGE: &'static str = "Check your connection and try again.";
    pub const FALLBACK_MESSAGE: &'static str = "The request could not be completed.";

    /// Map a non-success HTTP status (and optional backend message) to a category.
    ///
    /// Status 0 is how a transport that never reached the server reports itself.
    pub fn from_status(status: u16, backend_message: Option<String>) -> Self {
        match status {
            0 => ApiError::Network("no response from server".to_string()),
            401 => ApiError::Authentication,
            403 => ApiError::Authorization,
            429 => ApiError::RateLimited,
            500..=599 => ApiError::Server(status),
            _ => ApiError::Validation {
                status,
                message: backend_message,
            },
        }
    }

    /// Map a `reqwest` transport failure.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16(), None);
        }
        if err.is_decode() {
            return ApiError::InvalidResponse(err.to_string());
        }
        ApiError::Network(err.to_string())
    }

    /// Human-readable message for toasts/alerts.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Authentication => Self::SESSION_EXPIRED_MESSAGE.to_string(),
            ApiError::Authorization => Self::FORBIDDEN_MESSAGE.to_string(),
            ApiError::RateLimited => Self::RATE_LIMIT_MESSAGE.to_string(),
            ApiError::Server(_) => Self::SERVER_MESSAGE.to_string(),
            ApiError::Network(_) => Self::NETWORK_MESSAGE.to_string(),
            ApiError::Validation { message, .. } => message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| Self::FALLBACK_MESSAGE.to_string()),
            ApiError::InvalidResponse(_) => Self::FALLBACK_MESSAGE.to_string(),
        }
    }

    /// Whether the session must be cleared (401 and 403 alike).
    pub fn clears_session(&self) -> bool {
        matches!(self, ApiError::Authentication | ApiError::Authorization)
    }

    /// Whether a bounded retry may help. Rate limiting is deliberately excluded.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Server(_))
    }
}

/// Login failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Login rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    pub const INVALID_CREDENTIALS_MESSAGE: &'static str = "Incorrect email or password.";

    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => Self::INVALID_CREDENTIALS_MESSAGE.to_string(),
            AuthError::Rejected(msg) => msg.clone(),
            AuthError::Api(err) => err.user_message(),
        }
    }
}

/// Durable storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage could not be opened: {0}")]
    Init(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Storage not opened")]
    NotOpen,
}

/// Bearer token decode failures.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),
}
