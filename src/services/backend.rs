// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend REST transport.
//!
//! Handles:
//! - Request description and fingerprinting
//! - Raw request execution with optional bearer auth
//! - Status/body checking and error categorization
//! - The login endpoint

use crate::config::LOGIN_ENDPOINT;
use crate::error::ApiError;
use crate::middleware::busy::BusyHandle;
use crate::models::user::id_as_string;
use crate::models::{Credentials, Envelope};
use crate::ui::BusyIndicator;
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

/// An outbound backend request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, or an absolute URL
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            path: path.into(),
            body,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, None)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path, Some(body))
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path, Some(body))
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path, Some(body))
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path, None)
    }

    /// Resolve the request URL against the API base URL.
    pub fn url(&self, base_url: &str) -> String {
        if self.path.starts_with("http://") || self.path.starts_with("https://") {
            return self.path.clone();
        }
        let base = base_url.trim_end_matches('/');
        if self.path.starts_with('/') {
            format!("{}{}", base, self.path)
        } else {
            format!("{}/{}", base, self.path)
        }
    }

    /// Deterministic identity of this request: method, URL and canonical body,
    /// hashed to a fixed-size hex key.
    pub fn fingerprint(&self, base_url: &str) -> String {
        let mut material = format!("{} {}", self.method, self.url(base_url));
        if let Some(body) = &self.body {
            material.push(' ');
            write_canonical(body, &mut material);
        }
        hex::encode(Sha256::digest(material.as_bytes()))
    }

    /// Mutating verbs and upload/create endpoints get a busy indicator.
    pub fn is_long_running(&self) -> bool {
        let mutating = matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        );
        let path = self.path.to_lowercase();
        mutating || path.contains("upload") || path.contains("create")
    }

    /// Requests to the login endpoint never clear the session on 401/403.
    pub fn is_login(&self) -> bool {
        self.path
            .split('?')
            .next()
            .is_some_and(|p| p.trim_end_matches('/').ends_with(LOGIN_ENDPOINT))
    }
}

/// JSON serialization with object keys sorted at every level.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => {
            let _ = write!(out, "{}", scalar);
        }
    }
}

/// A successful backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// Deserialize the raw body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| ApiError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    /// Deserialize the body as a standard envelope and unwrap its payload.
    pub fn envelope<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Envelope::from_value(self.body.clone())?.into_result()
    }
}

/// Build the shared HTTP client.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::Network(format!("HTTP client init failed: {}", e)))
}

/// Execute a request once, with no deduplication or session side effects.
pub async fn execute(
    http: &reqwest::Client,
    base_url: &str,
    request: &ApiRequest,
    token: Option<&str>,
) -> Result<ApiResponse, ApiError> {
    let mut builder = http.request(request.method.clone(), request.url(base_url));
    if let Some(token) = token {
        builder = builder.bearer_auth(token);
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| ApiError::from_transport(&e))?;

    check_response(response).await
}

/// Check response status, parse the body and categorize failures.
async fn check_response(response: reqwest::Response) -> Result<ApiResponse, ApiError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::from_transport(&e))?;

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    if status.is_success() {
        return Ok(ApiResponse {
            status: status.as_u16(),
            body,
        });
    }

    if status.as_u16() == 429 {
        tracing::warn!("Backend rate limit hit (429)");
    }

    Err(ApiError::from_status(status.as_u16(), backend_message(&body)))
}

/// Pull a human-readable message out of an error body, if the backend sent one.
fn backend_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

// ─────────────────────────────────────────────────────────────────────────────
// Login endpoint
// ─────────────────────────────────────────────────────────────────────────────

/// User object returned alongside the login token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginUser {
    pub email: Option<String>,
    #[serde(
        default,
        alias = "_id",
        alias = "userId",
        deserialize_with = "id_as_string"
    )]
    pub id: Option<String>,
}

/// Payload of a successful login envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    pub token: String,
    pub role: Option<String>,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

/// Authentication endpoint used by the session store.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginPayload, ApiError>;
}

/// Login over HTTP against `{base_url}/auth/login`.
#[derive(Clone)]
pub struct HttpAuthBackend {
    http: reqwest::Client,
    base_url: String,
    busy: Option<(Arc<dyn BusyIndicator>, Duration)>,
}

impl HttpAuthBackend {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            busy: None,
        }
    }

    /// Show `indicator` while the login POST is in flight, like any other
    /// mutating request.
    pub fn with_busy(mut self, indicator: Arc<dyn BusyIndicator>, safety_timeout: Duration) -> Self {
        self.busy = Some((indicator, safety_timeout));
        self
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginPayload, ApiError> {
        let body = serde_json::to_value(credentials)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        let request = ApiRequest::post(LOGIN_ENDPOINT, body);

        let busy = self
            .busy
            .as_ref()
            .map(|(indicator, timeout)| BusyHandle::present(indicator.clone(), *timeout));
        let result = execute(&self.http, &self.base_url, &request, None).await;
        if let Some(busy) = busy {
            busy.finish();
        }

        result?.envelope()
    }
}
