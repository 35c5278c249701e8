// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store: the single owner of "who is logged in, with what token".
//!
//! State is published through `tokio::sync::watch` channels. Everything else
//! reads it through the accessors here; nothing outside this module mutates it.
//!
//! Storage and token problems never escape as errors. A store that cannot be
//! opened, or a token that is expired or undecodable, simply means "logged
//! out", and `open()` always ends with the store marked ready.

use crate::config::TOKEN_KEY;
use crate::db::KeyValueStore;
use crate::error::{ApiError, AuthError};
use crate::models::{Credentials, Role, Session, UserIdentity};
use crate::services::backend::AuthBackend;
use crate::services::token_codec::{decode_claims, is_expired};
use crate::time_utils::{format_unix_rfc3339, unix_now};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, OnceCell};
use tokio::task::JoinHandle;

/// Process-wide session state with an explicit lifecycle.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    backend: Arc<dyn AuthBackend>,
    state: Arc<watch::Sender<Session>>,
    ready: watch::Sender<bool>,
    opened: OnceCell<()>,
    /// Purges the published session when its token expires.
    expiry_timer: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, backend: Arc<dyn AuthBackend>) -> Self {
        let (state, _) = watch::channel(Session::anonymous());
        let (ready, _) = watch::channel(false);
        Self {
            storage,
            backend,
            state: Arc::new(state),
            ready,
            opened: OnceCell::new(),
            expiry_timer: Mutex::new(None),
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Open durable storage and recover a persisted session.
    ///
    /// Idempotent: concurrent and repeated calls share one initialization.
    /// Always leaves the store ready, whatever happened.
    pub async fn open(&self) {
        self.opened
            .get_or_init(|| async {
                self.restore().await;
                self.ready.send_replace(true);
                tracing::debug!(
                    logged_in = self.state.borrow().is_logged_in,
                    "Session store ready"
                );
            })
            .await;
    }

    async fn restore(&self) {
        if let Err(e) = self.storage.open().await {
            tracing::warn!(error = %e, "Session storage unavailable, continuing logged out");
            return;
        }

        let token = match self.storage.get(TOKEN_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!("No persisted session token");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted token");
                return;
            }
        };

        match session_from_token(token) {
            Ok(session) => {
                tracing::info!(
                    role = ?session.user.as_ref().map(|u| u.role.as_str()),
                    expires_at = ?session.expires_at.map(format_unix_rfc3339),
                    "Restored persisted session"
                );
                self.publish(session);
            }
            Err(reason) => {
                tracing::info!(reason, "Discarding persisted token");
                self.purge().await;
            }
        }
    }

    /// Resolve once `open()` has finished.
    pub async fn wait_for_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    // ─── Login / Logout ──────────────────────────────────────────────────────

    /// Authenticate against the backend and publish the new session.
    ///
    /// Any token left over from a previous session is cleared before the
    /// backend is called, so a failed login always ends logged out.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        self.open().await;
        self.purge().await;

        tracing::info!(email = %credentials.email, "Logging in");

        let payload = self
            .backend
            .login(credentials)
            .await
            .map_err(|err| match err {
                ApiError::Authentication => AuthError::InvalidCredentials,
                ApiError::Validation {
                    message: Some(message),
                    ..
                } => AuthError::Rejected(message),
                other => AuthError::Api(other),
            })
            .inspect_err(|e| tracing::warn!(error = %e, "Login failed"))?;

        // The token must be readable: every later accessor decodes it.
        let claims = decode_claims(&payload.token).map_err(|e| {
            tracing::warn!(error = %e, "Login returned an undecodable token");
            AuthError::Api(ApiError::InvalidResponse(
                "login returned an undecodable token".to_string(),
            ))
        })?;
        if is_expired(&claims, unix_now()) {
            return Err(AuthError::Api(ApiError::InvalidResponse(
                "login returned an expired token".to_string(),
            )));
        }

        let role = payload
            .role
            .as_deref()
            .map(Role::parse)
            .or_else(|| claims.role.clone())
            .ok_or_else(|| {
                AuthError::Api(ApiError::InvalidResponse(
                    "login response carries no role".to_string(),
                ))
            })?;

        let login_user = payload.user.unwrap_or_default();
        let user = UserIdentity {
            email: login_user
                .email
                .or(claims.subject)
                .or_else(|| Some(credentials.email.clone())),
            role,
            user_id: login_user.id.or(claims.user_id),
        };

        if let Err(e) = self.storage.set(TOKEN_KEY, &payload.token).await {
            tracing::warn!(error = %e, "Failed to persist token, session will not survive restart");
        }

        let session = Session::authenticated(payload.token, user, claims.expires_at);
        self.publish(session.clone());

        tracing::info!(
            role = %session.user.as_ref().map(|u| u.role.as_str()).unwrap_or_default(),
            "Logged in"
        );
        Ok(session)
    }

    /// Clear the session locally. Never fails.
    pub async fn logout(&self) {
        self.purge().await;
        tracing::info!("Logged out");
    }

    /// Clear the session after the backend rejected our credentials (401/403).
    pub async fn clear_on_rejection(&self, err: &ApiError) {
        tracing::warn!(error = %err, "Backend rejected session, clearing it");
        self.purge().await;
    }

    /// Remove the persisted token and publish the anonymous session.
    async fn purge(&self) {
        self.disarm_expiry();
        if let Err(e) = self.storage.remove(TOKEN_KEY).await {
            tracing::warn!(error = %e, "Failed to remove persisted token");
        }
        self.state.send_if_modified(|session| {
            if *session == Session::anonymous() {
                false
            } else {
                *session = Session::anonymous();
                true
            }
        });
    }

    /// Publish a logged-in session and arm its expiry timer.
    fn publish(&self, session: Session) {
        let mut timer = self
            .expiry_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = timer.take() {
            previous.abort();
        }

        let expiry = session.expires_at.zip(session.token.clone());
        self.state.send_replace(session);

        if let Some((exp, token)) = expiry {
            let delay = Duration::from_secs(u64::try_from(exp - unix_now()).unwrap_or(0));
            let storage = self.storage.clone();
            let state = self.state.clone();
            *timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                expire(storage.as_ref(), &state, &token).await;
            }));
        }
    }

    fn disarm_expiry(&self) {
        let previous = self
            .expiry_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    /// Current, unexpired token.
    ///
    /// Reads durable storage (falling back to memory if storage is
    /// unavailable). An expired or undecodable token is purged.
    pub async fn get_token(&self) -> Option<String> {
        let token = match self.storage.get(TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "Token storage unavailable, using in-memory token");
                let token = self.state.borrow().token.clone();
                token
            }
        }?;

        match decode_claims(&token) {
            Ok(claims) if is_expired(&claims, unix_now()) => {
                tracing::info!("Session token expired");
                self.purge().await;
                None
            }
            Ok(_) => Some(token),
            Err(e) => {
                tracing::warn!(error = %e, "Stored token is undecodable");
                self.purge().await;
                None
            }
        }
    }

    /// Role of the current user, from memory or else from the stored token.
    pub async fn get_role(&self) -> Option<Role> {
        let in_memory = self
            .state
            .borrow()
            .user
            .as_ref()
            .map(|user| user.role.clone());
        if in_memory.is_some() {
            return in_memory;
        }

        let token = self.storage.get(TOKEN_KEY).await.ok().flatten()?;
        decode_claims(&token).ok()?.role
    }

    /// Whether a live session exists. An in-memory token that has since
    /// expired is purged here.
    pub async fn is_logged_in(&self) -> bool {
        let (logged_in, expires_at) = {
            let session = self.state.borrow();
            (session.is_logged_in, session.expires_at)
        };
        if !logged_in {
            return false;
        }
        if expires_at.is_some_and(|exp| unix_now() >= exp) {
            tracing::info!("Session token expired");
            self.purge().await;
            return false;
        }
        true
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.state.borrow().user.clone()
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Observe session changes, including the logout published when the
    /// token's expiry passes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Headers feature services attach to their own requests.
    pub async fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = self.get_token().await {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => tracing::warn!(error = %e, "Token is not a valid header value"),
            }
        }
        headers
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.disarm_expiry();
    }
}

/// Expiry timer body: drop `token` from storage and memory unless a newer
/// session has replaced it.
async fn expire(storage: &dyn KeyValueStore, state: &watch::Sender<Session>, token: &str) {
    let expired = state.send_if_modified(|session| {
        if session.token.as_deref() == Some(token) {
            *session = Session::anonymous();
            true
        } else {
            false
        }
    });
    if !expired {
        return;
    }

    tracing::info!("Session token expired");
    if let Ok(Some(stored)) = storage.get(TOKEN_KEY).await {
        if stored == token {
            if let Err(e) = storage.remove(TOKEN_KEY).await {
                tracing::warn!(error = %e, "Failed to remove expired token");
            }
        }
    }
}

/// Build a logged-in session from a persisted token, or say why not.
fn session_from_token(token: String) -> Result<Session, &'static str> {
    let claims = decode_claims(&token).map_err(|_| "undecodable")?;
    if is_expired(&claims, unix_now()) {
        return Err("expired");
    }
    Ok(Session {
        token: Some(token),
        user: claims.identity(),
        expires_at: claims.expires_at,
        is_logged_in: true,
    })
}
