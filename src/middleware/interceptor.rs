// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request interceptor: every backend call made by feature services goes
//! through [`HttpInterceptor::send`].
//!
//! Per request it:
//! 1. Waits for the session store to be ready
//! 2. Joins an identical in-flight request if one exists
//! 3. Otherwise attaches the bearer token and starts the call as its own task
//! 4. Shows a busy indicator (with safety timeout) for long-running calls
//! 5. Clears the session and redirects on 401/403
//! 6. Notifies the user with the categorized error message

use crate::config::{Config, LOGIN_ROUTE};
use crate::error::ApiError;
use crate::middleware::busy::BusyHandle;
use crate::services::backend::{execute, ApiRequest, ApiResponse};
use crate::services::retry::{retry, RetryPolicy};
use crate::services::SessionStore;
use crate::ui::{BusyIndicator, Navigator, Notifier};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Result of one network call, observable by every caller that joined it.
pub type SharedResponse = Shared<BoxFuture<'static, Result<ApiResponse, ApiError>>>;

/// Fingerprint → pending call. Shared with every clone of the interceptor.
pub type InflightRegistry = Arc<DashMap<String, SharedResponse>>;

/// Cross-cutting request pipeline: auth, deduplication, busy state, errors.
#[derive(Clone)]
pub struct HttpInterceptor {
    http: reqwest::Client,
    base_url: Arc<str>,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    busy: Arc<dyn BusyIndicator>,
    notifier: Arc<dyn Notifier>,
    busy_timeout: Duration,
    inflight: InflightRegistry,
    /// Network calls actually issued (joins excluded).
    dispatched: Arc<AtomicU64>,
}

impl HttpInterceptor {
    pub fn new(
        config: &Config,
        http: reqwest::Client,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        busy: Arc<dyn BusyIndicator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            http,
            base_url: Arc::from(config.api_base_url.as_str()),
            session,
            navigator,
            busy,
            notifier,
            busy_timeout: config.busy_timeout,
            inflight: Arc::new(DashMap::new()),
            dispatched: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of requests currently in flight.
    pub fn inflight_len(&self) -> usize {
        self.inflight.len()
    }

    /// Number of network calls issued so far.
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched.load(Ordering::SeqCst)
    }

    /// Send a request through the pipeline.
    ///
    /// Concurrent calls with the same fingerprint share one network call and
    /// all receive its result.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.session.wait_for_ready().await;

        let fingerprint = request.fingerprint(&self.base_url);
        let shared = match self.inflight.entry(fingerprint.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!(
                    method = %request.method,
                    path = %request.path,
                    "Joining identical in-flight request"
                );
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let shared = self.start(request, fingerprint);
                entry.insert(shared.clone());
                shared
            }
        };

        shared.await
    }

    /// `send` under a bounded retry policy. Each attempt is a fresh pass
    /// through the pipeline, so it may join another caller's request.
    pub async fn send_with_retry(
        &self,
        request: ApiRequest,
        policy: &RetryPolicy,
    ) -> Result<ApiResponse, ApiError> {
        retry(policy, || self.send(request.clone())).await
    }

    /// Spawn the network call. It runs to completion even if every caller
    /// goes away, and removes its own registry entry when done.
    fn start(&self, request: ApiRequest, fingerprint: String) -> SharedResponse {
        let this = self.clone();
        let task = tokio::spawn(async move {
            let result = this.dispatch(&request).await;
            this.inflight.remove(&fingerprint);
            result
        });

        async move {
            task.await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "Request task failed");
                Err(ApiError::Network(format!("request task failed: {}", e)))
            })
        }
        .boxed()
        .shared()
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.dispatched.fetch_add(1, Ordering::SeqCst);

        let token = self.session.get_token().await;
        let busy = request
            .is_long_running()
            .then(|| BusyHandle::present(self.busy.clone(), self.busy_timeout));

        let result = execute(&self.http, &self.base_url, request, token.as_deref()).await;

        if let Some(busy) = busy {
            busy.finish();
        }

        match &result {
            Ok(response) => {
                tracing::debug!(
                    method = %request.method,
                    path = %request.path,
                    status = response.status,
                    "Request completed"
                );
            }
            Err(err) => self.handle_error(request, err).await,
        }

        result
    }

    /// Side effects for a categorized failure. Runs once per network call,
    /// however many callers joined it.
    async fn handle_error(&self, request: &ApiRequest, err: &ApiError) {
        tracing::warn!(
            method = %request.method,
            path = %request.path,
            error = %err,
            "Request failed"
        );

        // The login form reports its own failures.
        if request.is_login() {
            return;
        }

        if err.clears_session() {
            self.session.clear_on_rejection(err).await;
            self.navigator.navigate(&[LOGIN_ROUTE]);
        }

        self.notifier.notify(&err.user_message());
    }
}
