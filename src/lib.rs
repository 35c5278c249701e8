// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dispatch client: session and request core for the field-service app.
//!
//! This crate owns the authentication lifecycle (token storage, expiry,
//! login/logout), the route guards that gate admin and worker areas, and the
//! request interceptor every feature service sends through.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod time_utils;
pub mod ui;

use config::Config;
use db::KeyValueStore;
use error::ApiError;
use middleware::{HttpInterceptor, RouteGuard};
use services::backend::build_http_client;
use services::{HttpAuthBackend, SessionStore};
use std::sync::Arc;
use ui::{BusyIndicator, Navigator, Notifier};

/// Shared client state, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub http: HttpInterceptor,
    pub navigator: Arc<dyn Navigator>,
}

impl AppState {
    /// Wire the session store, HTTP backend and interceptor together.
    ///
    /// The session store is not opened here; call `session.open()` once.
    pub fn new(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        busy: Arc<dyn BusyIndicator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let client = build_http_client(config.request_timeout)?;
        let backend = Arc::new(
            HttpAuthBackend::new(client.clone(), config.api_base_url.clone())
                .with_busy(busy.clone(), config.busy_timeout),
        );
        let session = Arc::new(SessionStore::new(storage, backend));
        let http = HttpInterceptor::new(
            &config,
            client,
            session.clone(),
            navigator.clone(),
            busy,
            notifier,
        );

        Ok(Self {
            config,
            session,
            http,
            navigator,
        })
    }

    pub fn auth_guard(&self) -> RouteGuard {
        RouteGuard::authenticated(self.session.clone(), self.navigator.clone())
    }

    pub fn admin_guard(&self) -> RouteGuard {
        RouteGuard::admin(self.session.clone(), self.navigator.clone())
    }

    pub fn worker_guard(&self) -> RouteGuard {
        RouteGuard::worker(self.session.clone(), self.navigator.clone())
    }
}
