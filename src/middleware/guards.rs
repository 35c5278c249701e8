// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route authorization guards.

use crate::config::LOGIN_ROUTE;
use crate::models::Role;
use crate::services::SessionStore;
use crate::ui::Navigator;
use std::sync::Arc;

/// What a guard requires before letting navigation proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Any logged-in user.
    Authenticated,
    /// A logged-in user with exactly this role.
    Role(Role),
}

/// Navigation gate backed by the session store.
///
/// Guards only read session state. Their one side effect is redirecting to
/// the login route on denial.
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    gate: Gate,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionStore>, navigator: Arc<dyn Navigator>, gate: Gate) -> Self {
        Self {
            session,
            navigator,
            gate,
        }
    }

    pub fn authenticated(session: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self::new(session, navigator, Gate::Authenticated)
    }

    pub fn admin(session: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self::new(session, navigator, Gate::Role(Role::Admin))
    }

    pub fn worker(session: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self::new(session, navigator, Gate::Role(Role::Worker))
    }

    /// Decide whether navigation may proceed.
    ///
    /// Waits for the session store to be ready before looking at anything.
    /// The role is only consulted once login is confirmed.
    pub async fn can_activate(&self) -> bool {
        self.session.wait_for_ready().await;

        if !self.session.is_logged_in().await {
            tracing::debug!(gate = ?self.gate, "Guard denied: not logged in");
            return self.deny();
        }

        let Gate::Role(required) = &self.gate else {
            return true;
        };

        match self.session.get_role().await {
            Some(role) if role == *required => true,
            role => {
                tracing::debug!(
                    required = %required,
                    actual = ?role.as_ref().map(Role::as_str),
                    "Guard denied: role mismatch"
                );
                self.deny()
            }
        }
    }

    fn deny(&self) -> bool {
        self.navigator.navigate(&[LOGIN_ROUTE]);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TOKEN_KEY;
    use crate::db::MemoryStore;
    use crate::error::ApiError;
    use crate::models::Credentials;
    use crate::services::backend::{AuthBackend, LoginPayload};
    use crate::time_utils::unix_now;
    use async_trait::async_trait;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingNavigator {
        routes: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, commands: &[&str]) {
            self.routes.lock().unwrap().push(commands.concat());
        }
    }

    struct NoBackend;

    #[async_trait]
    impl AuthBackend for NoBackend {
        async fn login(&self, _credentials: &Credentials) -> Result<LoginPayload, ApiError> {
            Err(ApiError::Network("offline".to_string()))
        }
    }

    fn session_with_role(role: Option<&str>) -> Arc<SessionStore> {
        let storage = match role {
            Some(role) => {
                let token = encode(
                    &Header::new(Algorithm::HS256),
                    &json!({"sub": "a@fieldcrew.io", "role": role, "exp": unix_now() + 600}),
                    &EncodingKey::from_secret(b"k"),
                )
                .unwrap();
                MemoryStore::with_entry(TOKEN_KEY, &token)
            }
            None => MemoryStore::new(),
        };
        Arc::new(SessionStore::new(Arc::new(storage), Arc::new(NoBackend)))
    }

    #[tokio::test]
    async fn test_admin_guard_role_matrix() {
        for (role, allowed) in [
            ("admin", true),
            ("ADMIN", true),
            ("Admin", true),
            ("worker", false),
            ("dispatcher", false),
            ("", false),
        ] {
            let session = session_with_role(Some(role));
            session.open().await;
            let nav = Arc::new(RecordingNavigator::default());

            let guard = RouteGuard::admin(session, nav.clone());
            assert_eq!(guard.can_activate().await, allowed, "role {:?}", role);
            assert_eq!(nav.routes.lock().unwrap().len(), usize::from(!allowed));
        }
    }

    #[tokio::test]
    async fn test_worker_guard_logged_out_redirects_once() {
        let session = session_with_role(None);
        session.open().await;
        let nav = Arc::new(RecordingNavigator::default());

        let guard = RouteGuard::worker(session, nav.clone());
        assert!(!guard.can_activate().await);
        assert_eq!(*nav.routes.lock().unwrap(), vec![LOGIN_ROUTE.to_string()]);
    }

    #[tokio::test]
    async fn test_authenticated_guard_allows_any_role() {
        let session = session_with_role(Some("dispatcher"));
        session.open().await;
        let nav = Arc::new(RecordingNavigator::default());

        assert!(RouteGuard::authenticated(session, nav.clone()).can_activate().await);
        assert!(nav.routes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_guard_waits_for_ready() {
        let storage = MemoryStore::new().with_open_delay(Duration::from_millis(50));
        let session = Arc::new(SessionStore::new(Arc::new(storage), Arc::new(NoBackend)));
        let nav = Arc::new(RecordingNavigator::default());
        let guard = RouteGuard::authenticated(session.clone(), nav.clone());

        let pending = tokio::spawn(async move { guard.can_activate().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!pending.is_finished());
        assert!(nav.routes.lock().unwrap().is_empty());

        session.open().await;
        assert!(!pending.await.unwrap());
        assert_eq!(nav.routes.lock().unwrap().len(), 1);
    }
}
