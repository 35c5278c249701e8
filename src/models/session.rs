// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session snapshot published by the session store.

use super::user::UserIdentity;

/// Current authentication state.
///
/// `is_logged_in` implies `token` is present and was unexpired when published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Bearer credential, `None` when logged out
    pub token: Option<String>,
    /// Identity decoded from the token or taken from the login response
    pub user: Option<UserIdentity>,
    /// Token expiry (Unix seconds), if the token carries one
    pub expires_at: Option<i64>,
    pub is_logged_in: bool,
}

impl Session {
    /// The logged-out session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: String, user: UserIdentity, expires_at: Option<i64>) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
            expires_at,
            is_logged_in: true,
        }
    }
}
