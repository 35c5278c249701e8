// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session and backend logic.

pub mod backend;
pub mod retry;
pub mod session_store;
pub mod token_codec;

pub use backend::{ApiRequest, ApiResponse, AuthBackend, HttpAuthBackend};
pub use retry::{Backoff, RetryPolicy};
pub use session_store::SessionStore;
pub use token_codec::Claims;
