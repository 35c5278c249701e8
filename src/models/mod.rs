// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the client core.

pub mod envelope;
pub mod session;
pub mod user;

pub use envelope::Envelope;
pub use session::Session;
pub use user::{Credentials, Role, UserIdentity};
