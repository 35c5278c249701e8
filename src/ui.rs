// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Seams to the UI shell: navigation, busy indicator, user notifications.
//!
//! The core only calls these; how they render is up to the host. The
//! `Log*` implementations route everything to tracing, for the CLI and for
//! headless use.

/// Navigation router.
pub trait Navigator: Send + Sync {
    /// Navigate to the route given as path segments, e.g. `["/auth/login"]`.
    fn navigate(&self, commands: &[&str]);
}

/// Blocking "please wait" overlay.
pub trait BusyIndicator: Send + Sync {
    fn present(&self, message: &str);
    fn dismiss(&self);
}

/// Toast/alert surface for user-facing messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Navigator that only logs where it would go.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, commands: &[&str]) {
        tracing::info!(route = %commands.join("/"), "Navigate");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogBusyIndicator;

impl BusyIndicator for LogBusyIndicator {
    fn present(&self, message: &str) {
        tracing::debug!(message, "Busy indicator shown");
    }

    fn dismiss(&self) {
        tracing::debug!("Busy indicator dismissed");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(message, "User notification");
    }
}
