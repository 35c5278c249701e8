// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time as Unix seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Format a Unix timestamp as RFC3339 with a `Z` suffix, for logs.
pub fn format_unix_rfc3339(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| secs.to_string())
}
