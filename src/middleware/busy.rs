// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Busy indicator lifetime for long-running requests.

use crate::ui::BusyIndicator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const BUSY_MESSAGE: &str = "Please wait...";

/// A presented busy indicator.
///
/// Dismissed by whichever comes first: [`BusyHandle::finish`] or the safety
/// timeout. The indicator is dismissed exactly once either way, and finishing
/// cancels the pending timer.
pub struct BusyHandle {
    indicator: Arc<dyn BusyIndicator>,
    dismissed: Arc<AtomicBool>,
    timer: JoinHandle<()>,
}

impl BusyHandle {
    /// Present the indicator and arm the safety timeout.
    pub fn present(indicator: Arc<dyn BusyIndicator>, safety_timeout: Duration) -> Self {
        indicator.present(BUSY_MESSAGE);

        let dismissed = Arc::new(AtomicBool::new(false));
        let timer = {
            let indicator = indicator.clone();
            let dismissed = dismissed.clone();
            tokio::spawn(async move {
                tokio::time::sleep(safety_timeout).await;
                if !dismissed.swap(true, Ordering::SeqCst) {
                    tracing::warn!(
                        timeout_ms = safety_timeout.as_millis() as u64,
                        "Busy indicator safety timeout fired"
                    );
                    indicator.dismiss();
                }
            })
        };

        Self {
            indicator,
            dismissed,
            timer,
        }
    }

    /// Request finished: cancel the timer and dismiss if still shown.
    pub fn finish(self) {
        self.timer.abort();
        if !self.dismissed.swap(true, Ordering::SeqCst) {
            self.indicator.dismiss();
        }
    }
}
