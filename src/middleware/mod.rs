// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request and navigation middleware (guards, interceptor, busy state).

pub mod busy;
pub mod guards;
pub mod interceptor;

pub use guards::{Gate, RouteGuard};
pub use interceptor::HttpInterceptor;
