// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dispatch client CLI
//!
//! Drives the session core from the command line:
//!
//! ```text
//! dispatch-client login <email>      (password from DISPATCH_PASSWORD)
//! dispatch-client logout
//! dispatch-client whoami
//! dispatch-client guard <auth|admin|worker>
//! dispatch-client get <path>
//! ```

use anyhow::{bail, Context};
use dispatch_client::{
    config::Config,
    db::FileStore,
    models::Credentials,
    services::{ApiRequest, RetryPolicy},
    ui::{LogBusyIndicator, LogNavigator, LogNotifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(api = %config.api_base_url, "Starting dispatch client");

    let storage = Arc::new(FileStore::new(&config.session_store_path));
    let state = AppState::new(
        config.clone(),
        storage,
        Arc::new(LogNavigator),
        Arc::new(LogBusyIndicator),
        Arc::new(LogNotifier),
    )?;
    state.session.open().await;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["login", email] => {
            let password =
                std::env::var("DISPATCH_PASSWORD").context("DISPATCH_PASSWORD is not set")?;
            match state.session.login(&Credentials::new(*email, password)).await {
                Ok(session) => {
                    let role = session.user.map(|u| u.role.to_string()).unwrap_or_default();
                    println!("logged in as {} ({})", email, role);
                }
                Err(e) => bail!(e.user_message()),
            }
        }
        ["logout"] => {
            state.session.logout().await;
            println!("logged out");
        }
        ["whoami"] => {
            let logged_in = state.session.is_logged_in().await;
            match state.session.current_user() {
                Some(user) if logged_in => println!(
                    "{} role={} id={}",
                    user.email.unwrap_or_default(),
                    user.role,
                    user.user_id.unwrap_or_default()
                ),
                _ => println!("not logged in"),
            }
        }
        ["guard", gate] => {
            let guard = match *gate {
                "auth" => state.auth_guard(),
                "admin" => state.admin_guard(),
                "worker" => state.worker_guard(),
                other => bail!("unknown guard {:?}", other),
            };
            println!("{}", if guard.can_activate().await { "allow" } else { "deny" });
        }
        ["get", path] => {
            let policy = RetryPolicy {
                max_attempts: config.retry_max_attempts,
                ..RetryPolicy::default()
            };
            let response = state
                .http
                .send_with_retry(ApiRequest::get(*path), &policy)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{}", serde_json::to_string_pretty(&response.body)?);
        }
        _ => bail!("usage: dispatch-client <login EMAIL | logout | whoami | guard GATE | get PATH>"),
    }

    Ok(())
}

/// Initialize structured JSON logging on stderr.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dispatch_client=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
