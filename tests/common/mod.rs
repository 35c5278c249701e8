// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use dispatch_client::config::Config;
use dispatch_client::db::{KeyValueStore, MemoryStore};
use dispatch_client::time_utils::unix_now;
use dispatch_client::ui::{BusyIndicator, Navigator, Notifier};
use dispatch_client::AppState;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Password the mock backend accepts.
#[allow(dead_code)]
pub const GOOD_PASSWORD: &str = "correct-horse";

/// Mint a backend-style token. The client never checks the signature.
#[allow(dead_code)]
pub fn mint_token(email: &str, role: &str, exp_offset_secs: i64) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "sub": email,
            "role": role,
            "id": 12,
            "exp": unix_now() + exp_offset_secs,
        }),
        &EncodingKey::from_secret(b"mock_backend_signing_key"),
    )
    .expect("Failed to create JWT")
}

/// Per-route hit counters for the mock backend.
#[derive(Default)]
pub struct BackendCounters {
    pub login: AtomicUsize,
    pub slow: AtomicUsize,
    pub flaky: AtomicUsize,
    pub status: AtomicUsize,
    pub uploads: AtomicUsize,
}

impl BackendCounters {
    #[allow(dead_code)]
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

async fn login(
    State(counters): State<Arc<BackendCounters>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    counters.login.fetch_add(1, Ordering::SeqCst);
    let email = body["email"].as_str().unwrap_or_default().to_string();

    if body["password"] != GOOD_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"ok": false, "message": "Invalid credentials"})),
        );
    }

    let token = mint_token(&email, "worker", 3600);
    let user = json!({"email": email, "id": 12});
    let body = if email.starts_with("flat") {
        json!({"ok": true, "token": token, "role": "Admin", "user": user})
    } else {
        json!({"ok": true, "data": {"token": token, "role": "Worker", "user": user}})
    };
    (StatusCode::OK, Json(body))
}

async fn slow_jobs(State(counters): State<Arc<BackendCounters>>) -> Json<Value> {
    let call = counters.slow.fetch_add(1, Ordering::SeqCst) + 1;
    tokio::time::sleep(Duration::from_millis(150)).await;
    Json(json!({"ok": true, "data": {"jobs": [101, 102, 103], "call": call}}))
}

async fn flaky(State(counters): State<Arc<BackendCounters>>) -> (StatusCode, Json<Value>) {
    let call = counters.flaky.fetch_add(1, Ordering::SeqCst) + 1;
    if call < 3 {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"ok": false})))
    } else {
        (StatusCode::OK, Json(json!({"ok": true, "data": {"call": call}})))
    }
}

async fn status(
    State(counters): State<Arc<BackendCounters>>,
    Path(code): Path<u16>,
) -> (StatusCode, Json<Value>) {
    counters.status.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({"ok": false, "message": format!("mock status {}", code)})),
    )
}

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    Json(json!({ "authorization": auth }))
}

async fn upload(State(counters): State<Arc<BackendCounters>>) -> (StatusCode, Json<Value>) {
    counters.uploads.fetch_add(1, Ordering::SeqCst);
    (StatusCode::CREATED, Json(json!({"ok": true, "data": {"id": 55}})))
}

/// Start the mock backend on an ephemeral port.
/// Returns its base URL and hit counters.
pub async fn spawn_backend() -> (String, Arc<BackendCounters>) {
    let counters = Arc::new(BackendCounters::default());
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/jobs/slow", get(slow_jobs))
        .route("/flaky", get(flaky))
        .route("/status/{code}", get(status))
        .route("/echo-auth", get(echo_auth))
        .route("/uploads", post(upload))
        .with_state(counters.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), counters)
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, commands: &[&str]) {
        self.routes.lock().unwrap().push(commands.concat());
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingBusy {
    pub presented: AtomicUsize,
    pub dismissed: AtomicUsize,
}

impl BusyIndicator for RecordingBusy {
    fn present(&self, _message: &str) {
        self.presented.fetch_add(1, Ordering::SeqCst);
    }

    fn dismiss(&self) {
        self.dismissed.fetch_add(1, Ordering::SeqCst);
    }
}

/// A fully wired client against the mock backend, with recording UI seams.
pub struct Harness {
    pub state: AppState,
    pub storage: Arc<MemoryStore>,
    pub counters: Arc<BackendCounters>,
    pub navigator: Arc<RecordingNavigator>,
    pub notifier: Arc<RecordingNotifier>,
    pub busy: Arc<RecordingBusy>,
}

impl Harness {
    /// Wire a client with the given durable store; the session is not opened.
    #[allow(dead_code)]
    pub async fn unopened(storage: MemoryStore) -> Self {
        let (base_url, counters) = spawn_backend().await;
        Self::with_base_url(base_url, counters, storage)
    }

    /// Wire a client and open its session.
    #[allow(dead_code)]
    pub async fn new(storage: MemoryStore) -> Self {
        let harness = Self::unopened(storage).await;
        harness.state.session.open().await;
        harness
    }

    #[allow(dead_code)]
    pub fn with_base_url(
        base_url: String,
        counters: Arc<BackendCounters>,
        storage: MemoryStore,
    ) -> Self {
        let config = Config {
            api_base_url: base_url,
            ..Config::test_default()
        };
        Self::with_config(config, counters, storage)
    }

    pub fn with_config(
        config: Config,
        counters: Arc<BackendCounters>,
        storage: MemoryStore,
    ) -> Self {
        let storage = Arc::new(storage);
        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let busy = Arc::new(RecordingBusy::default());

        let state = AppState::new(
            config,
            storage.clone() as Arc<dyn KeyValueStore>,
            navigator.clone(),
            busy.clone(),
            notifier.clone(),
        )
        .expect("Failed to build client");

        Self {
            state,
            storage,
            counters,
            navigator,
            notifier,
            busy,
        }
    }

    #[allow(dead_code)]
    pub fn routes(&self) -> Vec<String> {
        self.navigator.routes.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn messages(&self) -> Vec<String> {
        self.notifier.messages.lock().unwrap().clone()
    }
}
