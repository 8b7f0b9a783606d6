use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat};
use findor_core::api_key::{
    ApiKeyListItem, CreatedApiKey, DeleteKeyRequest, EmailRequest, StatusResponse,
};
use tokio::net::TcpListener;

pub const USER_CREATE: &str = "/user/create";
pub const KEY_CREATE: &str = "/apikey/create";
pub const KEY_LIST: &str = "/apikey/list";
pub const KEY_DELETE: &str = "/apikey/delete";

const FIRST_CREATED_AT: i64 = 1_700_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Answer with this status and a JSON error body.
    Status(u16),
    /// Answer 200 with a body that is not JSON.
    Malformed,
}

/// In-memory stand-in for the remote key service.
#[derive(Debug, Default)]
pub struct FakeBackend {
    users: Mutex<HashSet<String>>,
    keys: Mutex<HashMap<String, Vec<ApiKeyListItem>>>,
    failures: Mutex<HashMap<&'static str, Failure>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    issued: Mutex<i64>,
}

impl FakeBackend {
    /// Register a user with pre-existing keys.
    pub fn seed(&self, email: &str, keys: Vec<ApiKeyListItem>) {
        self.users.lock().unwrap().insert(email.to_string());
        self.keys.lock().unwrap().insert(email.to_string(), keys);
    }

    pub fn fail(&self, path: &'static str, failure: Failure) {
        self.failures.lock().unwrap().insert(path, failure);
    }

    pub fn recover(&self, path: &'static str) {
        self.failures.lock().unwrap().remove(path);
    }

    pub fn calls(&self, path: &'static str) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn has_user(&self, email: &str) -> bool {
        self.users.lock().unwrap().contains(email)
    }

    pub fn keys_for(&self, email: &str) -> Vec<ApiKeyListItem> {
        self.keys
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    fn enter(&self, path: &'static str) -> Option<Response> {
        *self.calls.lock().unwrap().entry(path).or_default() += 1;
        match self.failures.lock().unwrap().get(path).copied()? {
            Failure::Status(code) => {
                let status =
                    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Some(error(status, "injected failure"))
            }
            Failure::Malformed => Some((StatusCode::OK, "<html>not json</html>").into_response()),
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(StatusResponse {
            status_code: i64::from(status.as_u16()),
            message: message.to_string(),
        }),
    )
        .into_response()
}

fn ok(message: &str) -> Response {
    Json(StatusResponse {
        status_code: 200,
        message: message.to_string(),
    })
    .into_response()
}

async fn create_user(
    State(backend): State<Arc<FakeBackend>>,
    Json(req): Json<EmailRequest>,
) -> Response {
    if let Some(resp) = backend.enter(USER_CREATE) {
        return resp;
    }
    if !backend.users.lock().unwrap().insert(req.email) {
        return error(StatusCode::BAD_REQUEST, "User already exists");
    }
    ok("User created")
}

async fn create_key(
    State(backend): State<Arc<FakeBackend>>,
    Json(req): Json<EmailRequest>,
) -> Response {
    if let Some(resp) = backend.enter(KEY_CREATE) {
        return resp;
    }
    if !backend.has_user(&req.email) {
        return error(StatusCode::NOT_FOUND, "User not found");
    }
    let created_at = {
        let mut issued = backend.issued.lock().unwrap();
        *issued += 1;
        FIRST_CREATED_AT + *issued
    };
    let secret = format!("sk_fake{created_at:012}");
    let listed_at = DateTime::from_timestamp(created_at, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default();
    backend
        .keys
        .lock()
        .unwrap()
        .entry(req.email)
        .or_default()
        .push(ApiKeyListItem {
            key: secret.clone(),
            created_at: listed_at,
        });
    Json(CreatedApiKey {
        secret,
        created_at,
        status: "active".into(),
        message: "API key created".into(),
        status_code: 200,
    })
    .into_response()
}

async fn list_keys(
    State(backend): State<Arc<FakeBackend>>,
    Json(req): Json<EmailRequest>,
) -> Response {
    if let Some(resp) = backend.enter(KEY_LIST) {
        return resp;
    }
    Json(backend.keys_for(&req.email)).into_response()
}

async fn delete_key(
    State(backend): State<Arc<FakeBackend>>,
    Json(req): Json<DeleteKeyRequest>,
) -> Response {
    if let Some(resp) = backend.enter(KEY_DELETE) {
        return resp;
    }
    let mut keys = backend.keys.lock().unwrap();
    let owned = keys.entry(req.email).or_default();
    let before = owned.len();
    owned.retain(|item| item.key != req.key);
    if owned.len() == before {
        return error(StatusCode::NOT_FOUND, "API key not found");
    }
    ok("API key deleted")
}

pub fn router(backend: Arc<FakeBackend>) -> Router {
    Router::new()
        .route(USER_CREATE, post(create_user))
        .route(KEY_CREATE, post(create_key))
        .route(KEY_LIST, post(list_keys))
        .route(KEY_DELETE, post(delete_key))
        .with_state(backend)
}

/// A running fake backend with its base URL and shared state.
pub struct FakeServer {
    pub base_url: String,
    pub backend: Arc<FakeBackend>,
    _handle: tokio::task::JoinHandle<()>,
}

/// Serve a fresh `FakeBackend` on a random local port.
pub async fn spawn_fake_backend() -> FakeServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let backend = Arc::new(FakeBackend::default());
    let app = router(backend.clone());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    FakeServer {
        base_url: format!("http://{addr}"),
        backend,
        _handle: handle,
    }
}
