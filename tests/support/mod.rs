//! ---
//! su_section: "15-testing-qa-runbook"
//! su_subsection: "integration-tests"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "In-process mock of the union REST API for integration tests."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use su_common::ApiConfig;
use tokio::net::TcpListener;
use url::Url;

/// Accounts known to the mock backend: login, password, role.
pub const ACCOUNTS: &[(&str, &str, &str)] = &[
    ("chair", "chair-pass", "CHAIRMAN"),
    ("head", "head-pass", "DIVISION_HEAD"),
];

#[derive(Default)]
pub struct Backend {
    /// token -> login
    tokens: Mutex<HashMap<String, String>>,
    issued: AtomicUsize,
    /// Query strings received on the students endpoints.
    pub queries: Mutex<Vec<String>>,
}

impl Backend {
    /// Forget every issued token, as if the server rotated its signing key.
    pub fn revoke_all(&self) {
        self.tokens.lock().unwrap().clear();
    }

    fn login_for(&self, headers: &HeaderMap) -> Option<String> {
        let token = headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.tokens.lock().unwrap().get(token).cloned()
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    let matched = ACCOUNTS
        .iter()
        .find(|(user, pass, _)| body["username"] == *user && body["password"] == *pass);
    let Some((user, _, _)) = matched else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Неверный логин или пароль"})),
        )
            .into_response();
    };
    let n = backend.issued.fetch_add(1, Ordering::SeqCst);
    let token = format!("tok-{user}-{n}");
    backend
        .tokens
        .lock()
        .unwrap()
        .insert(token.clone(), (*user).to_owned());
    Json(json!({"access_token": token, "token_type": "bearer"})).into_response()
}

async fn me(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    let Some(user) = backend.login_for(&headers) else {
        return unauthorized();
    };
    let role = ACCOUNTS
        .iter()
        .find(|(login, _, _)| *login == user)
        .map(|(_, _, role)| *role)
        .unwrap_or_default();
    Json(json!({
        "id": 7,
        "login": user,
        "subdivision_id": 3,
        "roles": [{"id": 1, "name": role}],
    }))
    .into_response()
}

fn student(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "full_name": name,
        "group_id": 4,
        "is_active": true,
        "is_budget": false,
        "year": 2024,
    })
}

async fn students_page(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    if backend.login_for(&headers).is_none() {
        return unauthorized();
    }
    backend
        .queries
        .lock()
        .unwrap()
        .push(query.unwrap_or_default());
    Json(json!({
        "items": [student(1, "Иванов Иван"), student(2, "Петрова Анна")],
        "total": 42,
        "page": 2,
        "per_page": 2,
        "pages": 21,
    }))
    .into_response()
}

async fn students_list(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    if backend.login_for(&headers).is_none() {
        return unauthorized();
    }
    backend
        .queries
        .lock()
        .unwrap()
        .push(query.unwrap_or_default());
    Json(json!([
        student(1, "Иванов Иван"),
        // legacy flag spelling still seen on older deployments
        {"id": 3, "full_name": "Сидоров Пётр", "group_id": 4, "isactive": false, "isbudget": true, "year": 2023},
    ]))
    .into_response()
}

async fn users(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    match backend.login_for(&headers).as_deref() {
        None => unauthorized(),
        Some("chair") => Json(json!([])).into_response(),
        Some(_) => (
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "Not enough permissions"})),
        )
            .into_response(),
    }
}

/// Start the mock on an ephemeral port and return its client configuration.
pub async fn spawn() -> (ApiConfig, Arc<Backend>) {
    let backend = Arc::new(Backend::default());
    let router = Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/students", get(students_page))
        .route("/api/v1/students/list", get(students_list))
        .route("/api/v1/users", get(users))
        .with_state(backend.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    let config = ApiConfig {
        base_url: Url::parse(&format!("http://{addr}/api/v1")).unwrap(),
        timeout: Duration::from_secs(5),
    };
    (config, backend)
}
