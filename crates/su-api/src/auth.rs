//! ---
//! su_section: "05-networking-external-interfaces"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "REST client wrapper and resource clients for the union API."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use su_security::{AuthBackend, AuthError, Identity};

use crate::client::ApiClient;

const LOGIN_PATH: &str = "/auth/login";
const ME_PATH: &str = "/auth/me";

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let response: TokenResponse = self
            .post(LOGIN_PATH, &Credentials { username, password })
            .await?;
        if response.access_token.is_empty() {
            return Err(AuthError::Decode("empty access token".into()));
        }
        Ok(response.access_token)
    }

    async fn current_identity(&self) -> Result<Identity, AuthError> {
        Ok(self.get(ME_PATH, &[]).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use su_common::ApiConfig;
    use su_security::{MemoryTokenStore, NavigationHistory, Redirect, Session, SessionStore};
    use tokio::net::TcpListener;
    use url::Url;

    async fn spawn_auth_server() -> ApiConfig {
        let router = Router::new()
            .route(
                "/api/v1/auth/login",
                post(|Json(body): Json<Value>| async move {
                    if body["username"] == "alice" && body["password"] == "secret" {
                        Ok(Json(json!({"access_token": "jwt-alice", "token_type": "bearer"})))
                    } else {
                        Err((
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"detail": "Неверный логин или пароль"})),
                        ))
                    }
                }),
            )
            .route(
                "/api/v1/auth/me",
                get(|headers: HeaderMap| async move {
                    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                        Some("Bearer jwt-alice") => Ok(Json(json!({
                            "id": 1, "login": "alice", "subdivision_id": null,
                            "roles": [{"id": 1, "name": "CHAIRMAN"}]
                        }))),
                        _ => Err(StatusCode::UNAUTHORIZED),
                    }
                }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        ApiConfig {
            base_url: Url::parse(&format!("http://{addr}/api/v1")).unwrap(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn login_stores_token_and_fetches_identity() {
        let config = spawn_auth_server().await;
        let session = Arc::new(Session::new(Arc::new(MemoryTokenStore::new())));
        let client = ApiClient::new(&config, session.clone(), Arc::new(NavigationHistory::new()))
            .unwrap();
        let store = SessionStore::new(session.clone(), Arc::new(client));

        let identity = store.login("alice", "secret").await.unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(session.token().as_deref(), Some("jwt-alice"));
    }

    #[tokio::test]
    async fn rejected_login_goes_through_the_401_path() {
        let config = spawn_auth_server().await;
        let session = Arc::new(Session::new(Arc::new(MemoryTokenStore::new())));
        let navigator = Arc::new(NavigationHistory::new());
        let client = ApiClient::new(&config, session.clone(), navigator.clone()).unwrap();
        let store = SessionStore::new(session.clone(), Arc::new(client));

        let err = store.login("alice", "wrong").await.unwrap_err();
        assert_eq!(err.message(), "Неверный логин или пароль");
        assert!(session.identity().is_none());
        assert_eq!(navigator.entries(), vec![Redirect::Login { return_to: None }]);
    }
}
