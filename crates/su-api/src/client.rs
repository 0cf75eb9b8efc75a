//! ---
//! su_section: "05-networking-external-interfaces"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "REST client wrapper and resource clients for the union API."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use su_common::ApiConfig;
use su_logging::{su_debug, su_warn, LogContext};
use su_security::{Navigator, Redirect, Session};
use url::Url;

use crate::error::ApiError;

/// HTTP client bound to a session.
///
/// Attaches the session token to every request. Any 401 response tears the
/// session down and sends the navigator to the login view before the error
/// is returned; callers never handle authentication failures themselves.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<Session>,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        session: Arc<Session>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("suctl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url.clone(),
                session,
                navigator,
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    /// Absolute URL of `path` below the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        let body = self.execute(Method::GET, path, query, None).await?;
        decode(&body)
    }

    pub async fn post<B, T>(&self, path: &str, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self
            .execute(Method::POST, path, &[], Some(encode(payload)?))
            .await?;
        decode(&body)
    }

    pub async fn put<B, T>(&self, path: &str, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self
            .execute(Method::PUT, path, &[], Some(encode(payload)?))
            .await?;
        decode(&body)
    }

    /// POST without a payload; the response body is ignored.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::POST, path, &[], None).await?;
        Ok(())
    }

    /// DELETE; the response body is ignored.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        payload: Option<Value>,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(path)?;
        let user = self
            .inner
            .session
            .identity()
            .map(|identity| identity.username)
            .unwrap_or_default();
        let ctx = LogContext::new()
            .with_user(&user)
            .with_request(method.as_str(), path);

        let mut request = self
            .inner
            .http
            .request(method.clone(), url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.inner.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(payload) = payload {
            request = request.json(&payload);
        }

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await;
        su_debug!(
            context = ctx,
            "{} after {}ms",
            status.as_u16(),
            started.elapsed().as_millis()
        );

        if status == StatusCode::UNAUTHORIZED {
            let err = ApiError::from_status(
                status.as_u16(),
                body.as_ref().map(|bytes| &bytes[..]).unwrap_or_default(),
            );
            su_warn!(context = ctx, "credentials rejected, ending session");
            self.inner.session.invalidate();
            self.inner
                .navigator
                .redirect(Redirect::Login { return_to: None });
            return Err(err);
        }

        let body = body?;
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        Ok(body.to_vec())
    }
}

fn encode<B: Serialize + ?Sized>(payload: &B) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|err| ApiError::Decode(err.to_string()))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::Decode(err.to_string()))
}
