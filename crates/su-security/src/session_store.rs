//! ---
//! su_section: "06-security-access-control"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Role permissions, session lifecycle and route guarding."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use su_logging::{log_system_event, LogContext, SystemEventOutcome};
use thiserror::Error;

use crate::identity::Identity;
use crate::session::Session;
use crate::token_store::TokenStoreError;

/// Message shown when the server gives no reason for a failed login.
pub const LOGIN_FAILED: &str = "Login failed";

/// Failure talking to the authentication endpoints.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication rejected with status {status}")]
    Rejected { status: u16, detail: Option<String> },
    #[error("authentication service unreachable: {0}")]
    Transport(String),
    #[error("unexpected authentication response: {0}")]
    Decode(String),
    #[error(transparent)]
    Storage(#[from] TokenStoreError),
    #[error("session changed while the request was in flight")]
    Superseded,
}

impl AuthError {
    /// Human readable reason supplied by the server.
    pub fn detail(&self) -> Option<&str> {
        match self {
            AuthError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Login failure carrying the message to show the user.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LoginError {
    message: String,
    #[source]
    cause: AuthError,
}

impl LoginError {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> &AuthError {
        &self.cause
    }
}

impl From<AuthError> for LoginError {
    fn from(cause: AuthError) -> Self {
        let message = cause.detail().unwrap_or(LOGIN_FAILED).to_owned();
        Self { message, cause }
    }
}

/// Authentication endpoints used by the session store.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for an access token.
    async fn login(&self, username: &str, password: &str) -> Result<String, AuthError>;

    /// Fetch the identity bound to the session's current token.
    async fn current_identity(&self) -> Result<Identity, AuthError>;
}

/// Drives the session through bootstrap, login and logout.
pub struct SessionStore {
    session: Arc<Session>,
    backend: Arc<dyn AuthBackend>,
    bootstrapped: AtomicBool,
}

impl SessionStore {
    pub fn new(session: Arc<Session>, backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            session,
            backend,
            bootstrapped: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Resolve the persisted token into an identity.
    ///
    /// Runs at most once per store and never fails: a rejected or unreadable
    /// token is discarded and the session stays signed out. Loading is
    /// cleared in every case.
    pub async fn bootstrap(&self) {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.session.token().is_none() {
            self.session.finish_loading();
            log_system_event(
                None,
                "session.bootstrap",
                "no persisted token",
                SystemEventOutcome::Success,
            );
            return;
        }

        let generation = self.session.generation();
        let result = self.backend.current_identity().await;
        match result {
            Ok(identity) => {
                let username = identity.username.clone();
                let ctx = LogContext::new().with_user(&username);
                if self.session.install(generation, identity) {
                    log_system_event(
                        Some(&ctx),
                        "session.bootstrap",
                        "session restored",
                        SystemEventOutcome::Success,
                    );
                } else {
                    log_system_event(
                        Some(&ctx),
                        "session.bootstrap",
                        "stale identity discarded",
                        SystemEventOutcome::Denied,
                    );
                }
            }
            Err(err) => {
                let discarded = self.session.discard_token(generation);
                log_system_event(
                    None,
                    "session.bootstrap",
                    &format!("identity lookup failed: {err}"),
                    if discarded {
                        SystemEventOutcome::Fault
                    } else {
                        SystemEventOutcome::Denied
                    },
                );
            }
        }
        self.session.finish_loading();
    }

    /// Sign in with `username` and `password`.
    ///
    /// On failure the previously persisted token is put back, unless the
    /// session was invalidated or replaced in the meantime.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, LoginError> {
        if let Some(metrics) = self.session.metrics() {
            metrics.inc_login_attempt();
        }
        let ctx = LogContext::new().with_user(username);
        let result = self.try_login(username, password).await;
        match &result {
            Ok(_) => log_system_event(
                Some(&ctx),
                "session.login",
                "login succeeded",
                SystemEventOutcome::Success,
            ),
            Err(err) => {
                if let Some(metrics) = self.session.metrics() {
                    metrics.inc_login_failure();
                }
                log_system_event(
                    Some(&ctx),
                    "session.login",
                    &format!("login failed: {}", err.cause()),
                    SystemEventOutcome::Denied,
                );
            }
        }
        result
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<Identity, LoginError> {
        let token = self.backend.login(username, password).await?;
        let previous = self.session.token();
        let generation = self.session.persist_token(&token).map_err(AuthError::from)?;

        let identity = match self.backend.current_identity().await {
            Ok(identity) => identity,
            Err(err) => {
                self.session.restore_token(generation, previous);
                return Err(err.into());
            }
        };
        if !self.session.install(generation, identity.clone()) {
            return Err(AuthError::Superseded.into());
        }
        Ok(identity)
    }

    /// Sign out. Idempotent; no server call is made.
    pub fn logout(&self) {
        let user = self.session.reset();
        let ctx = LogContext::new().with_user(user.as_deref().unwrap_or(""));
        log_system_event(
            Some(&ctx),
            "session.logout",
            "signed out",
            SystemEventOutcome::Success,
        );
    }
}
