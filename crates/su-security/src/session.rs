//! ---
//! su_section: "06-security-access-control"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Role permissions, session lifecycle and route guarding."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
//! Shared session state.
//!
//! A [`Session`] is the context object handed to the session store, the route
//! guard and the HTTP client. Every transition that changes who is signed in
//! bumps a generation counter; asynchronous work captures the generation
//! before awaiting and only applies its result if nothing changed meanwhile.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use su_logging::{log_system_event, LogContext, SystemEventOutcome};
use tracing::warn;

use crate::access;
use crate::identity::Identity;
use crate::metrics::SecurityMetrics;
use crate::rbac::Permission;
use crate::token_store::{TokenStore, TokenStoreError};

/// Point-in-time view of the session used by the access evaluator and guard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Authenticated user, if any.
    pub identity: Option<Identity>,
    /// True until the startup identity check completes.
    pub loading: bool,
}

#[derive(Debug)]
struct SessionState {
    identity: Option<Identity>,
    token: Option<String>,
    loading: bool,
    generation: u64,
}

/// Authentication state shared across the console.
pub struct Session {
    state: RwLock<SessionState>,
    store: Arc<dyn TokenStore>,
    metrics: Option<SecurityMetrics>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Session")
            .field("user", &state.identity.as_ref().map(|i| i.username.as_str()))
            .field("has_token", &state.token.is_some())
            .field("loading", &state.loading)
            .field("generation", &state.generation)
            .finish()
    }
}

impl Session {
    /// Create a session over `store`, reading the persisted token once.
    ///
    /// The session starts in the loading state; an unreadable store is
    /// treated as holding no token.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "persisted token unreadable, starting signed out");
                None
            }
        };
        Self {
            state: RwLock::new(SessionState {
                identity: None,
                token,
                loading: true,
                generation: 0,
            }),
            store,
            metrics: None,
        }
    }

    /// Attach security metrics.
    pub fn with_metrics(mut self, metrics: SecurityMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn metrics(&self) -> Option<&SecurityMetrics> {
        self.metrics.as_ref()
    }

    /// Current identity, if signed in.
    pub fn identity(&self) -> Option<Identity> {
        self.state.read().identity.clone()
    }

    /// Token attached to outgoing requests.
    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().identity.is_some()
    }

    /// Counter bumped by every login, logout and invalidation.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        SessionSnapshot {
            identity: state.identity.clone(),
            loading: state.loading,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        access::has_permission(&self.snapshot(), permission)
    }

    pub fn can_access_route(&self, required: &[Permission]) -> bool {
        access::can_access_route(&self.snapshot(), required)
    }

    /// Tear the session down after the server rejected its credentials.
    pub fn invalidate(&self) {
        let user = self.reset();
        if let Some(metrics) = &self.metrics {
            metrics.inc_session_invalidation();
        }
        let ctx = LogContext::new().with_user(user.as_deref().unwrap_or(""));
        log_system_event(
            Some(&ctx),
            "session.invalidated",
            "credentials rejected by the server",
            SystemEventOutcome::Denied,
        );
    }

    /// Drop identity and token, returning the login name that was signed in.
    pub(crate) fn reset(&self) -> Option<String> {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to delete persisted token");
        }
        let mut state = self.state.write();
        state.token = None;
        state.generation += 1;
        state.identity.take().map(|identity| identity.username)
    }

    /// Persist a freshly issued token; returns the generation it belongs to.
    pub(crate) fn persist_token(&self, token: &str) -> Result<u64, TokenStoreError> {
        self.store.store(token)?;
        let mut state = self.state.write();
        state.token = Some(token.to_owned());
        state.generation += 1;
        Ok(state.generation)
    }

    /// Put `previous` back in place of a token written at `generation`.
    ///
    /// Skipped when the session moved on since the token was written.
    pub(crate) fn restore_token(&self, generation: u64, previous: Option<String>) {
        let mut state = self.state.write();
        if state.generation != generation {
            return;
        }
        let outcome = match &previous {
            Some(token) => self.store.store(token),
            None => self.store.clear(),
        };
        if let Err(err) = outcome {
            warn!(error = %err, "failed to roll back persisted token");
        }
        state.token = previous;
    }

    /// Install `identity` if the session is still at `generation`.
    pub(crate) fn install(&self, generation: u64, identity: Identity) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            return false;
        }
        state.identity = Some(identity);
        true
    }

    /// Discard the token if the session is still at `generation`.
    pub(crate) fn discard_token(&self, generation: u64) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            return false;
        }
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to delete persisted token");
        }
        state.token = None;
        state.identity = None;
        true
    }

    pub(crate) fn finish_loading(&self) {
        self.state.write().loading = false;
    }
}
