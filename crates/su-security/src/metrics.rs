//! ---
//! su_section: "06-security-access-control"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Role permissions, session lifecycle and route guarding."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use prometheus::{IntCounter, Registry};
use std::sync::Arc;

/// Session and access-control counters exported via Prometheus.
#[derive(Clone)]
pub struct SecurityMetrics {
    registry: Arc<Registry>,
    login_attempts_total: IntCounter,
    login_failures_total: IntCounter,
    access_denials_total: IntCounter,
    session_invalidations_total: IntCounter,
}

impl std::fmt::Debug for SecurityMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityMetrics").finish_non_exhaustive()
    }
}

impl SecurityMetrics {
    /// Register metrics with the provided registry.
    pub fn new(registry: Arc<Registry>) -> anyhow::Result<Self> {
        let login_attempts_total =
            IntCounter::new("login_attempts_total", "Total login attempts")?;
        let login_failures_total =
            IntCounter::new("login_failures_total", "Failed login attempts")?;
        let access_denials_total = IntCounter::new(
            "access_denials_total",
            "Navigations redirected because of missing permissions",
        )?;
        let session_invalidations_total = IntCounter::new(
            "session_invalidations_total",
            "Sessions torn down after an authentication failure response",
        )?;

        registry.register(Box::new(login_attempts_total.clone()))?;
        registry.register(Box::new(login_failures_total.clone()))?;
        registry.register(Box::new(access_denials_total.clone()))?;
        registry.register(Box::new(session_invalidations_total.clone()))?;

        Ok(Self {
            registry,
            login_attempts_total,
            login_failures_total,
            access_denials_total,
            session_invalidations_total,
        })
    }

    /// Access the underlying registry.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Increment login attempts.
    pub fn inc_login_attempt(&self) {
        self.login_attempts_total.inc();
    }

    /// Increment login failures.
    pub fn inc_login_failure(&self) {
        self.login_failures_total.inc();
    }

    /// Increment access denials.
    pub fn inc_access_denial(&self) {
        self.access_denials_total.inc();
    }

    /// Increment session invalidations.
    pub fn inc_session_invalidation(&self) {
        self.session_invalidations_total.inc();
    }

    /// Current value of the login failure counter.
    pub fn login_failures(&self) -> u64 {
        self.login_failures_total.get()
    }

    /// Current value of the access denial counter.
    pub fn access_denials(&self) -> u64 {
        self.access_denials_total.get()
    }

    /// Current value of the session invalidation counter.
    pub fn session_invalidations(&self) -> u64 {
        self.session_invalidations_total.get()
    }
}
