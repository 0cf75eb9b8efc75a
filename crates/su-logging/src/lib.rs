//! ---
//! su_section: "03-logging"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Structured logging context and session event helpers."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
#![warn(missing_docs)]

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for development and tests.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
///
/// Never carries credentials: tokens and passwords stay out of log events.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Login name of the acting user, if known.
    pub user: Option<&'a str>,
    /// Route (view path) the event relates to.
    pub route: Option<&'a str>,
    /// HTTP method of the outgoing request.
    pub method: Option<&'a str>,
    /// Request path relative to the API base.
    pub request: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the acting user's login name.
    pub fn with_user(mut self, user: &'a str) -> Self {
        self.user = Some(user);
        self
    }

    /// Attach a route path.
    pub fn with_route(mut self, route: &'a str) -> Self {
        self.route = Some(route);
        self
    }

    /// Attach the outgoing request's method and path.
    pub fn with_request(mut self, method: &'a str, path: &'a str) -> Self {
        self.method = Some(method);
        self.request = Some(path);
        self
    }
}

/// High-level outcome used when emitting session lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation completed but was rejected or discarded.
    Denied,
    /// The operation failed.
    Fault,
}

impl SystemEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Denied => "denied",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized system event with an outcome.
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    macro_rules! emit {
        ($level:expr) => {
            tracing::event!(
                $level,
                event,
                outcome = outcome.as_str(),
                user = ctx.user.unwrap_or(""),
                route = ctx.route.unwrap_or(""),
                method = ctx.method.unwrap_or(""),
                request = ctx.request.unwrap_or(""),
                message = %message
            )
        };
    }
    match outcome {
        SystemEventOutcome::Success => emit!(Level::INFO),
        SystemEventOutcome::Denied => emit!(Level::WARN),
        SystemEventOutcome::Fault => emit!(Level::ERROR),
    }
}
