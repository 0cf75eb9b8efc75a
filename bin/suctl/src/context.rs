//! ---
//! su_section: "05-networking-external-interfaces"
//! su_subsection: "binary"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Terminal console for the student union management system."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::{Registry, TextEncoder};
use su_api::ApiClient;
use su_common::AppConfig;
use su_security::{
    FileTokenStore, Navigator, Redirect, RouteGuard, SecurityMetrics, Session, SessionStore,
};

/// Prints redirects for the user instead of switching views.
#[derive(Debug, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn redirect(&self, redirect: Redirect) {
        match &redirect {
            Redirect::Login { .. } => {
                eprintln!("Redirected to {redirect}: sign in with `suctl login -u <user>`")
            }
            Redirect::AccessDenied => {
                eprintln!("Redirected to {redirect}: you do not have access to this page")
            }
            Redirect::Alias { path } => tracing::debug!(target_path = %path, "following alias"),
        }
    }
}

/// Everything a command needs, wired around one shared session.
pub struct AppContext {
    pub session: Arc<Session>,
    pub store: SessionStore,
    pub guard: RouteGuard,
    pub client: ApiClient,
    registry: Arc<Registry>,
}

impl AppContext {
    pub fn build(config: &AppConfig) -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let metrics = SecurityMetrics::new(registry.clone())?;
        let tokens = Arc::new(FileTokenStore::new(&config.storage.path));
        let session = Arc::new(Session::new(tokens).with_metrics(metrics));
        let navigator: Arc<dyn Navigator> = Arc::new(ConsoleNavigator);

        let client = ApiClient::new(&config.api, session.clone(), navigator.clone())
            .context("failed to build HTTP client")?;
        let store = SessionStore::new(session.clone(), Arc::new(client.clone()));
        let guard = RouteGuard::new(session.clone(), navigator);
        Ok(Self {
            session,
            store,
            guard,
            client,
            registry,
        })
    }

    pub fn metrics_text(&self) -> Result<String> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .context("failed to encode metrics")
    }
}
