//! ---
//! su_section: "06-security-access-control"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Role permissions, session lifecycle and route guarding."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

use crate::routes::{ACCESS_DENIED_PATH, LOGIN_PATH};

/// Redirect issued by the guard or by the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "to", rename_all = "kebab-case")]
pub enum Redirect {
    /// Send the user to the login view, remembering where they were going.
    Login {
        /// Location to return to after a successful login.
        return_to: Option<String>,
    },
    /// Send the user to the access denied view.
    AccessDenied,
    /// Follow an alias route (e.g. `/` to `/students`).
    Alias {
        /// Target path.
        path: String,
    },
}

impl Redirect {
    /// Path of the view the redirect leads to.
    pub fn path(&self) -> &str {
        match self {
            Redirect::Login { .. } => LOGIN_PATH,
            Redirect::AccessDenied => ACCESS_DENIED_PATH,
            Redirect::Alias { path } => path,
        }
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Redirect::Login {
                return_to: Some(from),
            } => write!(f, "{} (return to {from})", self.path()),
            _ => f.write_str(self.path()),
        }
    }
}

/// Receives redirects; the concrete mechanism belongs to the view layer.
pub trait Navigator: Send + Sync {
    /// Move the view layer to `redirect`.
    fn redirect(&self, redirect: Redirect);
}

/// Navigator that records every redirect in order.
#[derive(Debug, Default)]
pub struct NavigationHistory {
    entries: Mutex<Vec<Redirect>>,
}

impl NavigationHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded redirects.
    pub fn entries(&self) -> Vec<Redirect> {
        self.entries.lock().clone()
    }

    /// Most recent redirect.
    pub fn last(&self) -> Option<Redirect> {
        self.entries.lock().last().cloned()
    }

    /// Remove and return the recorded redirects.
    pub fn drain(&self) -> Vec<Redirect> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl Navigator for NavigationHistory {
    fn redirect(&self, redirect: Redirect) {
        tracing::debug!(target_path = redirect.path(), "redirect recorded");
        self.entries.lock().push(redirect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_records_in_order() {
        let history = NavigationHistory::new();
        history.redirect(Redirect::Login { return_to: None });
        history.redirect(Redirect::AccessDenied);
        assert_eq!(history.last(), Some(Redirect::AccessDenied));
        assert_eq!(history.drain().len(), 2);
        assert!(history.entries().is_empty());
    }

    #[test]
    fn redirect_paths_and_display() {
        let login = Redirect::Login {
            return_to: Some("/users".into()),
        };
        assert_eq!(login.path(), "/login");
        assert_eq!(login.to_string(), "/login (return to /users)");
        assert_eq!(Redirect::AccessDenied.to_string(), "/unauthorized");
        assert_eq!(
            Redirect::Alias {
                path: "/students".into()
            }
            .path(),
            "/students"
        );
    }
}
