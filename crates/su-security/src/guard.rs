//! ---
//! su_section: "06-security-access-control"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Role permissions, session lifecycle and route guarding."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use std::sync::Arc;

use su_logging::{su_debug, su_warn, LogContext};

use crate::access::can_access_route;
use crate::navigation::{Navigator, Redirect};
use crate::rbac::Permission;
use crate::routes::{lookup, Access, RouteSpec, View, HOME_PATH};
use crate::session::{Session, SessionSnapshot};

/// Outcome of guarding a protected location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Startup identity check still running; render a placeholder.
    Loading,
    /// No identity; go to login and come back to `return_to` afterwards.
    Unauthenticated { return_to: String },
    /// Identity present but lacking every required permission.
    Unauthorized,
    /// Render the protected content.
    Authorized,
}

/// Decide whether `requested` may be rendered for `session`.
///
/// Checks run in order: loading, authentication, permissions.
pub fn evaluate(
    session: &SessionSnapshot,
    required: &[Permission],
    requested: &str,
) -> GuardDecision {
    if session.loading {
        return GuardDecision::Loading;
    }
    if session.identity.is_none() {
        return GuardDecision::Unauthenticated {
            return_to: requested.to_owned(),
        };
    }
    if !can_access_route(session, required) {
        return GuardDecision::Unauthorized;
    }
    GuardDecision::Authorized
}

/// Result of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Loading,
    Render(&'static RouteSpec),
    Redirected(Redirect),
    NotFound,
}

/// Applies the guard to every navigation and forwards redirects.
pub struct RouteGuard {
    session: Arc<Session>,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    pub fn new(session: Arc<Session>, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator }
    }

    /// Resolve `location` and decide what to show.
    ///
    /// The decision is re-evaluated on every call against the current session.
    pub fn navigate(&self, location: &str) -> Navigation {
        let Some(route) = lookup(location) else {
            su_debug!(
                context = LogContext::new().with_route(location),
                "no route for location"
            );
            return Navigation::NotFound;
        };
        if route.access == Access::Public {
            return Navigation::Render(route);
        }

        let snapshot = self.session.snapshot();
        match evaluate(&snapshot, route.required(), location) {
            GuardDecision::Loading => Navigation::Loading,
            GuardDecision::Unauthenticated { return_to } => {
                self.redirect(Redirect::Login {
                    return_to: Some(return_to),
                })
            }
            GuardDecision::Unauthorized => {
                if let Some(metrics) = self.session.metrics() {
                    metrics.inc_access_denial();
                }
                let user = snapshot
                    .identity
                    .as_ref()
                    .map(|identity| identity.username.as_str())
                    .unwrap_or("");
                su_warn!(
                    context = LogContext::new().with_user(user).with_route(route.path),
                    "access denied"
                );
                self.redirect(Redirect::AccessDenied)
            }
            GuardDecision::Authorized if route.view == View::Home => {
                self.redirect(Redirect::Alias {
                    path: HOME_PATH.to_owned(),
                })
            }
            GuardDecision::Authorized => Navigation::Render(route),
        }
    }

    fn redirect(&self, redirect: Redirect) -> Navigation {
        self.navigator.redirect(redirect.clone());
        Navigation::Redirected(redirect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Identity, RoleRef};
    use crate::metrics::SecurityMetrics;
    use crate::navigation::NavigationHistory;
    use crate::rbac::Role;
    use crate::token_store::MemoryTokenStore;
    use prometheus::Registry;

    fn snapshot(role: Option<Role>, loading: bool) -> SessionSnapshot {
        SessionSnapshot {
            identity: role.map(|role| Identity::new("user", [RoleRef::from(role)])),
            loading,
        }
    }

    #[test]
    fn evaluation_order() {
        assert_eq!(
            evaluate(&snapshot(None, true), &[Permission::ManageUsers], "/users"),
            GuardDecision::Loading
        );
        assert_eq!(
            evaluate(&snapshot(Some(Role::Chairman), true), &[], "/users"),
            GuardDecision::Loading
        );
        assert_eq!(
            evaluate(&snapshot(None, false), &[Permission::ManageUsers], "/users"),
            GuardDecision::Unauthenticated {
                return_to: "/users".into()
            }
        );
        assert_eq!(
            evaluate(
                &snapshot(Some(Role::DivisionHead), false),
                &[Permission::ManageUsers],
                "/users"
            ),
            GuardDecision::Unauthorized
        );
        assert_eq!(
            evaluate(
                &snapshot(Some(Role::Chairman), false),
                &[Permission::ManageUsers],
                "/users"
            ),
            GuardDecision::Authorized
        );
    }

    fn guarded(role: Option<Role>) -> (RouteGuard, Arc<Session>, Arc<NavigationHistory>) {
        let session = Session::new(Arc::new(MemoryTokenStore::new()))
            .with_metrics(SecurityMetrics::new(Arc::new(Registry::new())).unwrap());
        let session = Arc::new(session);
        if let Some(role) = role {
            session.install(session.generation(), Identity::new("user", [RoleRef::from(role)]));
        }
        session.finish_loading();
        let history = Arc::new(NavigationHistory::new());
        (
            RouteGuard::new(session.clone(), history.clone()),
            session,
            history,
        )
    }

    #[test]
    fn division_head_is_sent_to_access_denied() {
        let (guard, session, history) = guarded(Some(Role::DivisionHead));
        assert_eq!(
            guard.navigate("/users"),
            Navigation::Redirected(Redirect::AccessDenied)
        );
        assert_eq!(history.last(), Some(Redirect::AccessDenied));
        assert_eq!(session.metrics().unwrap().access_denials(), 1);

        match guard.navigate("/groups") {
            Navigation::Render(route) => assert_eq!(route.view, View::Groups),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn anonymous_user_is_sent_to_login_with_return_path() {
        let (guard, _, history) = guarded(None);
        assert_eq!(
            guard.navigate("/logs?page=2"),
            Navigation::Redirected(Redirect::Login {
                return_to: Some("/logs?page=2".into())
            })
        );
        assert_eq!(history.entries().len(), 1);
    }

    #[test]
    fn public_routes_render_without_session() {
        let (guard, _, history) = guarded(None);
        assert!(matches!(guard.navigate("/login"), Navigation::Render(route) if route.view == View::Login));
        assert!(matches!(
            guard.navigate("/unauthorized"),
            Navigation::Render(route) if route.view == View::AccessDenied
        ));
        assert!(history.entries().is_empty());
    }

    #[test]
    fn root_aliases_to_students() {
        let (guard, _, _) = guarded(Some(Role::DormitoryHead));
        assert_eq!(
            guard.navigate("/"),
            Navigation::Redirected(Redirect::Alias {
                path: "/students".into()
            })
        );
    }

    #[test]
    fn loading_session_renders_placeholder() {
        let session = Arc::new(Session::new(Arc::new(MemoryTokenStore::with_token("t"))));
        let history = Arc::new(NavigationHistory::new());
        let guard = RouteGuard::new(session, history.clone());
        assert_eq!(guard.navigate("/students"), Navigation::Loading);
        assert!(history.entries().is_empty());
    }

    #[test]
    fn decision_follows_session_changes() {
        let (guard, session, _) = guarded(Some(Role::Chairman));
        assert!(matches!(guard.navigate("/users"), Navigation::Render(_)));
        session.invalidate();
        assert!(matches!(
            guard.navigate("/users"),
            Navigation::Redirected(Redirect::Login { .. })
        ));
    }

    #[test]
    fn unknown_location_is_not_found() {
        let (guard, _, history) = guarded(Some(Role::Chairman));
        assert_eq!(guard.navigate("/nowhere"), Navigation::NotFound);
        assert!(history.entries().is_empty());
    }
}
