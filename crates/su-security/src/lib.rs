//! ---
//! su_section: "06-security-access-control"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Role permissions, session lifecycle and route guarding."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---

pub mod access;
pub mod guard;
pub mod identity;
pub mod metrics;
pub mod navigation;
pub mod rbac;
pub mod routes;
pub mod session;
pub mod session_store;
pub mod token_store;

pub use access::{can_access_route, effective_permissions, has_permission};
pub use guard::{evaluate, GuardDecision, Navigation, RouteGuard};
pub use identity::{Identity, RoleRef};
pub use metrics::SecurityMetrics;
pub use navigation::{NavigationHistory, Navigator, Redirect};
pub use rbac::{table, Permission, Role, RolePermissionTable};
pub use routes::{lookup, menu, Menu, MenuEntry, MenuSection, RouteSpec, View};
pub use session::{Session, SessionSnapshot};
pub use session_store::{AuthBackend, AuthError, LoginError, SessionStore, LOGIN_FAILED};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError, TOKEN_KEY};
