//! ---
//! su_section: "06-security-access-control"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Role permissions, session lifecycle and route guarding."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use serde::Serialize;

use crate::access::has_permission;
use crate::rbac::Permission;
use crate::session::SessionSnapshot;

/// Path of the login view.
pub const LOGIN_PATH: &str = "/login";
/// Path of the access denied view.
pub const ACCESS_DENIED_PATH: &str = "/unauthorized";
/// Where `/` leads once the user is authorized.
pub const HOME_PATH: &str = "/students";

/// Views the console knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Home,
    Login,
    AccessDenied,
    Students,
    Groups,
    Subdivisions,
    Hostels,
    Contributions,
    Users,
    Roles,
    AuditLogs,
    Profile,
}

/// Navigation menu section an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuSection {
    Main,
    Admin,
}

/// Who may enter a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reachable without a session.
    Public,
    /// Requires a session holding any of the listed permissions; an empty
    /// list admits every authenticated user.
    Protected(&'static [Permission]),
}

/// Static description of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub path: &'static str,
    pub view: View,
    pub title: &'static str,
    pub access: Access,
    pub menu: Option<MenuSection>,
}

impl RouteSpec {
    /// Permissions required to enter, empty for public or any-session routes.
    pub fn required(&self) -> &'static [Permission] {
        match self.access {
            Access::Public => &[],
            Access::Protected(required) => required,
        }
    }

    /// The permission gating the menu entry, if any.
    fn menu_permission(&self) -> Option<Permission> {
        self.required().first().copied()
    }
}

const fn protected(
    path: &'static str,
    view: View,
    title: &'static str,
    required: &'static [Permission],
    menu: Option<MenuSection>,
) -> RouteSpec {
    RouteSpec {
        path,
        view,
        title,
        access: Access::Protected(required),
        menu,
    }
}

/// Every route of the console, menu entries in display order.
pub static ROUTES: &[RouteSpec] = &[
    protected("/", View::Home, "Home", &[], None),
    RouteSpec {
        path: LOGIN_PATH,
        view: View::Login,
        title: "Login",
        access: Access::Public,
        menu: None,
    },
    RouteSpec {
        path: ACCESS_DENIED_PATH,
        view: View::AccessDenied,
        title: "Access denied",
        access: Access::Public,
        menu: None,
    },
    protected("/students", View::Students, "Студенты", &[], Some(MenuSection::Main)),
    protected(
        "/groups",
        View::Groups,
        "Группы",
        &[Permission::ManageGroups],
        Some(MenuSection::Main),
    ),
    protected(
        "/divisions",
        View::Subdivisions,
        "Подразделения",
        &[Permission::ManageSubdivision],
        Some(MenuSection::Main),
    ),
    protected(
        "/hostels",
        View::Hostels,
        "Общежития",
        &[Permission::ViewDormitory],
        Some(MenuSection::Main),
    ),
    protected(
        "/contributions",
        View::Contributions,
        "Взносы",
        &[Permission::ManageStudents],
        Some(MenuSection::Main),
    ),
    protected(
        "/users",
        View::Users,
        "Пользователи",
        &[Permission::ManageUsers],
        Some(MenuSection::Admin),
    ),
    protected(
        "/roles",
        View::Roles,
        "Роли",
        &[Permission::ManageRoles],
        Some(MenuSection::Admin),
    ),
    protected(
        "/logs",
        View::AuditLogs,
        "Журнал действий",
        &[Permission::ViewAll],
        Some(MenuSection::Admin),
    ),
    protected("/profile", View::Profile, "Профиль", &[], None),
];

/// Resolve a location (path with optional query) to its route.
pub fn lookup(location: &str) -> Option<&'static RouteSpec> {
    let path = location.split(['?', '#']).next().unwrap_or(location);
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    ROUTES.iter().find(|route| route.path == path)
}

/// Navigation menu entries visible to the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Menu {
    pub main: Vec<MenuEntry>,
    /// Empty when no admin entry is visible.
    pub admin: Vec<MenuEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub path: &'static str,
    pub title: &'static str,
}

impl Menu {
    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.admin.is_empty()
    }
}

/// Build the navigation menu for `session`; unauthenticated sessions get none.
pub fn menu(session: &SessionSnapshot) -> Menu {
    let mut menu = Menu::default();
    if session.identity.is_none() {
        return menu;
    }
    for route in ROUTES {
        let Some(section) = route.menu else {
            continue;
        };
        if let Some(permission) = route.menu_permission() {
            if !has_permission(session, permission) {
                continue;
            }
        }
        let entry = MenuEntry {
            path: route.path,
            title: route.title,
        };
        match section {
            MenuSection::Main => menu.main.push(entry),
            MenuSection::Admin => menu.admin.push(entry),
        }
    }
    menu
}
