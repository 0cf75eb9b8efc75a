//! ---
//! su_section: "06-security-access-control"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Role permissions, session lifecycle and route guarding."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rbac::{table, Permission, Role};

/// Role assignment as reported by the identity endpoint.
///
/// The server sends `{ "id": 1, "name": "CHAIRMAN" }`; a bare `"CHAIRMAN"` is
/// accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RoleRefRepr")]
pub struct RoleRef {
    /// Server-side identifier, absent for bare names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Role name, matched case-sensitively against [`Role`].
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoleRefRepr {
    Named { id: Option<i64>, name: String },
    Bare(String),
}

impl From<RoleRefRepr> for RoleRef {
    fn from(repr: RoleRefRepr) -> Self {
        match repr {
            RoleRefRepr::Named { id, name } => Self { id, name },
            RoleRefRepr::Bare(name) => Self { id: None, name },
        }
    }
}

impl RoleRef {
    /// Role reference without a server identifier.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// The known role this reference names, if any.
    pub fn role(&self) -> Option<Role> {
        self.name.parse().ok()
    }

    /// Title suitable for display.
    pub fn display_name(&self) -> &str {
        Role::display_name_for(&self.name)
    }
}

impl From<Role> for RoleRef {
    fn from(role: Role) -> Self {
        Self::named(role.as_ref())
    }
}

/// The authenticated user: login name, ordered roles and profile attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Login name.
    #[serde(alias = "login")]
    pub username: String,
    /// Assigned roles in server order.
    #[serde(default)]
    pub roles: Vec<RoleRef>,
    /// Every other field of the profile (id, subdivision, ...).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Identity {
    /// Short helper for constructing an identity.
    pub fn new(username: impl Into<String>, roles: impl IntoIterator<Item = RoleRef>) -> Self {
        Self {
            username: username.into(),
            roles: roles.into_iter().collect(),
            attributes: Map::new(),
        }
    }

    /// Attach a profile attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Profile attribute lookup.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Role names in server order.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|role| role.name.as_str())
    }

    /// Whether any assigned role grants `permission`.
    pub fn grants(&self, permission: Permission) -> bool {
        self.role_names()
            .any(|name| table().grants(name, permission))
    }

    /// Union of the permissions of every assigned role.
    pub fn effective_permissions(&self) -> BTreeSet<Permission> {
        self.role_names()
            .flat_map(|name| table().permissions_for_name(name).iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_identity_endpoint_body() {
        let identity: Identity = serde_json::from_value(json!({
            "id": 7,
            "username": "alice",
            "subdivision_id": 3,
            "roles": [{"id": 1, "name": "CHAIRMAN"}, "DORMITORY_HEAD"],
            "subdivision": {"id": 3, "name": "ИТ"}
        }))
        .unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.roles[0], RoleRef { id: Some(1), name: "CHAIRMAN".into() });
        assert_eq!(identity.roles[1].role(), Some(Role::DormitoryHead));
        assert_eq!(identity.attribute("id"), Some(&json!(7)));
        assert!(identity.attribute("subdivision").is_some());
    }

    #[test]
    fn accepts_login_alias_and_missing_roles() {
        let identity: Identity = serde_json::from_value(json!({"login": "bob"})).unwrap();
        assert_eq!(identity.username, "bob");
        assert!(identity.roles.is_empty());
        assert!(identity.effective_permissions().is_empty());
    }

    #[test]
    fn effective_permissions_are_a_union() {
        let identity = Identity::new(
            "carol",
            [RoleRef::from(Role::DivisionHead), RoleRef::from(Role::DormitoryHead)],
        );
        let permissions = identity.effective_permissions();
        assert_eq!(
            permissions.into_iter().collect::<Vec<_>>(),
            vec![
                Permission::ManageGroups,
                Permission::ManageStudents,
                Permission::ViewDormitory
            ]
        );
        assert!(identity.grants(Permission::ViewDormitory));
        assert!(!identity.grants(Permission::ManageUsers));
    }

    #[test]
    fn unknown_roles_are_kept_but_grant_nothing() {
        let identity = Identity::new("dave", [RoleRef::named("AUDITOR")]);
        assert_eq!(identity.role_names().collect::<Vec<_>>(), vec!["AUDITOR"]);
        assert_eq!(identity.roles[0].display_name(), "AUDITOR");
        assert!(!identity.grants(Permission::ViewAll));
    }
}
