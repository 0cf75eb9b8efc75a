//! ---
//! su_section: "06-security-access-control"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Role permissions, session lifecycle and route guarding."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
//! Pure permission checks over a session snapshot.

use std::collections::BTreeSet;

use crate::identity::Identity;
use crate::rbac::Permission;
use crate::session::SessionSnapshot;

/// Whether the session holds `permission` through any of its roles.
pub fn has_permission(session: &SessionSnapshot, permission: Permission) -> bool {
    session
        .identity
        .as_ref()
        .is_some_and(|identity| identity.grants(permission))
}

/// Whether the session may enter a route requiring any of `required`.
///
/// An empty list admits every authenticated session.
pub fn can_access_route(session: &SessionSnapshot, required: &[Permission]) -> bool {
    let Some(identity) = session.identity.as_ref() else {
        return false;
    };
    required.is_empty() || required.iter().any(|p| identity.grants(*p))
}

/// Union of the permissions granted to `identity`.
pub fn effective_permissions(identity: &Identity) -> BTreeSet<Permission> {
    identity.effective_permissions()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::RoleRef;
    use crate::rbac::{table, Role};
    use strum::IntoEnumIterator;

    fn session(roles: &[&str]) -> SessionSnapshot {
        SessionSnapshot {
            identity: Some(Identity::new(
                "user",
                roles.iter().map(|name| RoleRef::named(*name)),
            )),
            loading: false,
        }
    }

    #[test]
    fn single_role_matches_table_exhaustively() {
        for role in Role::iter() {
            let snapshot = session(&[role.as_ref()]);
            for permission in Permission::iter() {
                assert_eq!(
                    has_permission(&snapshot, permission),
                    table().permissions(role).contains(&permission),
                    "{role} / {permission}"
                );
            }
        }
    }

    #[test]
    fn anonymous_session_is_denied_everything() {
        let anonymous = SessionSnapshot::default();
        for permission in Permission::iter() {
            assert!(!has_permission(&anonymous, permission));
        }
        assert!(!can_access_route(&anonymous, &[]));
        assert!(!can_access_route(&anonymous, &[Permission::ViewAll]));
    }

    #[test]
    fn empty_requirement_admits_any_identity() {
        assert!(can_access_route(&session(&[]), &[]));
        assert!(can_access_route(&session(&["AUDITOR"]), &[]));
        assert!(can_access_route(&session(&["DORMITORY_HEAD"]), &[]));
    }

    #[test]
    fn requirement_list_is_a_disjunction() {
        let dormitory = session(&["DORMITORY_HEAD"]);
        assert!(can_access_route(
            &dormitory,
            &[Permission::ManageUsers, Permission::ViewDormitory]
        ));
        assert!(!can_access_route(
            &dormitory,
            &[Permission::ManageUsers, Permission::ManageGroups]
        ));
    }

    #[test]
    fn manage_users_requires_a_granting_role() {
        for role in Role::iter() {
            let expected = table().grants(role.as_ref(), Permission::ManageUsers);
            assert_eq!(
                can_access_route(&session(&[role.as_ref()]), &[Permission::ManageUsers]),
                expected
            );
        }
        assert!(can_access_route(&session(&["CHAIRMAN"]), &[Permission::ManageUsers]));
        assert!(!can_access_route(
            &session(&["DIVISION_HEAD"]),
            &[Permission::ManageUsers]
        ));
    }

    #[test]
    fn multiple_roles_union_permissions() {
        let combined = session(&["DIVISION_HEAD", "DORMITORY_HEAD", "UNKNOWN"]);
        assert!(has_permission(&combined, Permission::ManageGroups));
        assert!(has_permission(&combined, Permission::ViewDormitory));
        assert!(!has_permission(&combined, Permission::DeleteAll));
        let identity = combined.identity.as_ref().unwrap();
        assert_eq!(effective_permissions(identity).len(), 3);
    }

    #[test]
    fn loading_flag_does_not_affect_checks() {
        let mut snapshot = session(&["CHAIRMAN"]);
        snapshot.loading = true;
        assert!(has_permission(&snapshot, Permission::DeleteAll));
    }
}
