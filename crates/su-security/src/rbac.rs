//! ---
//! su_section: "06-security-access-control"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Role permissions, session lifecycle and route guarding."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Permission enumerates the capabilities a role can grant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Permission {
    /// See union-wide data, including the audit log.
    ViewAll,
    /// Manage user accounts and their role assignments.
    ManageUsers,
    /// Manage divisions.
    ManageDivision,
    /// Manage subdivisions.
    ManageSubdivision,
    /// Manage study groups.
    ManageGroups,
    /// Manage students and their contributions.
    ManageStudents,
    /// See hostel residency.
    ViewDormitory,
    /// Manage role definitions.
    ManageRoles,
    /// Delete any record.
    DeleteAll,
}

/// Role is one of the fixed positions a user can hold in the union.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Chairman of the union committee.
    Chairman,
    /// Deputy chairman.
    DeputyChairman,
    /// Head of a division.
    DivisionHead,
    /// Head of a dormitory.
    DormitoryHead,
}

impl Role {
    /// Human readable title shown next to the user's name.
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Chairman => "Председатель профкома",
            Role::DeputyChairman => "Заместитель председателя",
            Role::DivisionHead => "Председатель подразделения",
            Role::DormitoryHead => "Председатель общежития",
        }
    }

    /// Display name for a raw role name; unknown roles display as themselves.
    pub fn display_name_for(name: &str) -> &str {
        match name.parse::<Role>() {
            Ok(role) => role.display_name(),
            Err(_) => name,
        }
    }

    /// Permissions granted by this role.
    pub fn permissions(self) -> &'static HashSet<Permission> {
        table().permissions(self)
    }

    fn grants(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Chairman => &[
                ViewAll,
                ManageUsers,
                ManageDivision,
                ManageSubdivision,
                ManageGroups,
                ManageStudents,
                ViewDormitory,
                ManageRoles,
                DeleteAll,
            ],
            Role::DeputyChairman => &[
                ViewAll,
                ManageDivision,
                ManageSubdivision,
                ManageGroups,
                ManageStudents,
                ViewDormitory,
            ],
            Role::DivisionHead => &[ManageGroups, ManageStudents],
            Role::DormitoryHead => &[ManageStudents, ViewDormitory],
        }
    }
}

static EMPTY: Lazy<HashSet<Permission>> = Lazy::new(HashSet::new);
static TABLE: Lazy<RolePermissionTable> = Lazy::new(RolePermissionTable::build);

/// Process-wide role to permission mapping.
pub fn table() -> &'static RolePermissionTable {
    &TABLE
}

/// Immutable mapping from every [`Role`] to its permission set.
#[derive(Debug)]
pub struct RolePermissionTable {
    entries: HashMap<Role, HashSet<Permission>>,
}

impl RolePermissionTable {
    fn build() -> Self {
        let entries = Role::iter()
            .map(|role| (role, role.grants().iter().copied().collect()))
            .collect();
        Self { entries }
    }

    /// Permissions for a known role.
    pub fn permissions(&self, role: Role) -> &HashSet<Permission> {
        self.entries.get(&role).unwrap_or(&EMPTY)
    }

    /// Permissions for a raw role name; undefined roles map to the empty set.
    pub fn permissions_for_name(&self, name: &str) -> &HashSet<Permission> {
        match name.parse::<Role>() {
            Ok(role) => self.permissions(role),
            Err(_) => &EMPTY,
        }
    }

    /// Whether the named role grants `permission`.
    pub fn grants(&self, role_name: &str, permission: Permission) -> bool {
        self.permissions_for_name(role_name).contains(&permission)
    }

    /// Roles that grant `permission`, in declaration order.
    pub fn roles_granting(&self, permission: Permission) -> Vec<Role> {
        Role::iter()
            .filter(|role| self.permissions(*role).contains(&permission))
            .collect()
    }

    /// Iterate over every entry of the table.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &HashSet<Permission>)> {
        Role::iter().map(move |role| (role, self.permissions(role)))
    }
}
