//! ---
//! su_section: "05-networking-external-interfaces"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "REST client wrapper and resource clients for the union API."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---

pub mod auth;
pub mod client;
pub mod error;
pub mod listing;
pub mod models;
pub mod resources;

pub use client::ApiClient;
pub use error::{extract_detail, ApiError, FormError};
pub use listing::{ListQuery, Page, SortOrder};
pub use resources::{
    AuditLogs, Contributions, Groups, Hostels, Resource, Roles, Students, Subdivisions, Users,
};
