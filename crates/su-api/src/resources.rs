//! ---
//! su_section: "05-networking-external-interfaces"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "REST client wrapper and resource clients for the union API."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

use crate::client::ApiClient;
use crate::error::{ApiError, FormError};
use crate::listing::{ListQuery, ListResponse, Page};
use crate::models::{
    AuditLogEntry, Contribution, ContributionPayload, Group, GroupPayload, HostelPayload,
    HostelResidence, PasswordChange, RolePayload, RoleRecord, Student, StudentPayload,
    Subdivision, SubdivisionPayload, SuccessMessage, User, UserPayload,
};

/// CRUD client for one collection endpoint.
///
/// `T` is the record type, `P` the create/update payload.
pub struct Resource<T, P> {
    client: ApiClient,
    base: &'static str,
    /// Unpaginated variant used when the query carries no paging.
    unpaged: Option<&'static str>,
    _marker: PhantomData<fn() -> (T, P)>,
}

impl<T, P> Clone for Resource<T, P> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base: self.base,
            unpaged: self.unpaged,
            _marker: PhantomData,
        }
    }
}

impl<T, P> Resource<T, P>
where
    T: DeserializeOwned,
    P: Serialize + Validate,
{
    fn new(client: &ApiClient, base: &'static str, unpaged: Option<&'static str>) -> Self {
        Self {
            client: client.clone(),
            base,
            unpaged,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &'static str {
        self.base
    }

    fn item(&self, id: i64) -> String {
        format!("{}/{id}", self.base)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<T>, ApiError> {
        let pairs = query.to_pairs()?;
        let path = match self.unpaged {
            Some(unpaged) if !query.is_paginated() => unpaged,
            _ => self.base,
        };
        let response: ListResponse<T> = self.client.get(path, &pairs).await?;
        Ok(response.into())
    }

    pub async fn get(&self, id: i64) -> Result<T, ApiError> {
        self.client.get(&self.item(id), &[]).await
    }

    /// Validate `payload` locally, then create the record.
    pub async fn create(&self, payload: &P) -> Result<T, ApiError> {
        payload.validate().map_err(FormError::from)?;
        self.client.post(self.base, payload).await
    }

    pub async fn update(&self, id: i64, payload: &P) -> Result<T, ApiError> {
        payload.validate().map_err(FormError::from)?;
        self.client.put(&self.item(id), payload).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&self.item(id)).await
    }
}

pub type Students = Resource<Student, StudentPayload>;
pub type Groups = Resource<Group, GroupPayload>;
pub type Subdivisions = Resource<Subdivision, SubdivisionPayload>;
pub type Users = Resource<User, UserPayload>;
pub type Roles = Resource<RoleRecord, RolePayload>;
pub type Contributions = Resource<Contribution, ContributionPayload>;
pub type Hostels = Resource<HostelResidence, HostelPayload>;

impl Resource<Student, StudentPayload> {
    pub async fn contributions(&self, student_id: i64) -> Result<Vec<Contribution>, ApiError> {
        let response: ListResponse<Contribution> = self
            .client
            .get(&format!("{}/contributions", self.item(student_id)), &[])
            .await?;
        Ok(Page::from(response).items)
    }

    /// Current residency, `None` when the student does not live in a hostel.
    pub async fn hostel(&self, student_id: i64) -> Result<Option<HostelResidence>, ApiError> {
        match self
            .client
            .get(&format!("{}/hostel", self.item(student_id)), &[])
            .await
        {
            Err(ApiError::NotFound { .. }) => Ok(None),
            other => other,
        }
    }
}

impl Resource<Group, GroupPayload> {
    pub async fn students(&self, group_id: i64) -> Result<Vec<Student>, ApiError> {
        let response: ListResponse<Student> = self
            .client
            .get(&format!("{}/students", self.item(group_id)), &[])
            .await?;
        Ok(Page::from(response).items)
    }
}

impl Resource<User, UserPayload> {
    pub async fn add_role(&self, user_id: i64, role_id: i64) -> Result<(), ApiError> {
        self.client
            .post_empty(&format!("{}/roles/{role_id}", self.item(user_id)))
            .await
    }

    pub async fn remove_role(&self, user_id: i64, role_id: i64) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{}/roles/{role_id}", self.item(user_id)))
            .await
    }

    /// Change the signed-in user's own password.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<String, ApiError> {
        change.validate().map_err(FormError::from)?;
        let response: SuccessMessage = self
            .client
            .post(&format!("{}/change-password", self.base), change)
            .await?;
        Ok(response.message)
    }
}

/// Read-only access to the audit log.
#[derive(Clone)]
pub struct AuditLogs {
    client: ApiClient,
}

impl AuditLogs {
    const PATH: &'static str = "/audit-logs";

    pub async fn list(&self, query: &ListQuery) -> Result<Page<AuditLogEntry>, ApiError> {
        let response: ListResponse<AuditLogEntry> =
            self.client.get(Self::PATH, &query.to_pairs()?).await?;
        Ok(response.into())
    }

    /// Distinct action names present in the log.
    pub async fn actions(&self) -> Result<Vec<String>, ApiError> {
        self.client
            .get(&format!("{}/actions", Self::PATH), &[])
            .await
    }

    /// Distinct table names present in the log.
    pub async fn tables(&self) -> Result<Vec<String>, ApiError> {
        self.client.get(&format!("{}/tables", Self::PATH), &[]).await
    }
}

impl ApiClient {
    pub fn students(&self) -> Students {
        Resource::new(self, "/students", Some("/students/list"))
    }

    pub fn groups(&self) -> Groups {
        Resource::new(self, "/groups", Some("/groups/list"))
    }

    pub fn subdivisions(&self) -> Subdivisions {
        Resource::new(self, "/subdivisions", Some("/subdivisions/list"))
    }

    pub fn users(&self) -> Users {
        Resource::new(self, "/users", None)
    }

    pub fn roles(&self) -> Roles {
        Resource::new(self, "/roles", None)
    }

    pub fn contributions(&self) -> Contributions {
        Resource::new(self, "/contributions", None)
    }

    pub fn hostels(&self) -> Hostels {
        Resource::new(self, "/hostels", None)
    }

    pub fn audit_logs(&self) -> AuditLogs {
        AuditLogs {
            client: self.clone(),
        }
    }
}
