//! ---
//! su_section: "05-networking-external-interfaces"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "REST client wrapper and resource clients for the union API."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
//! List queries and list response normalisation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::FormError;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    /// Present only for paginated envelopes.
    pub page: Option<u32>,
    pub pages: Option<u32>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Envelope or bare array, as returned by list endpoints.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Envelope {
        items: Vec<T>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
        #[serde(default)]
        pages: Option<u32>,
    },
    Bare(Vec<T>),
}

impl<T> From<ListResponse<T>> for Page<T> {
    fn from(response: ListResponse<T>) -> Self {
        match response {
            ListResponse::Envelope {
                items,
                total,
                page,
                pages,
            } => Page {
                total: total.unwrap_or(items.len() as u64),
                items,
                page,
                pages,
            },
            ListResponse::Bare(items) => Page {
                total: items.len() as u64,
                items,
                page: None,
                pages: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query parameters of a list request.
///
/// Without `page` and `size` the unpaginated variant of the endpoint is used
/// where one exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct ListQuery {
    #[validate(range(min = 1, message = "page numbers start at 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "page size must be between 1 and 100"))]
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    /// Endpoint specific filters such as `group_id` or `search`.
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32, size: u32) -> Self {
        self.page = Some(page);
        self.size = Some(size);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((key.into(), value.to_string()));
        self
    }

    pub fn is_paginated(&self) -> bool {
        self.page.is_some() || self.size.is_some()
    }

    /// Validate and flatten into query pairs.
    pub fn to_pairs(&self) -> Result<Vec<(String, String)>, FormError> {
        self.validate()?;
        let mut pairs = Vec::with_capacity(self.filters.len() + 4);
        if let Some(page) = self.page {
            pairs.push(("page".to_owned(), page.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size".to_owned(), size.to_string()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by".to_owned(), sort_by.clone()));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sort_order".to_owned(), order.as_str().to_owned()));
        }
        pairs.extend(self.filters.iter().cloned());
        Ok(pairs)
    }
}
