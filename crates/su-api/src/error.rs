//! ---
//! su_section: "05-networking-external-interfaces"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "REST client wrapper and resource clients for the union API."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use su_security::AuthError;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Errors surfaced by the REST client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server rejected the credentials; the session has been invalidated.
    #[error("not authenticated")]
    Unauthorized { detail: Option<String> },
    #[error("forbidden{}", suffix(.detail))]
    Forbidden { detail: Option<String> },
    #[error("not found{}", suffix(.detail))]
    NotFound { detail: Option<String> },
    /// The server refused the payload (400 or 422).
    #[error("request rejected ({status}){}", suffix(.detail))]
    Validation { status: u16, detail: Option<String> },
    /// Local form validation failed; nothing was sent.
    #[error("{0}")]
    Form(#[from] FormError),
    #[error("server error ({status}){}", suffix(.detail))]
    Server { status: u16, detail: Option<String> },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

fn suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

impl ApiError {
    /// Map a non-success status and its body onto an error.
    pub(crate) fn from_status(status: u16, body: &[u8]) -> Self {
        let detail = extract_detail(body);
        match status {
            401 => ApiError::Unauthorized { detail },
            403 => ApiError::Forbidden { detail },
            404 => ApiError::NotFound { detail },
            400 | 422 => ApiError::Validation { status, detail },
            _ => ApiError::Server { status, detail },
        }
    }

    /// HTTP status behind the error, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Validation { status, .. } | ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Reason supplied by the server, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail }
            | ApiError::Forbidden { detail }
            | ApiError::NotFound { detail }
            | ApiError::Validation { detail, .. }
            | ApiError::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(err) => AuthError::Transport(err.to_string()),
            ApiError::Decode(message) | ApiError::InvalidUrl(message) => AuthError::Decode(message),
            ApiError::Form(form) => AuthError::Rejected {
                status: 0,
                detail: Some(form.to_string()),
            },
            other => AuthError::Rejected {
                status: other.status().unwrap_or_default(),
                detail: other.detail().map(str::to_owned),
            },
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// Pull the `detail` out of an error body.
///
/// Accepts a plain string or a list of `{loc, msg}` entries; list messages
/// are joined with `"; "`.
pub fn extract_detail(body: &[u8]) -> Option<String> {
    let body: ErrorBody = serde_json::from_slice(body).ok()?;
    match body.detail {
        Value::String(detail) => Some(detail),
        Value::Array(entries) => {
            let messages: Vec<String> = entries
                .iter()
                .filter_map(|entry| {
                    let msg = entry.get("msg")?.as_str()?;
                    let field = entry
                        .get("loc")
                        .and_then(Value::as_array)
                        .and_then(|loc| loc.last())
                        .and_then(Value::as_str);
                    Some(match field {
                        Some(field) => format!("{field}: {msg}"),
                        None => msg.to_owned(),
                    })
                })
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Per-field messages produced by local form validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormError {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormError {
    /// Messages for `field`, using dotted paths for nested forms.
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn collect(&mut self, prefix: Option<&str>, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let path = match prefix {
                Some(prefix) => format!("{prefix}.{field}"),
                None => field.to_string(),
            };
            match kind {
                ValidationErrorsKind::Field(errors) => {
                    let messages = self.fields.entry(path).or_default();
                    for error in errors {
                        messages.push(
                            error
                                .message
                                .as_ref()
                                .map(|message| message.to_string())
                                .unwrap_or_else(|| error.code.to_string()),
                        );
                    }
                }
                ValidationErrorsKind::Struct(nested) => self.collect(Some(&path), nested),
                ValidationErrorsKind::List(items) => {
                    for (index, nested) in items {
                        self.collect(Some(&format!("{path}[{index}]")), nested);
                    }
                }
            }
        }
    }
}

impl From<ValidationErrors> for FormError {
    fn from(errors: ValidationErrors) -> Self {
        let mut form = FormError::default();
        form.collect(None, &errors);
        form
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid form")?;
        for (index, (field, messages)) in self.fields().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{field} ({})", messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for FormError {}
