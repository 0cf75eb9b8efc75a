//! ---
//! su_section: "05-networking-external-interfaces"
//! su_subsection: "module"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "REST client wrapper and resource clients for the union API."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
//! Entity records returned by the API and the payloads sent to it.
//!
//! Payloads carry the same range rules the server enforces so forms can be
//! rejected before any request goes out.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use su_security::RoleRef;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subdivision {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SubdivisionPayload {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub subdivision_id: i64,
    #[serde(default)]
    pub subdivision: Option<Subdivision>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GroupPayload {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(range(min = 2000, max = 2100, message = "year must be between 2000 and 2100"))]
    pub year: i32,
    #[validate(range(min = 1, message = "subdivision is required"))]
    pub subdivision_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct StudentData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}

/// Student record. `isactive` and `isbudget` are accepted for older servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub full_name: String,
    pub group_id: i64,
    #[serde(alias = "isactive", default)]
    pub is_active: bool,
    #[serde(alias = "isbudget", default)]
    pub is_budget: bool,
    pub year: i32,
    #[serde(default)]
    pub data: Option<StudentData>,
    #[serde(default)]
    pub hostel: Option<HostelResidence>,
    #[serde(default)]
    pub group: Option<Group>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StudentPayload {
    #[validate(length(min = 1, message = "full name is required"))]
    pub full_name: String,
    #[validate(range(min = 1, message = "group is required"))]
    pub group_id: i64,
    pub is_active: bool,
    pub is_budget: bool,
    #[validate(range(min = 2000, max = 2100, message = "year must be between 2000 and 2100"))]
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub data: Option<StudentData>,
}

/// Hostel residency of a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostelResidence {
    pub id: i64,
    pub student_id: i64,
    pub hostel: i32,
    pub room: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct HostelPayload {
    #[validate(range(min = 1, message = "student is required"))]
    pub student_id: i64,
    #[validate(range(min = 1, max = 20, message = "hostel must be between 1 and 20"))]
    pub hostel: i32,
    #[validate(range(min = 1, max = 9999, message = "room must be between 1 and 9999"))]
    pub room: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: i64,
    pub student_id: i64,
    pub semester: i32,
    #[serde(with = "amount")]
    pub amount: f64,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ContributionPayload {
    #[validate(range(min = 1, message = "student is required"))]
    pub student_id: i64,
    #[validate(range(min = 1, max = 2, message = "semester must be 1 or 2"))]
    pub semester: i32,
    #[serde(with = "amount")]
    #[validate(range(
        min = 0.0,
        exclusive_max = 100000.0,
        message = "amount must be at least 0 and below 100000"
    ))]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[validate(range(min = 2000, max = 2100, message = "year must be between 2000 and 2100"))]
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RolePayload {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(alias = "login")]
    pub username: String,
    #[serde(default)]
    pub subdivision_id: Option<i64>,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
    #[serde(default)]
    pub subdivision: Option<Subdivision>,
}

/// Create or update a user. The password may be omitted on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserPayload {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivision_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PasswordChange {
    #[validate(length(min = 1, message = "current password is required"))]
    pub old_password: String,
    #[validate(length(min = 1, message = "new password is required"))]
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_login: Option<String>,
    pub action: String,
    pub table_name: String,
    #[serde(default)]
    pub record_id: Option<i64>,
    #[serde(default)]
    pub old_data: Option<String>,
    #[serde(default)]
    pub new_data: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<NaiveDateTime>,
}

/// Server timestamps arrive with or without an offset; offsets are folded to UTC.
fn timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.naive_utc()));
    }
    raw.parse::<NaiveDateTime>()
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Success envelope returned by delete and role-assignment endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessMessage {
    pub message: String,
}

/// Monetary amounts travel as decimal strings; numbers are accepted too.
mod amount {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{value:.2}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormError;
    use serde_json::json;

    #[test]
    fn student_accepts_legacy_flag_names() {
        let student: Student = serde_json::from_value(json!({
            "id": 1,
            "full_name": "Иванов Иван",
            "group_id": 4,
            "isactive": true,
            "isbudget": false,
            "year": 2023,
            "data": {"phone": "+7 900 000-00-00", "birth_date": "2004-05-17"}
        }))
        .unwrap();
        assert!(student.is_active);
        assert!(!student.is_budget);
        assert_eq!(
            student.data.unwrap().birth_date,
            NaiveDate::from_ymd_opt(2004, 5, 17)
        );
        let canonical: Student = serde_json::from_value(json!({
            "id": 2, "full_name": "x", "group_id": 1, "is_active": true,
            "is_budget": true, "year": 2024
        }))
        .unwrap();
        let value = serde_json::to_value(&canonical).unwrap();
        assert_eq!(value["is_active"], true);
        assert!(value.get("isactive").is_none());
    }

    #[test]
    fn contribution_amount_accepts_string_and_number() {
        let from_text: Contribution = serde_json::from_value(json!({
            "id": 1, "student_id": 3, "semester": 1, "amount": "1500.50", "year": 2024
        }))
        .unwrap();
        assert_eq!(from_text.amount, 1500.5);
        let from_number: Contribution = serde_json::from_value(json!({
            "id": 1, "student_id": 3, "semester": 2, "amount": 300, "year": 2024,
            "payment_date": "2024-09-01"
        }))
        .unwrap();
        assert_eq!(from_number.amount, 300.0);
        assert_eq!(
            serde_json::to_value(&from_number).unwrap()["amount"],
            "300.00"
        );
    }

    #[test]
    fn payload_ranges_match_server_rules() {
        let contribution = ContributionPayload {
            student_id: 3,
            semester: 3,
            amount: 100000.0,
            payment_date: None,
            year: 1999,
        };
        let form = FormError::from(contribution.validate().unwrap_err());
        assert_eq!(form.field("semester"), ["semester must be 1 or 2".to_string()]);
        assert!(!form.field("amount").is_empty());
        assert!(!form.field("year").is_empty());
        assert!(form.field("student_id").is_empty());

        let hostel = HostelPayload {
            student_id: 1,
            hostel: 20,
            room: 9999,
            comment: None,
        };
        assert!(hostel.validate().is_ok());
    }

    #[test]
    fn nested_student_data_is_validated() {
        let payload = StudentPayload {
            full_name: "Петров Пётр".into(),
            group_id: 2,
            is_active: true,
            is_budget: true,
            year: 2024,
            data: Some(StudentData {
                email: Some("not-an-email".into()),
                ..StudentData::default()
            }),
        };
        let form = FormError::from(payload.validate().unwrap_err());
        assert_eq!(form.field("data.email"), ["invalid email address".to_string()]);
    }

    #[test]
    fn audit_entry_timestamps_with_and_without_offset() {
        let naive: AuditLogEntry = serde_json::from_value(json!({
            "id": 1, "action": "CREATE", "table_name": "students",
            "created_at": "2024-03-01T10:15:00"
        }))
        .unwrap();
        let offset: AuditLogEntry = serde_json::from_value(json!({
            "id": 2, "action": "DELETE", "table_name": "groups",
            "created_at": "2024-03-01T13:15:00+03:00", "user_login": "admin"
        }))
        .unwrap();
        assert_eq!(naive.created_at, offset.created_at);
        assert_eq!(offset.user_login.as_deref(), Some("admin"));
    }

    #[test]
    fn users_deserialize_with_role_objects() {
        let user: User = serde_json::from_value(json!({
            "id": 5, "login": "deputy", "subdivision_id": null,
            "roles": [{"id": 2, "name": "DEPUTY_CHAIRMAN"}]
        }))
        .unwrap();
        assert_eq!(user.username, "deputy");
        assert_eq!(user.roles[0].display_name(), "Заместитель председателя");
    }
}
