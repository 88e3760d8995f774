// ── User ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::EntityId;
use crate::port::{Resource, ResourceKind};
use crate::table::ColumnDescriptor;
use crate::table::columns::or_dash;
use crate::validate::{FieldErrors, Validate, check_optional_text, check_text};

const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 254;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Editor,
    #[default]
    Viewer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

/// Shape check only; the API owns deliverability.
fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "email", &self.email, EMAIL_MAX);
        errors.check(!looks_like_email(&self.email), "email", "is not a valid address");
        check_optional_text(&mut errors, "name", self.name.as_deref(), NAME_MAX);
        errors.into_result()
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_optional_text(&mut errors, "email", self.email.as_deref(), EMAIL_MAX);
        errors.check(
            self.email.as_deref().is_some_and(|e| !looks_like_email(e)),
            "email",
            "is not a valid address",
        );
        check_optional_text(&mut errors, "name", self.name.as_deref(), NAME_MAX);
        errors.into_result()
    }
}

impl Resource for User {
    const KIND: ResourceKind = ResourceKind::Users;
    type Create = CreateUserRequest;
    type Update = UpdateUserRequest;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::<Self>::new("id", "ID", |u| u.id.to_string()),
            ColumnDescriptor::<Self>::new("email", "Email", |u| u.email.clone())
                .sortable()
                .filterable(),
            ColumnDescriptor::<Self>::new("name", "Name", |u| or_dash(u.name.as_deref())).sortable(),
            ColumnDescriptor::<Self>::new("role", "Role", |u| u.role.to_string()).filterable(),
            ColumnDescriptor::<Self>::new("created_at", "Created", |u| {
                or_dash(u.created_at.map(|t| t.format("%Y-%m-%d").to_string()).as_deref())
            })
            .sortable(),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(looks_like_email("ops@example.com"));
        assert!(!looks_like_email("ops@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ops @example.com"));
    }

    #[test]
    fn blank_email_reports_required_first() {
        let errors = CreateUserRequest::default().validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("is required"));
    }
}
