// ── Genre ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::port::{Resource, ResourceKind};
use crate::table::ColumnDescriptor;
use crate::table::columns::or_dash;
use crate::validate::{FieldErrors, Validate, check_optional_text, check_text};

const NAME_MAX: usize = 64;
const DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateGenreRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateGenreRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for CreateGenreRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "name", &self.name, NAME_MAX);
        check_optional_text(&mut errors, "description", self.description.as_deref(), DESCRIPTION_MAX);
        errors.into_result()
    }
}

impl Validate for UpdateGenreRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_optional_text(&mut errors, "name", self.name.as_deref(), NAME_MAX);
        check_optional_text(&mut errors, "description", self.description.as_deref(), DESCRIPTION_MAX);
        errors.into_result()
    }
}

impl Resource for Genre {
    const KIND: ResourceKind = ResourceKind::Genres;
    type Create = CreateGenreRequest;
    type Update = UpdateGenreRequest;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::<Self>::new("id", "ID", |g| g.id.to_string()),
            ColumnDescriptor::<Self>::new("name", "Name", |g| g.name.clone())
                .sortable()
                .filterable(),
            ColumnDescriptor::<Self>::new("description", "Description", |g| {
                or_dash(g.description.as_deref())
            }),
            ColumnDescriptor::<Self>::new("created_at", "Created", |g| {
                or_dash(g.created_at.map(|t| t.format("%Y-%m-%d").to_string()).as_deref())
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
    fn blank_name_is_rejected() {
        let errors = CreateGenreRequest {
            name: "  ".into(),
            description: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.get("name"), Some("is required"));
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(UpdateGenreRequest::default().validate().is_ok());
    }
}
