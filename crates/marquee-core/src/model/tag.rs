// ── Tag ──

use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::port::{Resource, ResourceKind};
use crate::table::ColumnDescriptor;
use crate::validate::{FieldErrors, Validate, check_optional_text, check_text};

const NAME_MAX: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTagRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Validate for CreateTagRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "name", &self.name, NAME_MAX);
        errors.check(
            self.name.trim().contains(char::is_whitespace),
            "name",
            "must be a single word",
        );
        errors.into_result()
    }
}

impl Validate for UpdateTagRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_optional_text(&mut errors, "name", self.name.as_deref(), NAME_MAX);
        errors.check(
            self.name
                .as_deref()
                .is_some_and(|n| n.trim().contains(char::is_whitespace)),
            "name",
            "must be a single word",
        );
        errors.into_result()
    }
}

impl Resource for Tag {
    const KIND: ResourceKind = ResourceKind::Tags;
    type Create = CreateTagRequest;
    type Update = UpdateTagRequest;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::<Self>::new("id", "ID", |t| t.id.to_string()),
            ColumnDescriptor::<Self>::new("name", "Name", |t| t.name.clone())
                .sortable()
                .filterable(),
        ]
    }
}
