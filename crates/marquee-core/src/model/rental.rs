// ── Rental ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::EntityId;
use crate::port::{Resource, ResourceKind};
use crate::table::ColumnDescriptor;
use crate::table::columns::or_dash;
use crate::validate::{FieldErrors, Validate};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    #[default]
    Active,
    Returned,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    pub id: EntityId,
    #[serde(alias = "userId")]
    pub user_id: EntityId,
    #[serde(alias = "movieId")]
    pub movie_id: EntityId,
    #[serde(default)]
    pub status: RentalStatus,
    #[serde(default, alias = "priceCents")]
    pub price_cents: Option<u64>,
    #[serde(default, alias = "rentedAt")]
    pub rented_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "expiresAt")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRentalRequest {
    pub user_id: Option<EntityId>,
    pub movie_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRentalRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RentalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Validate for CreateRentalRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(self.user_id.is_none(), "user_id", "is required");
        errors.check(self.movie_id.is_none(), "movie_id", "is required");
        errors.check(
            self.expires_at.is_some_and(|t| t <= Utc::now()),
            "expires_at",
            "must be in the future",
        );
        errors.into_result()
    }
}

impl Validate for UpdateRentalRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(
            self.status.is_none() && self.expires_at.is_none(),
            "status",
            "nothing to update",
        );
        errors.into_result()
    }
}

fn format_price(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

impl Resource for Rental {
    const KIND: ResourceKind = ResourceKind::Rentals;
    type Create = CreateRentalRequest;
    type Update = UpdateRentalRequest;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::<Self>::new("id", "ID", |r| r.id.to_string()),
            ColumnDescriptor::<Self>::new("user_id", "User", |r| r.user_id.to_string()).filterable(),
            ColumnDescriptor::<Self>::new("movie_id", "Movie", |r| r.movie_id.to_string()).filterable(),
            ColumnDescriptor::<Self>::new("status", "Status", |r| r.status.to_string())
                .sortable()
                .filterable(),
            ColumnDescriptor::<Self>::new("price_cents", "Price", |r| {
                r.price_cents.map_or_else(|| "-".into(), format_price)
            })
            .sortable(),
            ColumnDescriptor::<Self>::new("rented_at", "Rented", |r| {
                or_dash(r.rented_at.map(|t| t.format("%Y-%m-%d %H:%M").to_string()).as_deref())
            })
            .sortable(),
            ColumnDescriptor::<Self>::new("expires_at", "Expires", |r| {
                or_dash(r.expires_at.map(|t| t.format("%Y-%m-%d %H:%M").to_string()).as_deref())
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
    fn create_requires_user_and_movie() {
        let errors = CreateRentalRequest::default().validate().unwrap_err();
        assert_eq!(errors.get("user_id"), Some("is required"));
        assert_eq!(errors.get("movie_id"), Some("is required"));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("RETURNED".parse::<RentalStatus>().unwrap(), RentalStatus::Returned);
    }

    #[test]
    fn price_renders_with_cents() {
        assert_eq!(format_price(399), "3.99");
        assert_eq!(format_price(1000), "10.00");
    }
}
