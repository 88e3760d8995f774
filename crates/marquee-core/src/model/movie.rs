// ── Movie ──
//
// Poster and video fields hold public blob URLs produced by the upload
// pipeline; the movie form never carries file bytes itself.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::EntityId;
use crate::port::{Resource, ResourceKind};
use crate::table::ColumnDescriptor;
use crate::table::columns::or_dash;
use crate::validate::{FieldErrors, Validate, check_optional_text, check_text};

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 4000;
const FIRST_FILM_YEAR: i32 = 1888;
const MAX_RUNTIME_MINUTES: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "releaseYear")]
    pub release_year: Option<i32>,
    #[serde(default, alias = "durationMinutes")]
    pub duration_minutes: Option<u32>,
    #[serde(default, alias = "genreId")]
    pub genre_id: Option<EntityId>,
    #[serde(default, alias = "tagIds")]
    pub tag_ids: Vec<EntityId>,
    #[serde(default, alias = "posterUrl")]
    pub poster_url: Option<Url>,
    #[serde(default, alias = "videoUrl")]
    pub video_url: Option<Url>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateMovieRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<Url>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateMovieRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<Url>,
}

fn check_numbers(errors: &mut FieldErrors, year: Option<i32>, minutes: Option<u32>) {
    let latest = Utc::now().year() + 5;
    errors.check(
        year.is_some_and(|y| !(FIRST_FILM_YEAR..=latest).contains(&y)),
        "release_year",
        &format!("must be between {FIRST_FILM_YEAR} and {latest}"),
    );
    errors.check(
        minutes.is_some_and(|m| m == 0 || m > MAX_RUNTIME_MINUTES),
        "duration_minutes",
        &format!("must be between 1 and {MAX_RUNTIME_MINUTES}"),
    );
}

impl Validate for CreateMovieRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", &self.title, TITLE_MAX);
        check_optional_text(&mut errors, "description", self.description.as_deref(), DESCRIPTION_MAX);
        check_numbers(&mut errors, self.release_year, self.duration_minutes);
        errors.into_result()
    }
}

impl Validate for UpdateMovieRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_optional_text(&mut errors, "title", self.title.as_deref(), TITLE_MAX);
        check_optional_text(&mut errors, "description", self.description.as_deref(), DESCRIPTION_MAX);
        check_numbers(&mut errors, self.release_year, self.duration_minutes);
        errors.into_result()
    }
}

impl Resource for Movie {
    const KIND: ResourceKind = ResourceKind::Movies;
    type Create = CreateMovieRequest;
    type Update = UpdateMovieRequest;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::<Self>::new("id", "ID", |m| m.id.to_string()),
            ColumnDescriptor::<Self>::new("title", "Title", |m| m.title.clone())
                .sortable()
                .filterable(),
            ColumnDescriptor::<Self>::new("release_year", "Year", |m| or_dash(m.release_year.as_ref()))
                .sortable()
                .filterable(),
            ColumnDescriptor::<Self>::new("duration_minutes", "Runtime", |m| {
                m.duration_minutes
                    .map_or_else(|| "-".into(), |d| format!("{d} min"))
            })
            .sortable(),
            ColumnDescriptor::<Self>::new("genre_id", "Genre", |m| or_dash(m.genre_id.as_ref()))
                .filterable(),
            ColumnDescriptor::<Self>::new("tag_ids", "Tags", |m| {
                m.tag_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            }),
            ColumnDescriptor::<Self>::new("poster_url", "Poster", |m| or_dash(m.poster_url.as_ref())),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_numbers_are_reported_per_field() {
        let req = CreateMovieRequest {
            title: "Metropolis".into(),
            release_year: Some(1500),
            duration_minutes: Some(0),
            ..Default::default()
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.get("release_year").is_some());
        assert!(errors.get("duration_minutes").is_some());
    }

    #[test]
    fn deserializes_camel_case_payload() {
        let movie: Movie = serde_json::from_value(serde_json::json!({
            "id": "m1",
            "title": "Metropolis",
            "releaseYear": 1927,
            "tagIds": ["silent", "sci-fi"],
            "posterUrl": "https://cdn.example.com/p.png"
        }))
        .unwrap();
        assert_eq!(movie.release_year, Some(1927));
        assert_eq!(movie.tag_ids.len(), 2);
        assert!(movie.video_url.is_none());
    }
}
