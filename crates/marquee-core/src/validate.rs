// ── Form validation ──
//
// Input types validate themselves before any network call. Failures are
// reported per field so a front end can render them inline.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Per-field validation messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Record `message` for `field` when `failed` is true.
    pub fn check(&mut self, failed: bool, field: &str, message: &str) {
        if failed {
            self.add(field, message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Schema check run by [`ModalController::submit`](crate::ModalController::submit)
/// before the submit handler sees the values.
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

/// Body-less forms (delete confirmations) are always valid.
impl Validate for () {
    fn validate(&self) -> Result<(), FieldErrors> {
        Ok(())
    }
}

/// Shared rule: required, trimmed, bounded text.
pub(crate) fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "is required");
    } else if trimmed.chars().count() > max {
        errors.add(field, format!("must be at most {max} characters"));
    }
}

/// Shared rule: optional text, bounded when present.
pub(crate) fn check_optional_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max: usize,
) {
    if let Some(v) = value {
        if v.trim().is_empty() {
            errors.add(field, "must not be blank");
        } else if v.chars().count() > max {
            errors.add(field, format!("must be at most {max} characters"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.add("name", "is required");
        errors.add("name", "too long");
        assert_eq!(errors.get("name"), Some("is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn display_joins_fields_in_order() {
        let mut errors = FieldErrors::new();
        errors.add("title", "is required");
        errors.add("duration", "must be positive");
        assert_eq!(
            errors.to_string(),
            "duration: must be positive; title: is required"
        );
    }

    #[test]
    fn text_rules() {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "name", "   ", 10);
        check_text(&mut errors, "slug", "abcdefghijk", 10);
        check_optional_text(&mut errors, "note", Some(""), 10);
        check_optional_text(&mut errors, "desc", None, 10);
        assert_eq!(errors.get("name"), Some("is required"));
        assert_eq!(errors.get("slug"), Some("must be at most 10 characters"));
        assert_eq!(errors.get("note"), Some("must not be blank"));
        assert!(errors.get("desc").is_none());
    }
}
