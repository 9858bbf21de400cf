//! Field-level validation errors collected by serializers

use serde::{Deserialize, Serialize};

/// One problem with one payload field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name, or `non_field_errors` for payload-wide problems
    pub field: String,
    /// Error code (e.g. "REQUIRED", "INVALID_TYPE", "TOO_LONG")
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Field name used for errors that do not belong to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Ordered collection of field errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against `field`
    pub fn add(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldError::new(field, code, message));
    }

    /// Record an error that is not tied to one field
    pub fn add_non_field(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.add(NON_FIELD_ERRORS, code, message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Errors recorded against `field`
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }
}

impl Extend<FieldError> for ValidationErrors {
    fn extend<I: IntoIterator<Item = FieldError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_query() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("title", "REQUIRED", "title is required");
        errors.add("title", "TOO_LONG", "title is too long");
        errors.add_non_field("INVALID", "payload rejected");

        assert_eq!(errors.len(), 3);
        assert!(errors.has_field("title"));
        assert!(errors.has_field(NON_FIELD_ERRORS));
        assert!(!errors.has_field("body"));
        assert_eq!(errors.for_field("title").count(), 2);
    }

    #[test]
    fn test_serializes_as_list() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "REQUIRED", "title is required");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json[0]["field"], "title");
        assert_eq!(json[0]["code"], "REQUIRED");
    }
}
