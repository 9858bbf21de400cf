use crate::model::FieldSpec;
use crate::query::DEFAULT_SOFT_DELETE_FIELD;

/// Metadata a serializer validates against
///
/// Produced by [`Serializer::meta`](super::Serializer::meta) from the
/// serializer's current state and handed back through
/// [`Serializer::set_meta`](super::Serializer::set_meta).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerMeta {
    /// Model name, e.g. "Article"
    pub model: &'static str,
    /// Writable field descriptors
    pub fields: Vec<FieldSpec>,
    /// Fields clients may send but that are never written
    pub read_only: Vec<String>,
    /// When set, required fields may be omitted
    pub partial: bool,
}

impl SerializerMeta {
    /// Metadata with the primary key and soft-delete column read-only
    pub fn new(model: &'static str, fields: Vec<FieldSpec>) -> Self {
        let mut read_only = vec!["id".to_string(), DEFAULT_SOFT_DELETE_FIELD.to_string()];
        read_only.extend(fields.iter().filter(|f| f.read_only).map(|f| f.name.to_string()));

        Self {
            model,
            fields,
            read_only,
            partial: false,
        }
    }

    #[must_use]
    pub fn with_read_only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.read_only.contains(&field) {
                self.read_only.push(field);
            }
        }
        self
    }

    #[must_use]
    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn is_read_only(&self, field: &str) -> bool {
        self.read_only.iter().any(|f| f == field)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldKind;

    #[test]
    fn test_id_and_soft_delete_are_read_only() {
        let meta = SerializerMeta::new("Article", Vec::new());
        assert!(meta.is_read_only("id"));
        assert!(meta.is_read_only("deleted_at"));
        assert!(!meta.partial);
    }

    #[test]
    fn test_field_level_read_only_is_collected() {
        let meta = SerializerMeta::new(
            "Article",
            vec![
                FieldSpec::new("title", FieldKind::String),
                FieldSpec::new("views", FieldKind::Integer).read_only(),
            ],
        );
        assert!(meta.is_read_only("views"));
        assert!(!meta.is_read_only("title"));
        assert!(meta.field("title").is_some());
    }

    #[test]
    fn test_with_read_only_deduplicates() {
        let meta = SerializerMeta::new("Article", Vec::new()).with_read_only(["id", "author"]);
        assert_eq!(meta.read_only.iter().filter(|f| *f == "id").count(), 1);
        assert!(meta.is_read_only("author"));
    }
}
