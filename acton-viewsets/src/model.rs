//! Model descriptor and typed result containers
//!
//! A [`Model`] is any serde-serializable entity with an integer primary key
//! and a soft-delete timestamp. The trait carries the per-model factory for
//! [`ModelSlice`] so a generic ViewSet can build a correctly typed result
//! container without knowing the concrete entity type.
//!
//! # Example
//!
//! ```rust
//! use acton_viewsets::model::{FieldKind, FieldSpec, Model, ModelId};
//! use chrono::{DateTime, Utc};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Tag {
//!     #[serde(default)]
//!     id: ModelId,
//!     label: String,
//!     #[serde(default)]
//!     deleted_at: Option<DateTime<Utc>>,
//! }
//!
//! impl Model for Tag {
//!     const NAME: &'static str = "Tag";
//!
//!     fn id(&self) -> ModelId { self.id }
//!     fn set_id(&mut self, id: ModelId) { self.id = id; }
//!     fn deleted_at(&self) -> Option<DateTime<Utc>> { self.deleted_at }
//!     fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) { self.deleted_at = at; }
//!
//!     fn fields() -> Vec<FieldSpec> {
//!         vec![FieldSpec::new("label", FieldKind::String).required().max_length(32)]
//!     }
//! }
//!
//! let tags = Tag::new_collection();
//! assert!(tags.is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Primary key type shared by every model
pub type ModelId = i64;

/// Parse a path identifier into a primary key
///
/// Identifiers that are not integers cannot match any row.
pub fn parse_model_id(raw: &str) -> Option<ModelId> {
    raw.trim().parse::<ModelId>().ok()
}

/// An entity type served by a ViewSet
pub trait Model: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Human-readable entity name used in errors and logs
    const NAME: &'static str;

    /// Primary key
    fn id(&self) -> ModelId;

    /// Assign the primary key
    fn set_id(&mut self, id: ModelId);

    /// Soft-delete timestamp, `None` for active rows
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Set or clear the soft-delete timestamp
    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    /// Writable field descriptors consulted by serializer validation
    fn fields() -> Vec<FieldSpec> {
        Vec::new()
    }

    /// Build a fresh, empty container for this model
    ///
    /// Every call returns a new container; callers never share one.
    fn new_collection() -> ModelSlice<Self> {
        ModelSlice::new()
    }
}

/// Ordered, growable container of entities of one model type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelSlice<M> {
    items: Vec<M>,
}

impl<M> ModelSlice<M> {
    /// Create an empty container
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create an empty container with reserved capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: M) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove every entity, keeping the allocation
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace the contents with `items`
    pub fn replace(&mut self, items: impl IntoIterator<Item = M>) {
        self.items.clear();
        self.items.extend(items);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[M] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<M> {
        self.items
    }
}

impl<M> Default for ModelSlice<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> From<Vec<M>> for ModelSlice<M> {
    fn from(items: Vec<M>) -> Self {
        Self { items }
    }
}

impl<M> FromIterator<M> for ModelSlice<M> {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<M> Extend<M> for ModelSlice<M> {
    fn extend<I: IntoIterator<Item = M>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<M> IntoIterator for ModelSlice<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, M> IntoIterator for &'a ModelSlice<M> {
    type Item = &'a M;
    type IntoIter = std::slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// JSON type accepted by a writable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    /// RFC 3339 timestamp string
    Timestamp,
    /// Any JSON value
    Any,
}

impl FieldKind {
    /// Whether a non-null JSON value has this kind
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Timestamp => value
                .as_str()
                .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
                .unwrap_or(false),
            Self::Any => true,
        }
    }

    /// Short name used in validation messages
    pub fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Float => "a number",
            Self::Boolean => "a boolean",
            Self::Timestamp => "an RFC 3339 timestamp",
            Self::Any => "a value",
        }
    }
}

/// Description of one model field for payload validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub read_only: bool,
    pub max_length: Option<usize>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            read_only: false,
            max_length: None,
        }
    }

    /// Field must be present and non-null on create
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Field may not be written by clients
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Maximum length in characters for string fields
    #[must_use]
    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(default)]
        id: ModelId,
        body: String,
        #[serde(default)]
        deleted_at: Option<DateTime<Utc>>,
    }

    impl Model for Note {
        const NAME: &'static str = "Note";

        fn id(&self) -> ModelId {
            self.id
        }

        fn set_id(&mut self, id: ModelId) {
            self.id = id;
        }

        fn deleted_at(&self) -> Option<DateTime<Utc>> {
            self.deleted_at
        }

        fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
            self.deleted_at = at;
        }
    }

    fn note(id: ModelId) -> Note {
        Note {
            id,
            body: format!("note {id}"),
            deleted_at: None,
        }
    }

    #[test]
    fn test_new_collection_never_aliases() {
        let mut first = Note::new_collection();
        let second = Note::new_collection();

        first.push(note(1));

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn test_replace_discards_previous_contents() {
        let mut slice: ModelSlice<Note> = vec![note(1), note(2), note(3)].into();
        slice.replace(vec![note(9)]);

        assert_eq!(slice.len(), 1);
        assert_eq!(slice.as_slice()[0].id, 9);
    }

    #[test]
    fn test_slice_serializes_as_array() {
        let slice: ModelSlice<Note> = vec![note(1)].into();
        let json = serde_json::to_value(&slice).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], 1);
    }

    #[test]
    fn test_parse_model_id() {
        assert_eq!(parse_model_id("42"), Some(42));
        assert_eq!(parse_model_id(" 7 "), Some(7));
        assert_eq!(parse_model_id("abc"), None);
        assert_eq!(parse_model_id(""), None);
    }

    #[test]
    fn test_field_kind_accepts() {
        assert!(FieldKind::String.accepts(&Value::from("x")));
        assert!(!FieldKind::String.accepts(&Value::from(1)));
        assert!(FieldKind::Integer.accepts(&Value::from(3)));
        assert!(!FieldKind::Integer.accepts(&Value::from(3.5)));
        assert!(FieldKind::Float.accepts(&Value::from(3)));
        assert!(FieldKind::Boolean.accepts(&Value::from(false)));
        assert!(FieldKind::Timestamp.accepts(&Value::from("2024-01-02T03:04:05Z")));
        assert!(!FieldKind::Timestamp.accepts(&Value::from("yesterday")));
        assert!(FieldKind::Any.accepts(&Value::Null));
    }

    #[test]
    fn test_field_spec_builder() {
        let spec = FieldSpec::new("title", FieldKind::String)
            .required()
            .max_length(10);
        assert!(spec.required);
        assert!(!spec.read_only);
        assert_eq!(spec.max_length, Some(10));
    }
}
