use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{
    Serializer, SerializerContext, SerializerHooks, SerializerMeta, SerializerTemplate,
    ValidationErrors,
};
use crate::handlers::ApiError;
use crate::model::Model;
use crate::query::QuerySource;
use crate::viewsets::Action;

/// Hooks that keep the base behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

#[async_trait]
impl<M: Model> SerializerHooks<M> for DefaultHooks {}

/// Serializer driven by a model's [`FieldSpec`](crate::model::FieldSpec) list
///
/// Field checks run in declaration order: required, type, then length.
/// Read-only fields in the payload are dropped, not rejected.
pub struct ModelSerializer<M: Model> {
    source: Arc<dyn QuerySource<M>>,
    extra_read_only: Vec<String>,
    context: Option<SerializerContext>,
    meta: SerializerMeta,
    data: Option<Value>,
    errors: ValidationErrors,
    validated: bool,
    child: Option<Arc<dyn SerializerHooks<M>>>,
}

impl<M: Model> ModelSerializer<M> {
    pub fn new(source: Arc<dyn QuerySource<M>>) -> Self {
        Self {
            source,
            extra_read_only: Vec::new(),
            context: None,
            meta: SerializerMeta::new(M::NAME, M::fields()),
            data: None,
            errors: ValidationErrors::new(),
            validated: false,
            child: None,
        }
    }

    /// Mark additional fields read-only
    #[must_use]
    pub fn with_read_only(mut self, fields: Vec<String>) -> Self {
        self.extra_read_only = fields;
        self
    }

    pub fn context(&self) -> Option<&SerializerContext> {
        self.context.as_ref()
    }

    pub fn current_meta(&self) -> &SerializerMeta {
        &self.meta
    }

    /// Bound payload, before read-only fields are removed
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Payload with read-only fields removed, once validation has passed
    pub fn validated_data(&self) -> Option<Value> {
        if !self.validated || !self.errors.is_empty() {
            return None;
        }
        let Some(Value::Object(map)) = &self.data else {
            return None;
        };

        let cleaned: Map<String, Value> = map
            .iter()
            .filter(|(key, _)| !self.meta.is_read_only(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Some(Value::Object(cleaned))
    }

    /// Insert a new entity built from `data`
    ///
    /// New entities always start active.
    pub async fn save_new(&self, data: Value) -> Result<M, ApiError> {
        let mut entity: M = decode_entity(data)?;
        entity.set_deleted_at(None);
        let created = self.source.insert(entity).await?;
        tracing::info!(entity = M::NAME, id = created.id(), "entity created");
        Ok(created)
    }

    /// Merge `data` over `instance` and save it
    ///
    /// Fields absent from `data` keep their current values. The id and the
    /// soft-delete timestamp always come from `instance`.
    pub async fn save_existing(&self, instance: M, data: Value) -> Result<M, ApiError> {
        let mut doc = serde_json::to_value(&instance)
            .map_err(|e| ApiError::internal(format!("Failed to encode {}: {e}", M::NAME)))?;

        if let (Value::Object(target), Value::Object(changes)) = (&mut doc, data) {
            for (key, value) in changes {
                target.insert(key, value);
            }
        }

        let mut updated: M = decode_entity(doc)?;
        updated.set_id(instance.id());
        updated.set_deleted_at(instance.deleted_at());

        let saved = self.source.save(updated).await?;
        tracing::info!(entity = M::NAME, id = saved.id(), "entity updated");
        Ok(saved)
    }

    fn hooks(&self) -> Arc<dyn SerializerHooks<M>> {
        match &self.child {
            Some(child) => Arc::clone(child),
            None => Arc::new(DefaultHooks),
        }
    }

    fn check_fields(&mut self) {
        let Some(data) = &self.data else {
            self.errors.add_non_field("INVALID", "No payload was bound");
            return;
        };
        let Value::Object(map) = data else {
            self.errors.add_non_field("INVALID", "Expected a JSON object");
            return;
        };

        for spec in &self.meta.fields {
            if self.meta.is_read_only(spec.name) {
                continue;
            }

            match map.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required && !self.meta.partial {
                        self.errors.add(
                            spec.name,
                            "REQUIRED",
                            format!("{} is required", spec.name),
                        );
                    }
                }
                Some(value) if !spec.kind.accepts(value) => {
                    self.errors.add(
                        spec.name,
                        "INVALID_TYPE",
                        format!("{} must be {}", spec.name, spec.kind.describe()),
                    );
                }
                Some(value) => {
                    if let (Some(max), Some(text)) = (spec.max_length, value.as_str()) {
                        if text.chars().count() > max {
                            self.errors.add(
                                spec.name,
                                "TOO_LONG",
                                format!("{} must be at most {max} characters", spec.name),
                            );
                        }
                    }
                }
            }
        }
    }

    fn ensure_validated(&self) -> Result<Value, ApiError> {
        self.validated_data().ok_or_else(|| {
            ApiError::internal(format!(
                "{} serializer used before successful validation",
                M::NAME
            ))
        })
    }
}

fn decode_entity<M: Model>(doc: Value) -> Result<M, ApiError> {
    serde_json::from_value(doc).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add_non_field("INVALID", e.to_string());
        ApiError::validation_failed(errors)
    })
}

#[async_trait]
impl<M: Model> Serializer<M> for ModelSerializer<M> {
    fn set_context(&mut self, ctx: SerializerContext) {
        self.context = Some(ctx);
    }

    fn meta(&self) -> SerializerMeta {
        let partial = self
            .context
            .as_ref()
            .is_some_and(|ctx| ctx.action == Action::Update);

        let mut meta = SerializerMeta::new(M::NAME, M::fields())
            .with_read_only(self.extra_read_only.iter().cloned())
            .partial(partial);
        if let Some(ctx) = &self.context {
            meta = meta.with_read_only([ctx.soft_delete_field.as_str()]);
        }
        meta
    }

    fn set_meta(&mut self, meta: SerializerMeta) {
        self.meta = meta;
    }

    fn bind(&mut self, payload: &[u8]) -> Result<(), ApiError> {
        let bytes: &[u8] = if payload.is_empty() { b"{}" } else { payload };
        let value: Value = serde_json::from_slice(bytes).map_err(|e| {
            ApiError::internal(format!("Failed to bind {} payload: {e}", M::NAME))
        })?;

        self.data = Some(value);
        self.validated = false;
        self.errors.clear();
        Ok(())
    }

    fn set_child(&mut self, child: Arc<dyn SerializerHooks<M>>) {
        self.child = Some(child);
    }

    async fn is_valid(&mut self) -> bool {
        self.errors.clear();
        self.check_fields();

        if let Some(data) = self.data.clone() {
            let hooks = self.hooks();
            let mut extra = ValidationErrors::new();
            hooks.validate(&data, self.context.as_ref(), &mut extra).await;
            self.errors.extend(extra.into_vec());
        }

        self.validated = true;
        let valid = self.errors.is_empty();
        tracing::debug!(entity = M::NAME, valid, errors = self.errors.len(), "serializer validated");
        valid
    }

    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    async fn create(&mut self) -> Result<M, ApiError> {
        let data = self.ensure_validated()?;
        let hooks = self.hooks();
        hooks.create(self, data).await
    }

    async fn update(&mut self, instance: M) -> Result<M, ApiError> {
        let data = self.ensure_validated()?;
        let hooks = self.hooks();
        hooks.update(self, instance, data).await
    }
}

/// Template producing [`ModelSerializer`] instances
pub struct ModelSerializerTemplate<M: Model> {
    read_only: Vec<String>,
    hooks: Arc<dyn SerializerHooks<M>>,
}

impl<M: Model> ModelSerializerTemplate<M> {
    pub fn new() -> Self {
        Self {
            read_only: Vec::new(),
            hooks: Arc::new(DefaultHooks),
        }
    }

    /// Use `hooks` as the child of every instance
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl SerializerHooks<M> + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Additional read-only fields
    #[must_use]
    pub fn read_only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.read_only = fields.into_iter().map(Into::into).collect();
        self
    }
}

impl<M: Model> Default for ModelSerializerTemplate<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> SerializerTemplate<M> for ModelSerializerTemplate<M> {
    fn instantiate(&self, source: Arc<dyn QuerySource<M>>) -> Box<dyn Serializer<M>> {
        Box::new(ModelSerializer::new(source).with_read_only(self.read_only.clone()))
    }

    fn child(&self) -> Arc<dyn SerializerHooks<M>> {
        Arc::clone(&self.hooks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::model::{FieldKind, FieldSpec, ModelId};
    use crate::query::{MemoryStore, QuerySet};
    use axum::http::Method;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Book {
        #[serde(default)]
        id: ModelId,
        title: String,
        #[serde(default)]
        pages: i64,
        #[serde(default)]
        deleted_at: Option<DateTime<Utc>>,
    }

    impl Model for Book {
        const NAME: &'static str = "Book";

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

        fn fields() -> Vec<FieldSpec> {
            vec![
                FieldSpec::new("title", FieldKind::String).required().max_length(20),
                FieldSpec::new("pages", FieldKind::Integer),
            ]
        }
    }

    struct NoShortBooks;

    #[async_trait]
    impl SerializerHooks<Book> for NoShortBooks {
        async fn validate(
            &self,
            data: &Value,
            _ctx: Option<&SerializerContext>,
            errors: &mut ValidationErrors,
        ) {
            if data.get("pages").and_then(Value::as_i64).is_some_and(|p| p < 10) {
                errors.add("pages", "TOO_SHORT", "books need at least 10 pages");
            }
        }
    }

    fn store() -> Arc<MemoryStore<Book>> {
        Arc::new(MemoryStore::new())
    }

    fn prepared(
        source: Arc<dyn QuerySource<Book>>,
        template: &ModelSerializerTemplate<Book>,
        action: Action,
        payload: &str,
    ) -> Box<dyn Serializer<Book>> {
        let request = Arc::new(RequestContext::new(Method::POST, "/books".parse().unwrap()));
        let mut serializer = template.instantiate(source);
        serializer.set_context(SerializerContext::new(request, action));
        let meta = serializer.meta();
        serializer.set_meta(meta);
        serializer.bind(payload.as_bytes()).unwrap();
        serializer.set_child(template.child());
        serializer
    }

    #[tokio::test]
    async fn test_valid_payload_creates_entity() {
        let source = store();
        let template = ModelSerializerTemplate::new();
        let mut serializer = prepared(
            source.clone(),
            &template,
            Action::Create,
            r#"{"title":"Dune","pages":412}"#,
        );

        assert!(serializer.is_valid().await);
        let created = serializer.create().await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.title, "Dune");
        assert_eq!(source.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_required_field() {
        let template = ModelSerializerTemplate::new();
        let mut serializer = prepared(store(), &template, Action::Create, r#"{"pages":5}"#);

        assert!(!serializer.is_valid().await);
        assert!(serializer.errors().has_field("title"));
        assert_eq!(serializer.errors().as_slice()[0].code, "REQUIRED");
    }

    #[tokio::test]
    async fn test_type_and_length_checks() {
        let template = ModelSerializerTemplate::new();
        let mut serializer = prepared(
            store(),
            &template,
            Action::Create,
            r#"{"title":"An extremely long book title","pages":"many"}"#,
        );

        assert!(!serializer.is_valid().await);
        let codes: Vec<_> = serializer.errors().as_slice().iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["TOO_LONG", "INVALID_TYPE"]);
    }

    #[tokio::test]
    async fn test_non_object_payload() {
        let template = ModelSerializerTemplate::new();
        let mut serializer = prepared(store(), &template, Action::Create, "[1,2]");

        assert!(!serializer.is_valid().await);
        assert!(serializer.errors().has_field(crate::serializers::NON_FIELD_ERRORS));
    }

    #[tokio::test]
    async fn test_child_validation_runs() {
        let template = ModelSerializerTemplate::new().with_hooks(NoShortBooks);
        let mut serializer = prepared(
            store(),
            &template,
            Action::Create,
            r#"{"title":"Leaflet","pages":2}"#,
        );

        assert!(!serializer.is_valid().await);
        assert!(serializer.errors().has_field("pages"));
    }

    #[tokio::test]
    async fn test_create_without_validation_is_internal_error() {
        let template = ModelSerializerTemplate::new();
        let mut serializer = prepared(store(), &template, Action::Create, r#"{"title":"x"}"#);

        let err = serializer.create().await.unwrap_err();
        assert_eq!(err.kind, crate::handlers::ApiErrorKind::InternalError);
    }

    #[tokio::test]
    async fn test_update_is_partial_and_ignores_read_only() {
        let source = store();
        let existing = source
            .insert(Book {
                id: 0,
                title: "Old".to_string(),
                pages: 100,
                deleted_at: None,
            })
            .await
            .unwrap();

        let template = ModelSerializerTemplate::new();
        let mut serializer = prepared(
            source.clone(),
            &template,
            Action::Update,
            r#"{"pages":120,"id":77}"#,
        );

        assert!(serializer.is_valid().await);
        let updated = serializer.update(existing.clone()).await.unwrap();
        assert_eq!(updated.id, existing.id);
        assert_eq!(updated.title, "Old");
        assert_eq!(updated.pages, 120);

        let stored = source
            .find_by_id(&QuerySet::new(), existing.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.pages, 120);
    }

    #[tokio::test]
    async fn test_meta_depends_on_action() {
        let template = ModelSerializerTemplate::<Book>::new().read_only(["pages"]);
        let create = prepared(store(), &template, Action::Create, "{}");
        let update = prepared(store(), &template, Action::Update, "{}");

        assert!(!create.meta().partial);
        assert!(update.meta().partial);
        assert!(create.meta().is_read_only("pages"));
    }

    #[tokio::test]
    async fn test_configured_soft_delete_column_is_read_only() {
        let template = ModelSerializerTemplate::<Book>::new();
        let request = Arc::new(RequestContext::new(Method::POST, "/books".parse().unwrap()));
        let mut serializer = template.instantiate(store());
        serializer.set_context(
            SerializerContext::new(request, Action::Create).with_soft_delete_field("removed_at"),
        );

        let meta = serializer.meta();
        assert!(meta.is_read_only("removed_at"));
        assert!(meta.is_read_only("deleted_at"));
    }

    #[tokio::test]
    async fn test_save_new_starts_active() {
        let source = store();
        let serializer = ModelSerializer::<Book>::new(source.clone());
        let created = serializer
            .save_new(serde_json::json!({
                "title": "Dune",
                "deleted_at": "2020-01-01T00:00:00Z"
            }))
            .await
            .unwrap();

        assert!(created.deleted_at.is_none());
        assert_eq!(source.len().await, 1);
    }

    #[test]
    fn test_bind_rejects_malformed_json() {
        let template = ModelSerializerTemplate::<Book>::new();
        let mut serializer = template.instantiate(store());
        let err = serializer.bind(b"{oops").unwrap_err();
        assert_eq!(err.kind, crate::handlers::ApiErrorKind::InternalError);
    }
}
