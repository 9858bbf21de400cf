use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::Response;
use serde::de::DeserializeOwned;

use super::action::Action;
use super::request::ViewSetRequest;
use crate::config::ViewSetConfig;
use crate::context::RequestContext;
use crate::filters::{FilterBinder, FilterSet, TypedFilter};
use crate::handlers::{ApiError, ItemResponse, ListResponse};
use crate::model::Model;
use crate::pagination::PaginationSettings;
use crate::permissions::Permission;
use crate::query::{QuerySet, QuerySource};
use crate::serializers::{ModelSerializerTemplate, SerializerTemplate};

/// Handler for a named action registered on a ViewSet
///
/// Extra actions run behind the same permission gate as the built-in ones,
/// with the request's action set to their name.
///
/// ```rust,ignore
/// struct Publish;
///
/// #[async_trait]
/// impl ExtraAction<Article> for Publish {
///     async fn handle(&self, request: &ViewSetRequest<'_, Article>) -> Result<Response, ApiError> {
///         let mut article = request.get_object().await?;
///         article.status = "published".into();
///         let saved = request.viewset().source().save(article).await?;
///         Ok(request.context().json(StatusCode::OK, ItemResponse::new(saved)))
///     }
/// }
/// ```
#[async_trait]
pub trait ExtraAction<M: Model>: Send + Sync {
    async fn handle(&self, request: &ViewSetRequest<'_, M>) -> Result<Response, ApiError>;
}

/// Where an extra action is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionScope {
    /// `POST /{feature}/actions/{name}`
    Collection,
    /// `POST /{feature}/{id}/actions/{name}`
    Detail,
}

struct RegisteredAction<M: Model> {
    scope: ActionScope,
    handler: Arc<dyn ExtraAction<M>>,
}

/// Shared, immutable CRUD configuration for one model
///
/// Build once, wrap in an `Arc`, and serve every request from it. Nothing
/// request-specific is stored here; see [`ViewSetRequest`].
///
/// ```rust,ignore
/// let viewset = ViewSet::new(Arc::new(MemoryStore::<Article>::new()))
///     .with_filter::<ArticleFilter>()
///     .with_permission(IsAuthenticatedOrReadOnly)
///     .register_detail_action("publish", Publish);
/// ```
pub struct ViewSet<M: Model> {
    source: Arc<dyn QuerySource<M>>,
    base_query: QuerySet,
    serializer: Arc<dyn SerializerTemplate<M>>,
    filter: Option<Arc<dyn FilterBinder>>,
    permissions: Vec<Arc<dyn Permission>>,
    actions: HashMap<String, RegisteredAction<M>>,
    pagination: PaginationSettings,
    max_payload_bytes: usize,
}

impl<M: Model> ViewSet<M> {
    /// ViewSet over `source` with the default model serializer, no filter
    /// and no permissions
    pub fn new(source: Arc<dyn QuerySource<M>>) -> Self {
        Self {
            source,
            base_query: QuerySet::new(),
            serializer: Arc::new(ModelSerializerTemplate::<M>::new()),
            filter: None,
            permissions: Vec::new(),
            actions: HashMap::new(),
            pagination: PaginationSettings::default(),
            max_payload_bytes: ViewSetConfig::default().max_payload_bytes,
        }
    }

    /// Apply page sizes, soft-delete column and payload limit from configuration
    #[must_use]
    pub fn with_config(mut self, config: &ViewSetConfig) -> Self {
        let ordering_fields = std::mem::take(&mut self.pagination.ordering_fields);
        self.pagination =
            PaginationSettings::from_config(config).with_ordering_fields(ordering_fields);
        self.base_query = self
            .base_query
            .with_soft_delete_field(config.soft_delete_field.clone());
        self.max_payload_bytes = config.max_payload_bytes;
        self
    }

    /// Replace the base query every action starts from
    #[must_use]
    pub fn with_base_query(mut self, query: QuerySet) -> Self {
        self.base_query = query;
        self
    }

    #[must_use]
    pub fn with_serializer(mut self, template: impl SerializerTemplate<M> + 'static) -> Self {
        self.serializer = Arc::new(template);
        self
    }

    /// Bind `F` from the query string on list actions
    #[must_use]
    pub fn with_filter<F>(self) -> Self
    where
        F: FilterSet + DeserializeOwned + 'static,
    {
        self.with_filter_binder(TypedFilter::<F>::new())
    }

    #[must_use]
    pub fn with_filter_binder(mut self, binder: impl FilterBinder + 'static) -> Self {
        self.filter = Some(Arc::new(binder));
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: impl Permission + 'static) -> Self {
        self.permissions.push(Arc::new(permission));
        self
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<Arc<dyn Permission>>) -> Self {
        self.permissions = permissions;
        self
    }

    #[must_use]
    pub fn with_pagination(mut self, settings: PaginationSettings) -> Self {
        self.pagination = settings;
        self
    }

    /// Fields clients may sort list results by
    #[must_use]
    pub fn with_ordering_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pagination = self.pagination.with_ordering_fields(fields);
        self
    }

    /// Register a collection-level action under `name`
    #[must_use]
    pub fn register_action(self, name: impl Into<String>, handler: impl ExtraAction<M> + 'static) -> Self {
        self.register(name.into(), ActionScope::Collection, Arc::new(handler))
    }

    /// Register an action that operates on one entity under `name`
    #[must_use]
    pub fn register_detail_action(
        self,
        name: impl Into<String>,
        handler: impl ExtraAction<M> + 'static,
    ) -> Self {
        self.register(name.into(), ActionScope::Detail, Arc::new(handler))
    }

    fn register(mut self, name: String, scope: ActionScope, handler: Arc<dyn ExtraAction<M>>) -> Self {
        if self.actions.contains_key(&name) {
            tracing::warn!(entity = M::NAME, action = %name, "replacing registered action");
        }
        self.actions.insert(name, RegisteredAction { scope, handler });
        self
    }

    pub fn source(&self) -> &Arc<dyn QuerySource<M>> {
        &self.source
    }

    pub fn base_query(&self) -> &QuerySet {
        &self.base_query
    }

    pub fn serializer_template(&self) -> &Arc<dyn SerializerTemplate<M>> {
        &self.serializer
    }

    pub fn filter_binder(&self) -> Option<&Arc<dyn FilterBinder>> {
        self.filter.as_ref()
    }

    pub fn permissions(&self) -> &[Arc<dyn Permission>] {
        &self.permissions
    }

    pub fn pagination(&self) -> &PaginationSettings {
        &self.pagination
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// Names of registered extra actions and where they are mounted
    pub fn registered_actions(&self) -> Vec<(&str, ActionScope)> {
        let mut names: Vec<_> = self
            .actions
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.scope))
            .collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        names
    }

    /// Fresh per-request scope for `action`
    pub fn request(&self, action: Action, ctx: RequestContext) -> ViewSetRequest<'_, M> {
        ViewSetRequest::new(self, action, ctx)
    }

    pub async fn list(&self, ctx: RequestContext) -> Result<ListResponse<M>, ApiError> {
        self.request(Action::List, ctx).list().await
    }

    pub async fn list_deleted(&self, ctx: RequestContext) -> Result<ListResponse<M>, ApiError> {
        self.request(Action::ListDeleted, ctx).list().await
    }

    pub async fn retrieve(&self, ctx: RequestContext) -> Result<ItemResponse<M>, ApiError> {
        self.request(Action::Retrieve, ctx).retrieve().await
    }

    pub async fn create(&self, ctx: RequestContext) -> Result<ItemResponse<M>, ApiError> {
        self.request(Action::Create, ctx).create().await
    }

    pub async fn update(&self, ctx: RequestContext) -> Result<ItemResponse<M>, ApiError> {
        self.request(Action::Update, ctx).update().await
    }

    pub async fn destroy(&self, ctx: RequestContext) -> Result<StatusCode, ApiError> {
        self.request(Action::Destroy, ctx).destroy().await
    }

    /// Dispatch the extra action `name` mounted at `scope`
    ///
    /// Unknown names, and names registered at the other scope, are `NotFound`.
    pub async fn extra(
        &self,
        name: &str,
        scope: ActionScope,
        ctx: RequestContext,
    ) -> Result<Response, ApiError> {
        let action = Action::Custom(name.to_string());

        let handler = match self.actions.get(name) {
            Some(entry) if entry.scope == scope => Arc::clone(&entry.handler),
            _ => {
                return Err(ApiError::not_found("Action", name).with_action(action));
            }
        };

        self.request(action, ctx).extra(handler.as_ref()).await
    }
}

impl<M: Model> fmt::Debug for ViewSet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSet")
            .field("model", &M::NAME)
            .field("base_query", &self.base_query)
            .field("has_filter", &self.filter.is_some())
            .field("permissions", &self.permissions.len())
            .field("actions", &self.registered_actions())
            .field("pagination", &self.pagination)
            .finish()
    }
}
