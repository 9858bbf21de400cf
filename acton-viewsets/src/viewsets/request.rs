use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;

use super::action::Action;
use super::viewset::{ExtraAction, ViewSet};
use crate::context::RequestContext;
use crate::handlers::{ApiError, ItemResponse, ListResponse, ResponseMeta};
use crate::model::{parse_model_id, Model, ModelSlice};
use crate::pagination::Paginator;
use crate::permissions::check_all;
use crate::query::QuerySet;
use crate::serializers::{Serializer, SerializerContext};

/// Per-request scope over a shared [`ViewSet`]
///
/// Owns the action and request context for exactly one request, so
/// concurrent requests against the same ViewSet never observe each other's
/// state. Each stage is a method; the action methods compose them in the
/// order permission, filter, pagination, serialization.
pub struct ViewSetRequest<'a, M: Model> {
    viewset: &'a ViewSet<M>,
    action: Action,
    ctx: Arc<RequestContext>,
}

impl<'a, M: Model> ViewSetRequest<'a, M> {
    pub fn new(viewset: &'a ViewSet<M>, action: Action, ctx: RequestContext) -> Self {
        Self {
            viewset,
            action,
            ctx: Arc::new(ctx),
        }
    }

    pub fn viewset(&self) -> &'a ViewSet<M> {
        self.viewset
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    /// Fail with `Forbidden` unless every configured permission allows
    pub fn has_permission(&self) -> Result<(), ApiError> {
        if check_all(self.viewset.permissions(), &self.ctx) {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "You do not have permission to perform this action",
            ))
        }
    }

    /// Base query scoped for the current action
    ///
    /// `ListDeleted` sees only soft-deleted rows; every other action sees
    /// only active rows.
    pub fn get_queryset(&self) -> QuerySet {
        let base = self.viewset.base_query().clone();
        match self.action {
            Action::ListDeleted => base.only_deleted(),
            _ => base,
        }
    }

    /// The entity named by the `id` path parameter, within [`get_queryset`](Self::get_queryset)
    pub async fn get_object(&self) -> Result<M, ApiError> {
        let raw = self
            .ctx
            .param("id")
            .ok_or_else(|| ApiError::internal("Route is missing the id parameter"))?;

        let Some(id) = parse_model_id(raw) else {
            return Err(ApiError::not_found(M::NAME, raw));
        };

        self.viewset
            .source()
            .find_by_id(&self.get_queryset(), id)
            .await?
            .ok_or_else(|| ApiError::not_found(M::NAME, raw))
    }

    /// Fresh, empty result container
    pub fn get_model_slice(&self) -> ModelSlice<M> {
        M::new_collection()
    }

    /// Narrow `query` (or [`get_queryset`](Self::get_queryset)) with the
    /// configured filter and load the matches into `results`
    ///
    /// Without a filter the query is returned unchanged and nothing runs.
    pub async fn filter_queryset(
        &self,
        results: &mut ModelSlice<M>,
        query: Option<QuerySet>,
    ) -> Result<QuerySet, ApiError> {
        let query = query.unwrap_or_else(|| self.get_queryset());

        let Some(binder) = self.viewset.filter_binder() else {
            return Ok(query);
        };

        let filter = binder.bind(&self.ctx)?;
        let narrowed = filter.apply_filters(&self.ctx, query);

        self.viewset.source().find(&narrowed, results).await?;
        tracing::debug!(
            entity = M::NAME,
            action = %self.action,
            conditions = narrowed.conditions().len(),
            rows = results.len(),
            "queryset filtered"
        );

        Ok(narrowed)
    }

    /// Count `query`, then load the requested page into `results`
    pub async fn paginate_queryset(
        &self,
        query: QuerySet,
        results: &mut ModelSlice<M>,
    ) -> Result<Paginator<M>, ApiError> {
        let paginator = Paginator::init(
            &self.ctx,
            Arc::clone(self.viewset.source()),
            query,
            self.viewset.pagination(),
        )
        .await?;
        paginator.paginate_query(results).await?;
        Ok(paginator)
    }

    /// Unprepared serializer from the ViewSet's template
    pub fn get_serializer_struct(&self) -> Box<dyn Serializer<M>> {
        self.viewset
            .serializer_template()
            .instantiate(Arc::clone(self.viewset.source()))
    }

    /// Serializer prepared for this request
    ///
    /// Context, then the metadata handshake, then the payload, then the
    /// child hooks.
    pub fn get_serializer(&self) -> Result<Box<dyn Serializer<M>>, ApiError> {
        let mut serializer = self.get_serializer_struct();
        self.setup_serializer(serializer.as_mut())?;
        Ok(serializer)
    }

    fn setup_serializer(&self, serializer: &mut dyn Serializer<M>) -> Result<(), ApiError> {
        serializer.set_context(
            SerializerContext::new(Arc::clone(&self.ctx), self.action.clone())
                .with_soft_delete_field(self.viewset.base_query().soft_delete_field()),
        );

        let meta = serializer.meta();
        serializer.set_meta(meta);

        serializer.bind(self.ctx.payload())?;
        serializer.set_child(self.viewset.serializer_template().child());
        Ok(())
    }

    fn response_meta(&self) -> ResponseMeta {
        let meta = ResponseMeta::default().with_action(self.action.to_string());
        match self.ctx.request_id() {
            Some(id) => meta.with_request_id(id),
            None => meta,
        }
    }

    fn dispatched(&self) {
        tracing::info!(
            entity = M::NAME,
            action = %self.action,
            method = %self.ctx.method(),
            path = %self.ctx.uri().path(),
            request_id = self.ctx.request_id().unwrap_or_default(),
            "dispatching viewset action"
        );
    }

    fn tag(&self, error: ApiError) -> ApiError {
        error.with_action(self.action.clone())
    }

    /// Paginated list of the current action's scope
    pub async fn list(&self) -> Result<ListResponse<M>, ApiError> {
        self.dispatched();
        self.list_inner().await.map_err(|e| self.tag(e))
    }

    async fn list_inner(&self) -> Result<ListResponse<M>, ApiError> {
        self.has_permission()?;

        let mut results = self.get_model_slice();
        let query = self.filter_queryset(&mut results, None).await?;
        let paginator = self.paginate_queryset(query, &mut results).await?;

        Ok(paginator
            .get_paginated_response(results)
            .with_meta(self.response_meta()))
    }

    pub async fn retrieve(&self) -> Result<ItemResponse<M>, ApiError> {
        self.dispatched();
        self.retrieve_inner().await.map_err(|e| self.tag(e))
    }

    async fn retrieve_inner(&self) -> Result<ItemResponse<M>, ApiError> {
        self.has_permission()?;
        let instance = self.get_object().await?;
        Ok(ItemResponse::new(instance).with_meta(self.response_meta()))
    }

    /// Validate the payload and persist a new entity (201)
    pub async fn create(&self) -> Result<ItemResponse<M>, ApiError> {
        self.dispatched();
        self.create_inner().await.map_err(|e| self.tag(e))
    }

    async fn create_inner(&self) -> Result<ItemResponse<M>, ApiError> {
        self.has_permission()?;

        let mut serializer = self.get_serializer()?;
        if !serializer.is_valid().await {
            return Err(ApiError::validation_failed(serializer.errors().clone()));
        }

        let created = serializer.create().await?;
        Ok(ItemResponse::created(created).with_meta(self.response_meta()))
    }

    /// Validate the payload and apply it to the entity named by `id`
    pub async fn update(&self) -> Result<ItemResponse<M>, ApiError> {
        self.dispatched();
        self.update_inner().await.map_err(|e| self.tag(e))
    }

    async fn update_inner(&self) -> Result<ItemResponse<M>, ApiError> {
        self.has_permission()?;

        let instance = self.get_object().await?;

        let mut serializer = self.get_serializer()?;
        if !serializer.is_valid().await {
            return Err(ApiError::validation_failed(serializer.errors().clone()));
        }

        let updated = serializer.update(instance).await?;
        Ok(ItemResponse::new(updated).with_meta(self.response_meta()))
    }

    /// Soft delete the entity named by `id` (204)
    pub async fn destroy(&self) -> Result<StatusCode, ApiError> {
        self.dispatched();
        self.destroy_inner().await.map_err(|e| self.tag(e))
    }

    async fn destroy_inner(&self) -> Result<StatusCode, ApiError> {
        self.has_permission()?;

        let instance = self.get_object().await?;
        self.viewset.source().soft_delete(instance.id()).await?;
        tracing::info!(entity = M::NAME, id = instance.id(), "entity soft deleted");
        Ok(StatusCode::NO_CONTENT)
    }

    /// Run a registered extra action behind the permission gate
    pub async fn extra(&self, handler: &dyn ExtraAction<M>) -> Result<Response, ApiError> {
        self.dispatched();
        let result = match self.has_permission() {
            Ok(()) => handler.handle(self).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| self.tag(e))
    }
}
