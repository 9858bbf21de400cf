//! Request-scoped serializers
//!
//! A serializer validates a request payload and persists it. A fresh
//! instance is created for every request from the ViewSet's
//! [`SerializerTemplate`] and prepared in a fixed order:
//!
//! 1. [`Serializer::set_context`]
//! 2. `let meta = serializer.meta(); serializer.set_meta(meta);`
//! 3. [`Serializer::bind`] with the raw payload
//! 4. [`Serializer::set_child`] with the template's [`SerializerHooks`]
//!
//! Validation and persistence then dispatch through the hooks, so a model
//! can add cross-field checks or customize saving without reimplementing
//! the base serializer.

mod errors;
mod meta;
mod model;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use errors::{FieldError, ValidationErrors, NON_FIELD_ERRORS};
pub use meta::SerializerMeta;
pub use model::{DefaultHooks, ModelSerializer, ModelSerializerTemplate};

use crate::context::RequestContext;
use crate::handlers::ApiError;
use crate::model::Model;
use crate::query::{QuerySource, DEFAULT_SOFT_DELETE_FIELD};
use crate::viewsets::Action;

/// What a serializer knows about the request it serves
#[derive(Debug, Clone)]
pub struct SerializerContext {
    pub request: Arc<RequestContext>,
    pub action: Action,
    /// Column holding the soft-delete timestamp; never client-writable
    pub soft_delete_field: String,
}

impl SerializerContext {
    pub fn new(request: Arc<RequestContext>, action: Action) -> Self {
        Self {
            request,
            action,
            soft_delete_field: DEFAULT_SOFT_DELETE_FIELD.to_string(),
        }
    }

    #[must_use]
    pub fn with_soft_delete_field(mut self, field: impl Into<String>) -> Self {
        self.soft_delete_field = field.into();
        self
    }
}

/// Validates and persists one request payload
#[async_trait]
pub trait Serializer<M: Model>: Send + Sync {
    fn set_context(&mut self, ctx: SerializerContext);

    /// Metadata derived from the current state
    fn meta(&self) -> SerializerMeta;

    fn set_meta(&mut self, meta: SerializerMeta);

    /// Decode the JSON payload onto the serializer
    ///
    /// A payload that cannot be decoded is an internal fault.
    fn bind(&mut self, payload: &[u8]) -> Result<(), ApiError>;

    /// Install the overriding hooks used by validation and persistence
    fn set_child(&mut self, child: Arc<dyn SerializerHooks<M>>);

    /// Run field checks and hook validation; errors are kept for [`errors`](Self::errors)
    async fn is_valid(&mut self) -> bool;

    fn errors(&self) -> &ValidationErrors;

    /// Persist the validated payload as a new entity
    async fn create(&mut self) -> Result<M, ApiError>;

    /// Apply the validated payload to `instance` and persist it
    async fn update(&mut self, instance: M) -> Result<M, ApiError>;
}

/// Overridable validation and persistence steps
///
/// Every method has a default, so an implementation only overrides what it
/// needs.
#[async_trait]
pub trait SerializerHooks<M: Model>: Send + Sync {
    /// Additional checks after field validation
    async fn validate(
        &self,
        _data: &Value,
        _ctx: Option<&SerializerContext>,
        _errors: &mut ValidationErrors,
    ) {
    }

    async fn create(&self, base: &ModelSerializer<M>, data: Value) -> Result<M, ApiError> {
        base.save_new(data).await
    }

    async fn update(
        &self,
        base: &ModelSerializer<M>,
        instance: M,
        data: Value,
    ) -> Result<M, ApiError> {
        base.save_existing(instance, data).await
    }
}

/// Creates fresh serializer instances for a ViewSet
pub trait SerializerTemplate<M: Model>: Send + Sync {
    /// New, unprepared serializer bound to `source`
    fn instantiate(&self, source: Arc<dyn QuerySource<M>>) -> Box<dyn Serializer<M>>;

    /// Hooks installed with `set_child`
    fn child(&self) -> Arc<dyn SerializerHooks<M>>;
}
