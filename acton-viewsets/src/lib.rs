//! # acton-viewsets
//!
//! Generic CRUD ViewSets for axum services.
//!
//! A ViewSet serves list, retrieve, create, update and destroy for one model
//! type over any [`QuerySource`](query::QuerySource), composing the same
//! stages for every action:
//!
//! - **Permissions**: every configured permission must allow the request
//! - **Scoping**: active rows by default, soft-deleted rows for `ListDeleted`
//! - **Filtering**: typed filter structs bound from query parameters
//! - **Pagination**: page-number pagination with allow-listed sorting
//! - **Serialization**: field validation, overridable hooks and persistence
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use acton_viewsets::prelude::*;
//! use chrono::{DateTime, Utc};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Note {
//!     #[serde(default)]
//!     id: ModelId,
//!     body: String,
//!     #[serde(default)]
//!     deleted_at: Option<DateTime<Utc>>,
//! }
//!
//! impl Model for Note {
//!     const NAME: &'static str = "Note";
//!
//!     fn id(&self) -> ModelId { self.id }
//!     fn set_id(&mut self, id: ModelId) { self.id = id; }
//!     fn deleted_at(&self) -> Option<DateTime<Utc>> { self.deleted_at }
//!     fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) { self.deleted_at = at; }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Load configuration
//!     let config = Config::load()?;
//!
//!     // Initialize tracing
//!     init_tracing(&config)?;
//!
//!     // Build the ViewSet over an in-memory store
//!     let notes = ViewSet::<Note>::new(Arc::new(MemoryStore::<Note>::new()))
//!         .with_config(&config.viewset)
//!         .with_permission(IsAuthenticatedOrReadOnly);
//!
//!     // Run server
//!     Server::new(config)
//!         .serve(routes(Arc::new(notes), "/notes"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod filters;
pub mod handlers;
pub mod model;
pub mod observability;
pub mod pagination;
pub mod permissions;
pub mod query;
pub mod serializers;
pub mod server;
pub mod viewsets;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, MiddlewareConfig, ServiceConfig, ViewSetConfig};
    pub use crate::context::{RequestContext, REQUEST_ID_HEADER};
    pub use crate::error::{Error, Result};

    pub use crate::filters::{FilterBinder, FilterSet, TypedFilter};
    pub use crate::handlers::{
        ApiError, ApiErrorKind, ItemResponse, ListQuery, ListResponse, PaginationMeta,
        ResponseMeta, SortOrder,
    };
    pub use crate::model::{FieldKind, FieldSpec, Model, ModelId, ModelSlice};
    pub use crate::observability::{init_tracing, shutdown_tracing};
    pub use crate::pagination::{PaginationSettings, Paginator};
    pub use crate::permissions::{
        AllowAny, DenyAll, IsAuthenticated, IsAuthenticatedOrReadOnly, Permission, ReadOnly,
    };
    pub use crate::query::{
        FilterCondition, MemoryStore, OrderDirection, QueryError, QueryErrorKind, QuerySet,
        QuerySource,
    };
    pub use crate::serializers::{
        ModelSerializer, ModelSerializerTemplate, Serializer, SerializerContext, SerializerHooks,
        SerializerMeta, SerializerTemplate, ValidationErrors,
    };
    pub use crate::server::Server;
    pub use crate::viewsets::{routes, Action, ActionScope, ExtraAction, ViewSet, ViewSetRequest};

    // Re-export commonly used types
    pub use async_trait::async_trait;
    pub use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{delete, get, patch, post, put},
        Json, Router,
    };
    pub use serde::{Deserialize, Serialize};
    pub use tokio;
    pub use tracing::{debug, error, info, instrument, trace, warn};
}
