//! Request-driven filtering
//!
//! A filter specification is a serde type bound from the query string that
//! knows how to narrow a [`QuerySet`]. The ViewSet stores a [`FilterBinder`]
//! rather than a filter value, so every request gets a freshly bound filter.
//!
//! # Example
//!
//! ```rust
//! use acton_viewsets::context::RequestContext;
//! use acton_viewsets::filters::{FilterBinder, FilterSet, TypedFilter};
//! use acton_viewsets::query::{FilterCondition, QuerySet};
//! use axum::http::Method;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct ArticleFilter {
//!     status: Option<String>,
//! }
//!
//! impl FilterSet for ArticleFilter {
//!     fn apply_filters(&self, _ctx: &RequestContext, query: QuerySet) -> QuerySet {
//!         match &self.status {
//!             Some(status) => query.filter(FilterCondition::eq("status", status.as_str())),
//!             None => query,
//!         }
//!     }
//! }
//!
//! let ctx = RequestContext::new(Method::GET, "/articles?status=draft".parse().unwrap());
//! let filter = TypedFilter::<ArticleFilter>::new().bind(&ctx).unwrap();
//! let query = filter.apply_filters(&ctx, QuerySet::new());
//! assert_eq!(query.conditions().len(), 1);
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::context::RequestContext;
use crate::handlers::ApiError;
use crate::query::QuerySet;

/// A bound filter specification
pub trait FilterSet: Send + Sync {
    /// Narrow `query` by this filter's predicates
    fn apply_filters(&self, ctx: &RequestContext, query: QuerySet) -> QuerySet;
}

/// Produces a filter specification for one request
pub trait FilterBinder: Send + Sync {
    /// Bind request parameters onto a new filter value
    ///
    /// Fails with `BadRequest` when a parameter does not fit.
    fn bind(&self, ctx: &RequestContext) -> Result<Box<dyn FilterSet>, ApiError>;
}

/// Binds `F` from the query string with serde
pub struct TypedFilter<F> {
    _marker: PhantomData<fn() -> F>,
}

impl<F> TypedFilter<F> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<F> Default for TypedFilter<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> fmt::Debug for TypedFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedFilter")
            .field("filter", &std::any::type_name::<F>())
            .finish()
    }
}

impl<F> FilterBinder for TypedFilter<F>
where
    F: FilterSet + DeserializeOwned + 'static,
{
    fn bind(&self, ctx: &RequestContext) -> Result<Box<dyn FilterSet>, ApiError> {
        let filter: F = ctx.bind_query()?;
        Ok(Box::new(filter))
    }
}
