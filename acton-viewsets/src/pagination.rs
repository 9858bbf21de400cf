//! Page-number pagination over a [`QuerySet`]
//!
//! [`Paginator::init`] binds `page`, `per_page`, `sort` and `order` from the
//! query string and counts the rows the query matches.
//! [`Paginator::paginate_query`] then loads only the requested window, and
//! [`Paginator::get_paginated_response`] wraps it in a [`ListResponse`].
//!
//! # Example
//!
//! ```rust
//! use acton_viewsets::pagination::PaginationSettings;
//!
//! let settings = PaginationSettings::default()
//!     .with_default_per_page(10)
//!     .with_ordering_fields(["title", "created_at"]);
//!
//! assert!(settings.allows_ordering("title"));
//! assert!(!settings.allows_ordering("secret"));
//! ```

use std::sync::Arc;

use crate::config::ViewSetConfig;
use crate::context::RequestContext;
use crate::handlers::{ApiError, ListQuery, ListResponse, PaginationMeta, DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::model::{Model, ModelSlice};
use crate::query::{QuerySet, QuerySource, Window};

/// Page size limits and sortable fields for one ViewSet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationSettings {
    pub default_per_page: u32,
    pub max_per_page: u32,
    /// Fields clients may pass in `sort`; other values are ignored
    pub ordering_fields: Vec<String>,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: MAX_PER_PAGE,
            ordering_fields: Vec::new(),
        }
    }
}

impl PaginationSettings {
    /// Page sizes from configuration
    pub fn from_config(config: &ViewSetConfig) -> Self {
        Self {
            default_per_page: config.default_per_page.max(1),
            max_per_page: config.max_per_page.max(1),
            ordering_fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_default_per_page(mut self, per_page: u32) -> Self {
        self.default_per_page = per_page.max(1);
        self
    }

    #[must_use]
    pub fn with_max_per_page(mut self, max: u32) -> Self {
        self.max_per_page = max.max(1);
        self
    }

    #[must_use]
    pub fn with_ordering_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ordering_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn allows_ordering(&self, field: &str) -> bool {
        self.ordering_fields.iter().any(|f| f == field)
    }
}

/// One request's pagination state
pub struct Paginator<M: Model> {
    source: Arc<dyn QuerySource<M>>,
    query: QuerySet,
    page: u32,
    per_page: u32,
    total: u64,
}

impl<M: Model> Paginator<M> {
    /// Bind pagination parameters and count the rows `query` matches
    pub async fn init(
        ctx: &RequestContext,
        source: Arc<dyn QuerySource<M>>,
        query: QuerySet,
        settings: &PaginationSettings,
    ) -> Result<Self, ApiError> {
        let params: ListQuery = ctx.bind_query()?;
        let page = params.page_number();
        let per_page = params.items_per_page(settings.default_per_page, settings.max_per_page);

        let mut query = query.without_window();
        if let Some(sort) = params.sort_field() {
            if settings.allows_ordering(sort) {
                query = query.order_by(sort, params.sort_order().into());
            } else {
                tracing::debug!(sort, "ignoring sort on a field that is not orderable");
            }
        }

        let total = source.count(&query).await?;
        let query = query.window(Window::page(u64::from(page), u64::from(per_page)));

        tracing::debug!(entity = M::NAME, page, per_page, total, "pagination initialized");

        Ok(Self {
            source,
            query,
            page,
            per_page,
            total,
        })
    }

    /// Replace `results` with the rows of the requested page
    pub async fn paginate_query(&self, results: &mut ModelSlice<M>) -> Result<(), ApiError> {
        self.source.find(&self.query, results).await?;
        Ok(())
    }

    /// Wrap a page of results in the list envelope
    pub fn get_paginated_response(&self, results: ModelSlice<M>) -> ListResponse<M> {
        ListResponse::new(results.into_vec(), self.meta())
    }

    pub fn meta(&self) -> PaginationMeta {
        PaginationMeta::new(self.page, self.per_page, self.total)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// The windowed query `paginate_query` runs
    pub fn query(&self) -> &QuerySet {
        &self.query
    }
}
