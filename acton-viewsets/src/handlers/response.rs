//! Response envelopes for ViewSet actions
//!
//! Single entities are wrapped in [`ItemResponse`], lists in
//! [`ListResponse`] with [`PaginationMeta`].
//!
//! # Example
//!
//! ```rust
//! use acton_viewsets::handlers::{ItemResponse, ListResponse, PaginationMeta};
//!
//! let item = ItemResponse::created("hello");
//! assert_eq!(item.status().as_u16(), 201);
//!
//! let page = ListResponse::new(vec![1, 2, 3], PaginationMeta::new(1, 3, 7));
//! assert_eq!(page.pagination.total_pages, 3);
//! assert!(page.pagination.has_next);
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Request diagnostics echoed back to the client
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// Value of the `x-request-id` header, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Action that produced the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl ResponseMeta {
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.request_id.is_none() && self.action.is_none()
    }
}

/// Single entity response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip, default = "default_status")]
    status: StatusCode,
}

fn default_status() -> StatusCode {
    StatusCode::OK
}

impl<T> ItemResponse<T> {
    /// 200 OK response
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: None,
            status: StatusCode::OK,
        }
    }

    /// 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            data,
            meta: None,
            status: StatusCode::CREATED,
        }
    }

    /// Attach metadata, dropping it when empty
    #[must_use]
    pub fn with_meta(mut self, meta: ResponseMeta) -> Self {
        self.meta = (!meta.is_empty()).then_some(meta);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn map<U, F>(self, f: F) -> ItemResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        ItemResponse {
            data: f(self.data),
            meta: self.meta,
            status: self.status,
        }
    }
}

impl<T: Serialize> IntoResponse for ItemResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Pagination metadata for list responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Items per page
    pub per_page: u32,
    /// Total items matching the query across all pages
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Build metadata, deriving page count and navigation flags
    ///
    /// A `per_page` of 0 is treated as 1.
    ///
    /// ```rust
    /// use acton_viewsets::handlers::PaginationMeta;
    ///
    /// let meta = PaginationMeta::new(1, 10, 25);
    /// assert_eq!(meta.total_pages, 3);
    /// assert!(meta.has_next);
    /// assert!(!meta.has_prev);
    /// ```
    #[must_use]
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = calculate_total_pages(total, per_page);

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    #[must_use]
    pub fn empty(per_page: u32) -> Self {
        Self::new(1, per_page, 0)
    }

    /// Rows to skip to reach this page
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

/// Ceiling division, clamped to `u32`
fn calculate_total_pages(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page);
    let pages = total.div_ceil(per_page);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Paginated list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, pagination: PaginationMeta) -> Self {
        Self {
            data,
            pagination,
            meta: None,
        }
    }

    pub fn empty(per_page: u32) -> Self {
        Self::new(Vec::new(), PaginationMeta::empty(per_page))
    }

    /// Attach metadata, dropping it when empty
    #[must_use]
    pub fn with_meta(mut self, meta: ResponseMeta) -> Self {
        self.meta = (!meta.is_empty()).then_some(meta);
        self
    }

    pub fn map<U, F>(self, f: F) -> ListResponse<U>
    where
        F: FnMut(T) -> U,
    {
        ListResponse {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
            meta: self.meta,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
