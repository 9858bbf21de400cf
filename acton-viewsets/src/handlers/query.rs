//! Query-string parameters shared by list actions
//!
//! Filter specifications are bound from the same query string, so unknown
//! keys are ignored here.
//!
//! # Example
//!
//! ```rust
//! use acton_viewsets::handlers::{ListQuery, SortOrder};
//!
//! let query = ListQuery::new()
//!     .with_page(2)
//!     .with_per_page(50)
//!     .with_sort("created_at")
//!     .with_order(SortOrder::Desc);
//!
//! assert_eq!(query.page_number(), 2);
//! assert_eq!(query.items_per_page(20, 100), 50);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::OrderDirection;

/// Default number of items per page
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Maximum allowed items per page
pub const MAX_PER_PAGE: u32 = 100;

/// Sort direction accepted in the `order` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl From<SortOrder> for OrderDirection {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => OrderDirection::Ascending,
            SortOrder::Desc => OrderDirection::Descending,
        }
    }
}

/// `page`, `per_page`, `sort` and `order` parameters
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Page number (1-indexed). None defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Items per page. None uses the ViewSet default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,

    /// Field to order by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// Direction for `sort`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

impl ListQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Page number, at least 1
    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size between 1 and `max`, falling back to `default`
    #[must_use]
    pub fn items_per_page(&self, default: u32, max: u32) -> u32 {
        let max = max.max(1);
        self.per_page.unwrap_or(default).clamp(1, max)
    }

    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.order.unwrap_or_default()
    }

    /// Requested sort field; an empty `sort` counts as none
    #[must_use]
    pub fn sort_field(&self) -> Option<&str> {
        self.sort.as_deref().filter(|s| !s.is_empty())
    }
}
