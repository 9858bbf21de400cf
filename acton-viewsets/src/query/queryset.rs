//! The [`QuerySet`] value
//!
//! A `QuerySet` describes "rows of one model, scoped by predicates". It is
//! a plain value: every builder method consumes it and returns the narrowed
//! query, so a stage can never mutate a query another stage still holds.
//!
//! # Example
//!
//! ```rust
//! use acton_viewsets::query::{FilterCondition, OrderDirection, QuerySet, Scope};
//!
//! let base = QuerySet::new();
//! let narrowed = base
//!     .clone()
//!     .filter(FilterCondition::eq("status", "published"))
//!     .order_by("created_at", OrderDirection::Descending);
//!
//! assert!(base.conditions().is_empty());
//! assert_eq!(narrowed.conditions().len(), 1);
//!
//! let deleted = QuerySet::new().only_deleted();
//! assert_eq!(deleted.scope(), Scope::Unscoped);
//! ```

use super::filter::{FilterCondition, OrderDirection};

/// Default soft-delete column
pub const DEFAULT_SOFT_DELETE_FIELD: &str = "deleted_at";

/// Which rows are visible before any predicate applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Soft-deleted rows are hidden
    #[default]
    Default,
    /// Every row, including soft-deleted ones
    Unscoped,
}

/// One `ORDER BY` term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: OrderDirection,
}

/// Offset/limit window applied after filtering and ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Rows to skip
    pub offset: u64,
    /// Maximum rows to return
    pub limit: u64,
}

impl Window {
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Window for a 1-indexed page; page 0 is treated as page 1
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        Self {
            offset: page_number.saturating_sub(1) * page_size,
            limit: page_size,
        }
    }
}

/// Description of a scoped, filtered, ordered query over one model
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySet {
    scope: Scope,
    soft_delete_field: String,
    conditions: Vec<FilterCondition>,
    ordering: Vec<OrderBy>,
    window: Option<Window>,
}

impl QuerySet {
    /// Default-scoped query with no predicates
    #[must_use]
    pub fn new() -> Self {
        Self {
            scope: Scope::Default,
            soft_delete_field: DEFAULT_SOFT_DELETE_FIELD.to_string(),
            conditions: Vec::new(),
            ordering: Vec::new(),
            window: None,
        }
    }

    /// Use a different soft-delete column
    #[must_use]
    pub fn with_soft_delete_field(mut self, field: impl Into<String>) -> Self {
        self.soft_delete_field = field.into();
        self
    }

    /// Include soft-deleted rows
    #[must_use]
    pub fn unscoped(mut self) -> Self {
        self.scope = Scope::Unscoped;
        self
    }

    /// Unscoped and restricted to rows whose soft-delete column is set
    #[must_use]
    pub fn only_deleted(self) -> Self {
        let field = self.soft_delete_field.clone();
        self.unscoped().filter(FilterCondition::is_not_null(field))
    }

    /// Add a predicate; all predicates must hold
    #[must_use]
    pub fn filter(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add several predicates
    #[must_use]
    pub fn filter_all(mut self, conditions: impl IntoIterator<Item = FilterCondition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    /// Append an ordering term
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.ordering.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Restrict to a window of rows
    #[must_use]
    pub fn window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    /// Drop any window, e.g. before counting
    #[must_use]
    pub fn without_window(mut self) -> Self {
        self.window = None;
        self
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn soft_delete_field(&self) -> &str {
        &self.soft_delete_field
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn ordering(&self) -> &[OrderBy] {
        &self.ordering
    }

    pub fn window_bounds(&self) -> Option<Window> {
        self.window
    }

    /// Whether soft-deleted rows are visible
    pub fn includes_deleted(&self) -> bool {
        self.scope == Scope::Unscoped
    }
}

impl Default for QuerySet {
    fn default() -> Self {
        Self::new()
    }
}
