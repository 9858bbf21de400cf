//! The [`QuerySource`] trait
//!
//! A query source executes [`QuerySet`] values against a backing store. It is
//! used as a trait object (`Arc<dyn QuerySource<M>>`) so a ViewSet does not
//! need to be generic over the store, which is why the methods go through
//! `async_trait` rather than returning `impl Future`.
//!
//! # Example
//!
//! ```rust,ignore
//! use acton_viewsets::prelude::*;
//!
//! struct PgArticles { pool: PgPool }
//!
//! #[async_trait]
//! impl QuerySource<Article> for PgArticles {
//!     async fn find(&self, query: &QuerySet, results: &mut ModelSlice<Article>) -> QueryResult<()> {
//!         let rows = build_select(query).fetch_all(&self.pool).await?;
//!         results.replace(rows);
//!         Ok(())
//!     }
//!     // ... first, count, insert, save, soft_delete
//! }
//! ```

use async_trait::async_trait;

use super::error::{QueryOperation, QueryResult};
use super::filter::FilterCondition;
use super::queryset::QuerySet;
use crate::model::{Model, ModelId, ModelSlice};

/// Executes queries for one model type
#[async_trait]
pub trait QuerySource<M: Model>: Send + Sync {
    /// Run `query` and replace the contents of `results` with the matching rows
    async fn find(&self, query: &QuerySet, results: &mut ModelSlice<M>) -> QueryResult<()>;

    /// First row matching `query`, if any
    async fn first(&self, query: &QuerySet) -> QueryResult<Option<M>>;

    /// Number of rows matching `query`, ignoring its window
    async fn count(&self, query: &QuerySet) -> QueryResult<u64>;

    /// Persist a new row and return it with its assigned id
    async fn insert(&self, entity: M) -> QueryResult<M>;

    /// Persist changes to an existing row
    ///
    /// Fails with `NotFound` when the id does not exist.
    async fn save(&self, entity: M) -> QueryResult<M>;

    /// Stamp the row's soft-delete column and return the updated row
    ///
    /// Fails with `NotFound` when the id does not exist or is already deleted.
    async fn soft_delete(&self, id: ModelId) -> QueryResult<M>;

    /// Row with primary key `id` within the scope of `query`
    async fn find_by_id(&self, query: &QuerySet, id: ModelId) -> QueryResult<Option<M>> {
        let scoped = query
            .clone()
            .without_window()
            .filter(FilterCondition::eq("id", id));
        self.first(&scoped)
            .await
            .map_err(|e| e.with_operation(QueryOperation::First))
    }
}
