//! In-memory [`QuerySource`]
//!
//! Rows live in a `tokio::sync::RwLock<BTreeMap>` keyed by id. Predicates
//! and ordering are evaluated on each row's JSON form, so any serde model
//! works without per-field glue.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::error::{QueryError, QueryOperation, QueryResult};
use super::filter::{compare_json, OrderDirection};
use super::queryset::{QuerySet, Scope};
use super::source::QuerySource;
use crate::model::{Model, ModelId, ModelSlice};

/// Thread-safe in-memory store for one model type
#[derive(Debug)]
pub struct MemoryStore<M> {
    rows: RwLock<BTreeMap<ModelId, M>>,
    next_id: AtomicI64,
}

impl<M: Model> MemoryStore<M> {
    /// Empty store; the first inserted row gets id 1
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Store pre-populated with `rows`
    ///
    /// Rows with a non-positive id are assigned the next free id.
    #[must_use]
    pub fn with_rows(rows: impl IntoIterator<Item = M>) -> Self {
        let mut map = BTreeMap::new();
        let mut pending = Vec::new();

        for row in rows {
            if row.id() > 0 {
                map.insert(row.id(), row);
            } else {
                pending.push(row);
            }
        }

        let mut next = map.keys().next_back().copied().unwrap_or(0) + 1;
        for mut row in pending {
            row.set_id(next);
            map.insert(next, row);
            next += 1;
        }

        Self {
            rows: RwLock::new(map),
            next_id: AtomicI64::new(next),
        }
    }

    /// Total rows stored, including soft-deleted ones
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn allocate_id(&self) -> ModelId {
        self.next_id.fetch_add(1, AtomicOrdering::SeqCst)
    }

    /// Rows matching scope and predicates, ordered, before windowing
    fn evaluate(
        rows: &BTreeMap<ModelId, M>,
        query: &QuerySet,
        operation: QueryOperation,
    ) -> QueryResult<Vec<(Value, M)>> {
        let mut matched = Vec::new();

        for row in rows.values() {
            let doc = serde_json::to_value(row)
                .map_err(|e| QueryError::serialization_error(operation, e.to_string()))?;

            if !doc.is_object() {
                return Err(QueryError::invalid_query(
                    operation,
                    format!("{} rows must serialize to JSON objects", M::NAME),
                ));
            }

            if query.scope() == Scope::Default && is_soft_deleted(&doc, query.soft_delete_field()) {
                continue;
            }

            if query.conditions().iter().all(|c| c.matches(&doc)) {
                matched.push((doc, row.clone()));
            }
        }

        if !query.ordering().is_empty() {
            matched.sort_by(|(a, _), (b, _)| {
                for term in query.ordering() {
                    let left = a.get(&term.field).unwrap_or(&Value::Null);
                    let right = b.get(&term.field).unwrap_or(&Value::Null);
                    let ord = compare_json(left, right).unwrap_or(Ordering::Equal);
                    let ord = match term.direction {
                        OrderDirection::Ascending => ord,
                        OrderDirection::Descending => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        Ok(matched)
    }
}

impl<M: Model> Default for MemoryStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

fn is_soft_deleted(doc: &Value, field: &str) -> bool {
    doc.get(field).map(|v| !v.is_null()).unwrap_or(false)
}

#[async_trait]
impl<M: Model> QuerySource<M> for MemoryStore<M> {
    async fn find(&self, query: &QuerySet, results: &mut ModelSlice<M>) -> QueryResult<()> {
        let rows = self.rows.read().await;
        let matched = Self::evaluate(&rows, query, QueryOperation::Find)?;

        let (offset, limit) = match query.window_bounds() {
            Some(window) => (window.offset as usize, window.limit as usize),
            None => (0, usize::MAX),
        };

        results.replace(
            matched
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(|(_, row)| row),
        );

        tracing::trace!(entity = M::NAME, rows = results.len(), "memory find");
        Ok(())
    }

    async fn first(&self, query: &QuerySet) -> QueryResult<Option<M>> {
        let rows = self.rows.read().await;
        let matched = Self::evaluate(&rows, query, QueryOperation::First)?;
        let offset = query.window_bounds().map(|w| w.offset as usize).unwrap_or(0);
        Ok(matched.into_iter().nth(offset).map(|(_, row)| row))
    }

    async fn count(&self, query: &QuerySet) -> QueryResult<u64> {
        let rows = self.rows.read().await;
        let matched = Self::evaluate(&rows, query, QueryOperation::Count)?;
        Ok(matched.len() as u64)
    }

    async fn insert(&self, mut entity: M) -> QueryResult<M> {
        let mut rows = self.rows.write().await;
        let id = self.allocate_id();
        entity.set_id(id);
        rows.insert(id, entity.clone());

        tracing::debug!(entity = M::NAME, id, "memory insert");
        Ok(entity)
    }

    async fn save(&self, entity: M) -> QueryResult<M> {
        let mut rows = self.rows.write().await;
        let id = entity.id();

        match rows.get_mut(&id) {
            Some(slot) => {
                *slot = entity.clone();
                tracing::debug!(entity = M::NAME, id, "memory save");
                Ok(entity)
            }
            None => Err(QueryError::not_found(M::NAME, id.to_string())
                .with_operation(QueryOperation::Save)),
        }
    }

    async fn soft_delete(&self, id: ModelId) -> QueryResult<M> {
        let mut rows = self.rows.write().await;

        match rows.get_mut(&id) {
            Some(row) if row.deleted_at().is_none() => {
                row.set_deleted_at(Some(Utc::now()));
                tracing::debug!(entity = M::NAME, id, "memory soft delete");
                Ok(row.clone())
            }
            _ => Err(QueryError::not_found(M::NAME, id.to_string())
                .with_operation(QueryOperation::SoftDelete)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterCondition, QueryErrorKind, Window};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Post {
        #[serde(default)]
        id: ModelId,
        title: String,
        views: i64,
        #[serde(default)]
        deleted_at: Option<DateTime<Utc>>,
    }

    impl Model for Post {
        const NAME: &'static str = "Post";

        fn id(&self) -> ModelId {
            self.id
        }

        fn set_id(&mut self, id: ModelId) {
            self.id = id;
        }

        fn deleted_at(&self) -> Option<DateTime<Utc>> {
            self.deleted_at
        }

        fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
            self.deleted_at = at;
        }
    }

    fn post(title: &str, views: i64) -> Post {
        Post {
            id: 0,
            title: title.to_string(),
            views,
            deleted_at: None,
        }
    }

    fn seeded() -> MemoryStore<Post> {
        let mut gone = post("gone", 5);
        gone.deleted_at = Some(Utc::now());
        MemoryStore::with_rows(vec![post("alpha", 30), post("beta", 10), post("gamma", 20), gone])
    }

    #[tokio::test]
    async fn test_with_rows_assigns_sequential_ids() {
        let store = seeded();
        assert_eq!(store.len().await, 4);

        let inserted = store.insert(post("delta", 1)).await.unwrap();
        assert_eq!(inserted.id, 5);
    }

    #[tokio::test]
    async fn test_default_scope_hides_deleted_rows() {
        let store = seeded();
        assert_eq!(store.count(&QuerySet::new()).await.unwrap(), 3);
        assert_eq!(store.count(&QuerySet::new().unscoped()).await.unwrap(), 4);
        assert_eq!(store.count(&QuerySet::new().only_deleted()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_applies_filters_ordering_and_window() {
        let store = seeded();
        let query = QuerySet::new()
            .filter(FilterCondition::gte("views", 10_i64))
            .order_by("views", OrderDirection::Descending)
            .window(Window::new(1, 1));

        let mut results = ModelSlice::new();
        store.find(&query, &mut results).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results.as_slice()[0].title, "gamma");
    }

    #[tokio::test]
    async fn test_find_replaces_previous_contents() {
        let store = seeded();
        let mut results: ModelSlice<Post> = vec![post("stale", 0)].into();
        store
            .find(&QuerySet::new().filter(FilterCondition::eq("title", "beta")), &mut results)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.as_slice()[0].title, "beta");
    }

    #[tokio::test]
    async fn test_count_ignores_window() {
        let store = seeded();
        let query = QuerySet::new().window(Window::new(0, 1));
        assert_eq!(store.count(&query).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_find_by_id_respects_scope() {
        let store = seeded();
        assert!(store.find_by_id(&QuerySet::new(), 1).await.unwrap().is_some());
        assert!(store.find_by_id(&QuerySet::new(), 4).await.unwrap().is_none());
        assert!(store
            .find_by_id(&QuerySet::new().unscoped(), 4)
            .await
            .unwrap()
            .is_some());
        assert!(store.find_by_id(&QuerySet::new(), 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_requires_existing_row() {
        let store = seeded();

        let mut existing = store.find_by_id(&QuerySet::new(), 2).await.unwrap().unwrap();
        existing.views = 99;
        let saved = store.save(existing).await.unwrap();
        assert_eq!(saved.views, 99);

        let mut ghost = post("ghost", 0);
        ghost.id = 42;
        let err = store.save(ghost).await.unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::NotFound);
        assert_eq!(err.operation, QueryOperation::Save);
    }

    #[tokio::test]
    async fn test_soft_delete_stamps_row_once() {
        let store = seeded();

        let deleted = store.soft_delete(1).await.unwrap();
        assert!(deleted.deleted_at.is_some());
        assert_eq!(store.count(&QuerySet::new()).await.unwrap(), 2);

        let err = store.soft_delete(1).await.unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_custom_soft_delete_field() {
        let store = seeded();
        let query = QuerySet::new().with_soft_delete_field("nonexistent");
        assert_eq!(store.count(&query).await.unwrap(), 4);
    }
}
