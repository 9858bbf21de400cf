//! Shared fixtures for the ViewSet integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use acton_viewsets::prelude::*;
use acton_viewsets::query::QueryResult;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub id: ModelId,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "draft")]
    pub status: String,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

fn draft() -> String {
    "draft".to_string()
}

impl Article {
    pub fn new(title: impl Into<String>, status: &str, views: i64) -> Self {
        Self {
            id: 0,
            title: title.into(),
            body: String::new(),
            status: status.to_string(),
            views,
            deleted_at: None,
        }
    }
}

impl Model for Article {
    const NAME: &'static str = "Article";

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

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("title", FieldKind::String).required().max_length(120),
            FieldSpec::new("body", FieldKind::String),
            FieldSpec::new("status", FieldKind::String).max_length(16),
            FieldSpec::new("views", FieldKind::Integer).read_only(),
        ]
    }
}

#[derive(Debug, Deserialize)]
pub struct ArticleFilter {
    pub status: Option<String>,
    pub min_views: Option<i64>,
}

impl FilterSet for ArticleFilter {
    fn apply_filters(&self, _ctx: &RequestContext, mut query: QuerySet) -> QuerySet {
        if let Some(status) = &self.status {
            query = query.filter(FilterCondition::eq("status", status.as_str()));
        }
        if let Some(min) = self.min_views {
            query = query.filter(FilterCondition::gte("views", min));
        }
        query
    }
}

/// Query source that counts writes before delegating to a [`MemoryStore`]
pub struct CountingStore {
    inner: MemoryStore<Article>,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn new(rows: Vec<Article>) -> Self {
        Self {
            inner: MemoryStore::with_rows(rows),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuerySource<Article> for CountingStore {
    async fn find(&self, query: &QuerySet, results: &mut ModelSlice<Article>) -> QueryResult<()> {
        self.inner.find(query, results).await
    }

    async fn first(&self, query: &QuerySet) -> QueryResult<Option<Article>> {
        self.inner.first(query).await
    }

    async fn count(&self, query: &QuerySet) -> QueryResult<u64> {
        self.inner.count(query).await
    }

    async fn insert(&self, entity: Article) -> QueryResult<Article> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(entity).await
    }

    async fn save(&self, entity: Article) -> QueryResult<Article> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.save(entity).await
    }

    async fn soft_delete(&self, id: ModelId) -> QueryResult<Article> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.soft_delete(id).await
    }
}

/// `count` articles titled "Article 1".."Article {count}", all drafts
pub fn articles(count: usize) -> Vec<Article> {
    (1..=count)
        .map(|i| Article::new(format!("Article {i}"), "draft", i as i64))
        .collect()
}

pub fn store(rows: Vec<Article>) -> Arc<CountingStore> {
    Arc::new(CountingStore::new(rows))
}

pub fn viewset(store: &Arc<CountingStore>) -> ViewSet<Article> {
    let source: Arc<dyn QuerySource<Article>> = store.clone();
    ViewSet::new(source)
}

pub fn router(viewset: ViewSet<Article>) -> Router {
    routes(Arc::new(viewset), "/articles")
}

/// Send one request and decode the JSON body (`Null` when empty)
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    auth: bool,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if auth {
        builder = builder.header(header::AUTHORIZATION, "Bearer test-token");
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, false).await
}
