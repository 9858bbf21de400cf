pub mod handlers;
pub mod models;

use std::sync::Arc;

use acton_viewsets::prelude::*;

use handlers::{Archive, Publish, StatusCounts};
use models::{Article, ArticleFilter, ArticleHooks};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub articles: Arc<MemoryStore<Article>>,
}

impl AppState {
    pub fn new(config: Config, articles: Arc<MemoryStore<Article>>) -> Self {
        Self { config, articles }
    }

    /// Default configuration over an in-memory store seeded with `rows`
    pub fn in_memory(rows: Vec<Article>) -> Self {
        Self::new(Config::default(), Arc::new(MemoryStore::with_rows(rows)))
    }
}

/// The article ViewSet
///
/// Anonymous clients may read; writes need an `Authorization` header.
pub fn article_viewset(state: &AppState) -> ViewSet<Article> {
    let source: Arc<dyn QuerySource<Article>> = state.articles.clone();

    ViewSet::new(source)
        .with_config(&state.config.viewset)
        .with_serializer(ModelSerializerTemplate::<Article>::new().with_hooks(ArticleHooks))
        .with_filter::<ArticleFilter>()
        .with_permission(IsAuthenticatedOrReadOnly)
        .with_ordering_fields(["id", "title", "status", "published_at"])
        .register_detail_action("publish", Publish)
        .register_detail_action("archive", Archive)
        .register_action("status-counts", StatusCounts)
}

/// Full service router: probes plus the article routes
pub fn app(state: AppState) -> Router {
    let articles = routes(Arc::new(article_viewset(&state)), "/api/v1/articles");

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::readiness))
        .with_state(state)
        .merge(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn article(title: &str, body: &str, status: &str) -> Article {
        Article {
            id: 0,
            title: title.to_string(),
            body: body.to_string(),
            status: status.to_string(),
            author: "ada".to_string(),
            published_at: None,
            deleted_at: None,
        }
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer demo");
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

    #[tokio::test]
    async fn test_probes_are_mounted() {
        let app = app(AppState::in_memory(Vec::new()));
        let (status, _) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_status_is_rejected() {
        let app = app(AppState::in_memory(Vec::new()));
        let payload = json!({ "title": "Hi", "status": "secret" });

        let (status, body) = call(&app, Method::POST, "/api/v1/articles", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field_errors"][0]["code"], "INVALID_CHOICE");
    }

    #[tokio::test]
    async fn test_creating_published_article_stamps_publish_time() {
        let app = app(AppState::in_memory(Vec::new()));

        let empty = json!({ "title": "Hi", "status": "published" });
        let (status, body) = call(&app, Method::POST, "/api/v1/articles", Some(empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field_errors"][0]["field"], "body");

        let full = json!({ "title": "Hi", "body": "Text", "status": "published" });
        let (status, body) = call(&app, Method::POST, "/api/v1/articles", Some(full)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["data"]["published_at"].is_string());
    }

    #[tokio::test]
    async fn test_publish_action() {
        let state = AppState::in_memory(vec![
            article("Ready", "Some text", "draft"),
            article("Empty", "", "draft"),
        ]);
        let app = app(state);

        let (status, body) = call(&app, Method::POST, "/api/v1/articles/1/actions/publish", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "published");

        let (status, _) = call(&app, Method::POST, "/api/v1/articles/1/actions/publish", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::POST, "/api/v1/articles/2/actions/publish", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_counts_and_title_search() {
        let state = AppState::in_memory(vec![
            article("Rust tips", "a", "published"),
            article("Rust traits", "b", "draft"),
            article("Go notes", "c", "draft"),
        ]);
        let app = app(state);

        let (status, body) =
            call(&app, Method::POST, "/api/v1/articles/actions/status-counts", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["draft"], 2);
        assert_eq!(body["data"]["published"], 1);
        assert_eq!(body["data"]["archived"], 0);

        let (_, body) = call(&app, Method::GET, "/api/v1/articles?q=Rust&sort=title", None).await;
        assert_eq!(body["pagination"]["total"], 2);
        assert_eq!(body["data"][0]["title"], "Rust tips");
    }

    #[tokio::test]
    async fn test_title_search_wildcards_are_literal() {
        let state = AppState::in_memory(vec![
            article("100% Rust", "a", "draft"),
            article(&"a".repeat(200), "b", "draft"),
        ]);
        let app = app(state);

        let (status, body) = call(&app, Method::GET, "/api/v1/articles?q=0%25%20R", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 1);

        let many = "%25".repeat(40);
        let uri = format!("/api/v1/articles?q={many}x");
        let (status, body) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 0);
    }
}
