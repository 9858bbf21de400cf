//! Extra actions mounted on the article ViewSet

use std::collections::BTreeMap;

use acton_viewsets::prelude::*;
use std::result::Result;
use chrono::Utc;

use crate::models::{Article, STATUSES};

/// `POST /articles/{id}/actions/publish`
pub struct Publish;

#[async_trait]
impl ExtraAction<Article> for Publish {
    async fn handle(&self, request: &ViewSetRequest<'_, Article>) -> Result<Response, ApiError> {
        let mut article = request.get_object().await?;

        if article.status == "published" {
            return Err(ApiError::bad_request("Article is already published")
                .with_entity(Article::NAME, article.id.to_string()));
        }
        if article.body.trim().is_empty() {
            return Err(ApiError::bad_request("Cannot publish an article without a body")
                .with_entity(Article::NAME, article.id.to_string()));
        }

        article.status = "published".to_string();
        article.published_at = Some(Utc::now());

        let saved = request.viewset().source().save(article).await?;
        info!(id = saved.id, "article published");

        Ok(request
            .context()
            .json(StatusCode::OK, ItemResponse::new(saved)))
    }
}

/// `POST /articles/{id}/actions/archive`
pub struct Archive;

#[async_trait]
impl ExtraAction<Article> for Archive {
    async fn handle(&self, request: &ViewSetRequest<'_, Article>) -> Result<Response, ApiError> {
        let mut article = request.get_object().await?;
        article.status = "archived".to_string();

        let saved = request.viewset().source().save(article).await?;
        info!(id = saved.id, "article archived");

        Ok(request
            .context()
            .json(StatusCode::OK, ItemResponse::new(saved)))
    }
}

/// `POST /articles/actions/status-counts`
///
/// Number of active articles in each status.
pub struct StatusCounts;

#[async_trait]
impl ExtraAction<Article> for StatusCounts {
    async fn handle(&self, request: &ViewSetRequest<'_, Article>) -> Result<Response, ApiError> {
        let source = request.viewset().source();
        let mut counts = BTreeMap::new();

        for status in STATUSES {
            let query = request
                .get_queryset()
                .filter(FilterCondition::eq("status", status));
            counts.insert(status, source.count(&query).await?);
        }

        Ok(request
            .context()
            .json(StatusCode::OK, ItemResponse::new(counts)))
    }
}
