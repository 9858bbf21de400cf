use acton_viewsets::prelude::*;
use std::result::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Publication states an article may be in
pub const STATUSES: [&str; 3] = ["draft", "published", "archived"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub id: ModelId,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

fn default_status() -> String {
    "draft".to_string()
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
            FieldSpec::new("title", FieldKind::String).required().max_length(200),
            FieldSpec::new("body", FieldKind::String),
            FieldSpec::new("status", FieldKind::String).max_length(16),
            FieldSpec::new("author", FieldKind::String).max_length(80),
            FieldSpec::new("published_at", FieldKind::Timestamp).read_only(),
        ]
    }
}

/// Query-string filters for the article list
#[derive(Debug, Default, Deserialize)]
pub struct ArticleFilter {
    pub status: Option<String>,
    pub author: Option<String>,
    /// Substring match on the title
    pub q: Option<String>,
}

impl FilterSet for ArticleFilter {
    fn apply_filters(&self, _ctx: &RequestContext, mut query: QuerySet) -> QuerySet {
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(FilterCondition::eq("status", status));
        }
        if let Some(author) = self.author.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(FilterCondition::eq("author", author));
        }
        if let Some(q) = self.q.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(FilterCondition::contains("title", q));
        }
        query
    }
}

/// Cross-field checks on article payloads
///
/// Status must be a known state, and an article cannot be created already
/// published without a body.
#[derive(Debug, Default)]
pub struct ArticleHooks;

#[async_trait]
impl SerializerHooks<Article> for ArticleHooks {
    async fn validate(
        &self,
        data: &Value,
        ctx: Option<&SerializerContext>,
        errors: &mut ValidationErrors,
    ) {
        let status = data.get("status").and_then(Value::as_str);

        if let Some(status) = status {
            if !STATUSES.contains(&status) {
                errors.add(
                    "status",
                    "INVALID_CHOICE",
                    format!("status must be one of {}", STATUSES.join(", ")),
                );
            }
        }

        let creating = ctx.is_some_and(|c| c.action == Action::Create);
        let body_empty = data
            .get("body")
            .and_then(Value::as_str)
            .map_or(true, |b| b.trim().is_empty());
        if creating && status == Some("published") && body_empty {
            errors.add("body", "REQUIRED", "published articles need a body");
        }
    }

    async fn create(
        &self,
        base: &ModelSerializer<Article>,
        mut data: Value,
    ) -> Result<Article, ApiError> {
        if data.get("status").and_then(Value::as_str) == Some("published") {
            if let Some(map) = data.as_object_mut() {
                map.insert("published_at".into(), Value::String(Utc::now().to_rfc3339()));
            }
        }
        base.save_new(data).await
    }
}
