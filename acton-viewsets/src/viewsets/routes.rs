//! HTTP surface for a [`ViewSet`]
//!
//! | Method | Path | Action |
//! |--------|------|--------|
//! | GET | `{base}` | list |
//! | POST | `{base}` | create |
//! | GET | `{base}/deleted` | list soft-deleted |
//! | GET | `{base}/{id}` | retrieve |
//! | PUT | `{base}/{id}` | update |
//! | DELETE | `{base}/{id}` | destroy |
//! | POST | `{base}/actions/{name}` | collection action |
//! | POST | `{base}/{id}/actions/{name}` | detail action |

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use super::viewset::{ActionScope, ViewSet};
use crate::context::RequestContext;
use crate::handlers::{ApiError, ItemResponse, ListResponse};
use crate::model::Model;

type Shared<M> = State<Arc<ViewSet<M>>>;
type Params = Path<HashMap<String, String>>;

/// Router serving `viewset` under `base_path`
///
/// ```rust,ignore
/// let app = Router::new()
///     .merge(routes(Arc::new(articles), "/articles"))
///     .merge(routes(Arc::new(authors), "/authors"));
/// ```
pub fn routes<M: Model>(viewset: Arc<ViewSet<M>>, base_path: &str) -> Router {
    let base = base_path.trim_end_matches('/');
    let collection = if base.is_empty() { "/" } else { base };

    tracing::debug!(
        entity = M::NAME,
        base = collection,
        actions = ?viewset.registered_actions(),
        "mounting viewset routes"
    );

    Router::new()
        .route(collection, get(list::<M>).post(create::<M>))
        .route(&format!("{base}/deleted"), get(list_deleted::<M>))
        .route(
            &format!("{base}/{{id}}"),
            get(retrieve::<M>).put(update::<M>).delete(destroy::<M>),
        )
        .route(&format!("{base}/actions/{{name}}"), post(collection_action::<M>))
        .route(&format!("{base}/{{id}}/actions/{{name}}"), post(detail_action::<M>))
        .with_state(viewset)
}

async fn context<M: Model>(
    viewset: &ViewSet<M>,
    params: HashMap<String, String>,
    request: Request,
) -> Result<RequestContext, ApiError> {
    let mut ctx = RequestContext::from_request(request, viewset.max_payload_bytes()).await?;
    for (name, value) in params {
        ctx.set_param(name, value);
    }
    Ok(ctx)
}

async fn list<M: Model>(
    State(viewset): Shared<M>,
    request: Request,
) -> Result<ListResponse<M>, ApiError> {
    let ctx = context(&viewset, HashMap::new(), request).await?;
    viewset.list(ctx).await
}

async fn list_deleted<M: Model>(
    State(viewset): Shared<M>,
    request: Request,
) -> Result<ListResponse<M>, ApiError> {
    let ctx = context(&viewset, HashMap::new(), request).await?;
    viewset.list_deleted(ctx).await
}

async fn create<M: Model>(
    State(viewset): Shared<M>,
    request: Request,
) -> Result<ItemResponse<M>, ApiError> {
    let ctx = context(&viewset, HashMap::new(), request).await?;
    viewset.create(ctx).await
}

async fn retrieve<M: Model>(
    State(viewset): Shared<M>,
    Path(params): Params,
    request: Request,
) -> Result<ItemResponse<M>, ApiError> {
    let ctx = context(&viewset, params, request).await?;
    viewset.retrieve(ctx).await
}

async fn update<M: Model>(
    State(viewset): Shared<M>,
    Path(params): Params,
    request: Request,
) -> Result<ItemResponse<M>, ApiError> {
    let ctx = context(&viewset, params, request).await?;
    viewset.update(ctx).await
}

async fn destroy<M: Model>(
    State(viewset): Shared<M>,
    Path(params): Params,
    request: Request,
) -> Result<StatusCode, ApiError> {
    let ctx = context(&viewset, params, request).await?;
    viewset.destroy(ctx).await
}

async fn collection_action<M: Model>(
    State(viewset): Shared<M>,
    Path(params): Params,
    request: Request,
) -> Response {
    dispatch_extra(&viewset, ActionScope::Collection, params, request).await
}

async fn detail_action<M: Model>(
    State(viewset): Shared<M>,
    Path(params): Params,
    request: Request,
) -> Response {
    dispatch_extra(&viewset, ActionScope::Detail, params, request).await
}

async fn dispatch_extra<M: Model>(
    viewset: &ViewSet<M>,
    scope: ActionScope,
    params: HashMap<String, String>,
    request: Request,
) -> Response {
    let Some(name) = params.get("name").cloned() else {
        return ApiError::internal("Route is missing the name parameter").into_response();
    };

    let result = match context(viewset, params, request).await {
        Ok(ctx) => viewset.extra(&name, scope, ctx).await,
        Err(e) => Err(e),
    };

    result.unwrap_or_else(IntoResponse::into_response)
}
