use acton_viewsets::prelude::{QuerySet, QuerySource};
use axum::{extract::State, http::StatusCode};

use crate::AppState;

/// Health check endpoint
///
/// Returns "ok" if the service is running.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness check endpoint
///
/// Ready once the article store answers a count.
pub async fn readiness(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    state
        .articles
        .count(&QuerySet::new())
        .await
        .map(|_| "ready")
        .map_err(|e| {
            tracing::warn!("Article store not ready: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn test_readiness() {
        let state = AppState::in_memory(Vec::new());
        assert_eq!(readiness(State(state)).await, Ok("ready"));
    }
}
