//! API error types for ViewSet actions
//!
//! [`ApiError`] is the single failure type every ViewSet stage returns. It
//! maps onto an HTTP status through [`ApiErrorKind`] and renders as a JSON
//! body through `IntoResponse`, logging with structured fields on the way.
//!
//! # Example
//!
//! ```rust
//! use acton_viewsets::handlers::{ApiError, ApiErrorKind};
//! use acton_viewsets::viewsets::Action;
//!
//! let error = ApiError::not_found("Article", "999").with_action(Action::Update);
//! assert_eq!(error.kind, ApiErrorKind::NotFound);
//! assert_eq!(error.kind.status_code().as_u16(), 404);
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::query::{QueryError, QueryErrorKind, QueryOperation};
use crate::serializers::{FieldError, ValidationErrors};
use crate::viewsets::Action;

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Entity was not found in the active scope
    NotFound,
    /// Query parameters or path values could not be bound
    BadRequest,
    /// Request body exceeded the configured payload limit
    PayloadTooLarge,
    /// Serializer rejected the payload
    ValidationFailed,
    /// A permission denied the request
    Forbidden,
    /// Unexpected fault; the message is not shown to clients
    InternalError,
    /// The query source is unreachable or timed out
    ServiceUnavailable,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::PayloadTooLarge => write!(f, "payload_too_large"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
        }
    }
}

impl ApiErrorKind {
    /// HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest | Self::ValidationFailed => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Upper-case error code string, e.g. `NOT_FOUND`
    #[must_use]
    pub fn error_code(&self) -> String {
        self.to_string().to_uppercase()
    }
}

/// Structured API error with action context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The action being dispatched when the error occurred
    pub action: Action,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Client-facing message
    pub message: String,
    /// The type of entity involved (e.g. "Article")
    pub entity_type: Option<String>,
    /// The id of the entity involved
    pub entity_id: Option<String>,
    /// Per-field validation errors, only for `ValidationFailed`
    pub field_errors: Vec<FieldError>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            action: Action::Unspecified,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
            field_errors: Vec::new(),
        }
    }

    /// Entity with this id is not in scope
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, "Entity not found").with_entity(entity_type, entity_id)
    }

    /// Request parameters could not be bound
    ///
    /// ```rust
    /// use acton_viewsets::handlers::ApiError;
    ///
    /// let error = ApiError::bad_request("invalid value for 'min_views'");
    /// assert_eq!(error.kind.status_code().as_u16(), 400);
    /// ```
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::BadRequest, message)
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            ApiErrorKind::PayloadTooLarge,
            format!("Request body exceeds {limit} bytes"),
        )
    }

    /// Serializer validation failed with `errors`
    pub fn validation_failed(errors: ValidationErrors) -> Self {
        let mut error = Self::new(ApiErrorKind::ValidationFailed, "Validation failed");
        error.field_errors = errors.into_vec();
        error
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Forbidden, message)
    }

    /// Unexpected fault; `message` is logged but hidden from clients
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InternalError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::ServiceUnavailable, message)
    }

    /// Attach entity context
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Record the action the error belongs to
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Whether the fault is on the server side
    pub fn is_server_error(&self) -> bool {
        self.kind.status_code().is_server_error()
    }

    /// Message safe to show a client
    pub fn public_message(&self) -> &str {
        match self.kind {
            ApiErrorKind::InternalError => "An internal error occurred",
            ApiErrorKind::ServiceUnavailable => "Service temporarily unavailable",
            _ => &self.message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API {} error", self.kind)?;
        if self.action != Action::Unspecified {
            write!(f, " during {}", self.action)?;
        }
        write!(f, ": {}", self.message)?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Response body for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    pub code: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        if status.is_server_error() {
            tracing::error!(
                action = %self.action,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
        } else {
            tracing::warn!(
                action = %self.action,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                field_errors = self.field_errors.len(),
                "API error: {}", self.message
            );
        }

        let action = match self.action {
            Action::Unspecified => None,
            ref action => Some(action.to_string()),
        };

        let body = ApiErrorResponse {
            error: self.public_message().to_string(),
            code: self.kind.error_code(),
            status: status.as_u16(),
            action,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            field_errors: self.field_errors,
        };

        (status, Json(body)).into_response()
    }
}

fn query_operation_to_action(op: QueryOperation) -> Action {
    match op {
        QueryOperation::Find | QueryOperation::Count => Action::List,
        QueryOperation::First => Action::Retrieve,
        QueryOperation::Insert => Action::Create,
        QueryOperation::Save => Action::Update,
        QueryOperation::SoftDelete => Action::Destroy,
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let kind = match err.kind {
            QueryErrorKind::NotFound => ApiErrorKind::NotFound,
            QueryErrorKind::ConnectionFailed | QueryErrorKind::Timeout => {
                ApiErrorKind::ServiceUnavailable
            }
            QueryErrorKind::InvalidQuery
            | QueryErrorKind::SerializationError
            | QueryErrorKind::Backend => ApiErrorKind::InternalError,
        };

        Self {
            action: query_operation_to_action(err.operation),
            kind,
            message: err.message,
            entity_type: err.entity_type,
            entity_id: err.entity_id,
            field_errors: Vec::new(),
        }
    }
}
