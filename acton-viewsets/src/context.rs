//! Per-request context handed to every ViewSet stage
//!
//! [`RequestContext`] is an owned snapshot of one HTTP request: method, URI,
//! headers, path parameters and the buffered body. It is built once per
//! request and never shared between requests.
//!
//! # Example
//!
//! ```rust
//! use acton_viewsets::context::RequestContext;
//! use axum::http::Method;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Params { status: Option<String> }
//!
//! let ctx = RequestContext::new(Method::GET, "/articles?status=draft".parse().unwrap())
//!     .with_param("id", "7");
//!
//! assert_eq!(ctx.param("id"), Some("7"));
//! assert_eq!(ctx.query_param("status").as_deref(), Some("draft"));
//! let params: Params = ctx.bind_query().unwrap();
//! assert_eq!(params.status.as_deref(), Some("draft"));
//! ```

use std::collections::HashMap;
use std::error::Error as _;

use axum::{
    body::{to_bytes, Bytes},
    extract::{Query, Request},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::LengthLimitError;
use serde::{de::DeserializeOwned, Serialize};

use crate::handlers::ApiError;

/// Header carrying the request id set by the server middleware
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Owned view of one HTTP request
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: HashMap<String, String>,
    body: Bytes,
}

impl RequestContext {
    /// Context with no headers, parameters or body
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            params: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Buffer an axum request into a context
    ///
    /// Bodies over `max_payload_bytes` are rejected with `PayloadTooLarge`;
    /// other read failures with `BadRequest`.
    pub async fn from_request(request: Request, max_payload_bytes: usize) -> Result<Self, ApiError> {
        let (parts, body) = request.into_parts();
        let body = to_bytes(body, max_payload_bytes).await.map_err(|e| {
            let too_large = e
                .source()
                .and_then(|inner| inner.downcast_ref::<LengthLimitError>())
                .is_some();
            if too_large {
                tracing::debug!(limit = max_payload_bytes, "request body over payload limit");
                return ApiError::payload_too_large(max_payload_bytes);
            }
            tracing::debug!(error = %e, "failed to buffer request body");
            ApiError::bad_request("Request body could not be read")
        })?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params: HashMap::new(),
            body,
        })
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and content type
    #[must_use]
    pub fn with_json<T: Serialize>(mut self, value: &T) -> Self {
        self.body = serde_json::to_vec(value).map(Bytes::from).unwrap_or_default();
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Path parameter captured by the router
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Single decoded query-string value
    pub fn query_param(&self, name: &str) -> Option<String> {
        Query::<HashMap<String, String>>::try_from_uri(&self.uri)
            .ok()
            .and_then(|Query(mut map)| map.remove(name))
    }

    /// Deserialize the query string onto `T`
    ///
    /// Fails with `BadRequest` when a value does not fit its field.
    pub fn bind_query<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Query::<T>::try_from_uri(&self.uri)
            .map(|Query(value)| value)
            .map_err(|e| ApiError::bad_request(format!("Invalid query parameters: {}", e.body_text())))
    }

    /// Deserialize the body as JSON onto `T`
    ///
    /// An empty body binds as `{}`. Malformed JSON is an internal fault at
    /// this layer; callers that want a client error map it themselves.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let bytes: &[u8] = if self.body.is_empty() { b"{}" } else { &self.body };
        serde_json::from_slice(bytes)
            .map_err(|e| ApiError::internal(format!("Failed to bind request payload: {e}")))
    }

    /// Raw request body
    pub fn payload(&self) -> &Bytes {
        &self.body
    }

    /// Serialize `body` as a JSON response with `status`
    pub fn json<T: Serialize>(&self, status: StatusCode, body: T) -> Response {
        (status, Json(body)).into_response()
    }

    /// Request id assigned by the server middleware
    pub fn request_id(&self) -> Option<&str> {
        self.header(REQUEST_ID_HEADER)
    }

    /// Whether the request carries a non-empty `Authorization` header
    ///
    /// Credential verification happens upstream; this only reports presence.
    pub fn is_authenticated(&self) -> bool {
        self.header(header::AUTHORIZATION.as_str())
            .is_some_and(|v| !v.trim().is_empty())
    }
}
