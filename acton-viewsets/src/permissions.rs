//! Permission checks gating every ViewSet action
//!
//! A ViewSet holds a list of permissions and allows a request only when
//! every one of them allows it. An empty list allows everything.
//!
//! # Example
//!
//! ```rust
//! use acton_viewsets::context::RequestContext;
//! use acton_viewsets::permissions::{check_all, AllowAny, IsAuthenticated, Permission};
//! use axum::http::Method;
//! use std::sync::Arc;
//!
//! let ctx = RequestContext::new(Method::GET, "/articles".parse().unwrap());
//! let permissions: Vec<Arc<dyn Permission>> = vec![Arc::new(AllowAny), Arc::new(IsAuthenticated)];
//!
//! assert!(!check_all(&permissions, &ctx));
//! assert!(check_all(&[], &ctx));
//! ```

use std::sync::Arc;

use axum::http::Method;

use crate::context::RequestContext;

/// A rule deciding whether a request may proceed
pub trait Permission: Send + Sync {
    fn has_permission(&self, ctx: &RequestContext) -> bool;

    /// Name used in logs when the permission denies
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> Permission for F
where
    F: Fn(&RequestContext) -> bool + Send + Sync,
{
    fn has_permission(&self, ctx: &RequestContext) -> bool {
        self(ctx)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

/// AND over `permissions`; empty allows
pub fn check_all(permissions: &[Arc<dyn Permission>], ctx: &RequestContext) -> bool {
    permissions.iter().all(|permission| {
        let allowed = permission.has_permission(ctx);
        if !allowed {
            tracing::debug!(permission = permission.name(), "permission denied");
        }
        allowed
    })
}

/// Allows every request
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAny;

impl Permission for AllowAny {
    fn has_permission(&self, _ctx: &RequestContext) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "AllowAny"
    }
}

/// Denies every request
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl Permission for DenyAll {
    fn has_permission(&self, _ctx: &RequestContext) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "DenyAll"
    }
}

/// Requires an `Authorization` header
#[derive(Debug, Clone, Copy, Default)]
pub struct IsAuthenticated;

impl Permission for IsAuthenticated {
    fn has_permission(&self, ctx: &RequestContext) -> bool {
        ctx.is_authenticated()
    }

    fn name(&self) -> &'static str {
        "IsAuthenticated"
    }
}

/// Allows only safe methods (GET, HEAD, OPTIONS)
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl Permission for ReadOnly {
    fn has_permission(&self, ctx: &RequestContext) -> bool {
        matches!(*ctx.method(), Method::GET | Method::HEAD | Method::OPTIONS)
    }

    fn name(&self) -> &'static str {
        "ReadOnly"
    }
}

/// Safe methods for everyone, writes only when authenticated
#[derive(Debug, Clone, Copy, Default)]
pub struct IsAuthenticatedOrReadOnly;

impl Permission for IsAuthenticatedOrReadOnly {
    fn has_permission(&self, ctx: &RequestContext) -> bool {
        ReadOnly.has_permission(ctx) || ctx.is_authenticated()
    }

    fn name(&self) -> &'static str {
        "IsAuthenticatedOrReadOnly"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn request(method: Method) -> RequestContext {
        RequestContext::new(method, "/articles".parse().unwrap())
    }

    fn authed(method: Method) -> RequestContext {
        request(method).with_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"))
    }

    #[test]
    fn test_empty_list_allows() {
        assert!(check_all(&[], &request(Method::DELETE)));
    }

    #[test]
    fn test_all_must_allow() {
        let ctx = request(Method::GET);
        let both: Vec<Arc<dyn Permission>> = vec![Arc::new(AllowAny), Arc::new(ReadOnly)];
        assert!(check_all(&both, &ctx));

        let one_denies: Vec<Arc<dyn Permission>> = vec![Arc::new(AllowAny), Arc::new(DenyAll)];
        assert!(!check_all(&one_denies, &ctx));
    }

    #[test]
    fn test_read_only() {
        assert!(ReadOnly.has_permission(&request(Method::GET)));
        assert!(ReadOnly.has_permission(&request(Method::HEAD)));
        assert!(!ReadOnly.has_permission(&request(Method::POST)));
        assert!(!ReadOnly.has_permission(&request(Method::PUT)));
    }

    #[test]
    fn test_is_authenticated() {
        assert!(!IsAuthenticated.has_permission(&request(Method::GET)));
        assert!(IsAuthenticated.has_permission(&authed(Method::GET)));
    }

    #[test]
    fn test_authenticated_or_read_only() {
        assert!(IsAuthenticatedOrReadOnly.has_permission(&request(Method::GET)));
        assert!(!IsAuthenticatedOrReadOnly.has_permission(&request(Method::POST)));
        assert!(IsAuthenticatedOrReadOnly.has_permission(&authed(Method::POST)));
    }

    #[test]
    fn test_closure_permission() {
        let only_admin = |ctx: &RequestContext| ctx.header("x-role") == Some("admin");
        let permissions: Vec<Arc<dyn Permission>> = vec![Arc::new(only_admin)];

        assert!(!check_all(&permissions, &request(Method::GET)));

        let admin = request(Method::GET).with_header(
            header::HeaderName::from_static("x-role"),
            HeaderValue::from_static("admin"),
        );
        assert!(check_all(&permissions, &admin));
    }
}
