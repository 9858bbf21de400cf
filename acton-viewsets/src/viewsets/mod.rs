//! Generic CRUD ViewSets
//!
//! A [`ViewSet`] is the shared, read-only configuration for one model: its
//! query source, base query, serializer template, optional filter,
//! permissions and extra actions. Every request gets its own
//! [`ViewSetRequest`], which runs the stages in order:
//!
//! 1. permission check (AND over all permissions)
//! 2. query scoping by action (`ListDeleted` sees only soft-deleted rows)
//! 3. filtering from query parameters
//! 4. pagination
//! 5. serialization, validation and persistence
//!
//! [`routes`] mounts the standard HTTP surface for a ViewSet.

mod action;
mod request;
mod routes;
mod viewset;

pub use action::Action;
pub use request::ViewSetRequest;
pub use routes::routes;
pub use viewset::{ActionScope, ExtraAction, ViewSet};
