//! HTTP-facing types shared by ViewSet actions
//!
//! - [`ApiError`]: failure type of every stage, with status code mapping
//! - [`ItemResponse`] / [`ListResponse`]: success envelopes
//! - [`ListQuery`]: `page`, `per_page`, `sort` and `order` parameters

mod error;
mod query;
mod response;

pub use error::{ApiError, ApiErrorKind, ApiErrorResponse};
pub use query::{ListQuery, SortOrder, DEFAULT_PER_PAGE, MAX_PER_PAGE};
pub use response::{ItemResponse, ListResponse, PaginationMeta, ResponseMeta};
