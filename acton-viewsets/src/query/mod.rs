//! Query values and the query source abstraction
//!
//! - [`QuerySet`]: immutable description of a scoped, filtered, ordered query
//! - [`FilterCondition`]: one predicate inside a query
//! - [`QuerySource`]: executes query sets against a backing store
//! - [`MemoryStore`]: in-memory query source
//! - [`QueryError`]: structured failure from a query source

mod error;
mod filter;
mod memory;
mod queryset;
mod source;

pub use error::{QueryError, QueryErrorKind, QueryOperation, QueryResult};
pub use filter::{escape_like, FilterCondition, FilterOperator, FilterValue, OrderDirection};
pub use memory::MemoryStore;
pub use queryset::{OrderBy, QuerySet, Scope, Window, DEFAULT_SOFT_DELETE_FIELD};
pub use source::QuerySource;
