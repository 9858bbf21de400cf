//! Query source error types
//!
//! Structured errors for [`QuerySource`](super::QuerySource) calls, carrying
//! the operation, a category and the entity involved so the HTTP layer can
//! map them onto status codes without string matching.
//!
//! # Example
//!
//! ```rust
//! use acton_viewsets::query::{QueryError, QueryErrorKind};
//!
//! let error = QueryError::not_found("Article", "42");
//! assert!(matches!(error.kind, QueryErrorKind::NotFound));
//! assert_eq!(error.entity_id.as_deref(), Some("42"));
//! ```

use std::fmt;

/// Query source call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOperation {
    /// Executing a query into a result container
    Find,
    /// Fetching the first matching row
    First,
    /// Counting matching rows
    Count,
    /// Inserting a new row
    Insert,
    /// Saving an existing row
    Save,
    /// Marking a row as deleted
    SoftDelete,
}

impl fmt::Display for QueryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Find => write!(f, "find"),
            Self::First => write!(f, "first"),
            Self::Count => write!(f, "count"),
            Self::Insert => write!(f, "insert"),
            Self::Save => write!(f, "save"),
            Self::SoftDelete => write!(f, "soft_delete"),
        }
    }
}

/// Category of query source failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    /// No row matched
    NotFound,
    /// The backing store could not be reached
    ConnectionFailed,
    /// The call did not finish in time
    Timeout,
    /// The query references something the store cannot evaluate
    InvalidQuery,
    /// A row could not be converted to or from its stored form
    SerializationError,
    /// Any other store failure
    Backend,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::InvalidQuery => write!(f, "invalid_query"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::Backend => write!(f, "backend"),
        }
    }
}

/// Structured query source error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    /// The call that failed
    pub operation: QueryOperation,
    /// The category of failure
    pub kind: QueryErrorKind,
    /// Human-readable message, may contain store internals
    pub message: String,
    /// Entity type involved, e.g. "Article"
    pub entity_type: Option<String>,
    /// Entity id involved
    pub entity_id: Option<String>,
}

impl QueryError {
    pub fn new(operation: QueryOperation, kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// No row with this id exists in scope
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self::new(QueryOperation::First, QueryErrorKind::NotFound, "Entity not found")
            .with_entity(entity_type, entity_id)
    }

    pub fn connection_failed(operation: QueryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, QueryErrorKind::ConnectionFailed, message)
    }

    pub fn timeout(operation: QueryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, QueryErrorKind::Timeout, message)
    }

    pub fn invalid_query(operation: QueryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, QueryErrorKind::InvalidQuery, message)
    }

    pub fn serialization_error(operation: QueryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, QueryErrorKind::SerializationError, message)
    }

    pub fn backend(operation: QueryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, QueryErrorKind::Backend, message)
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

    /// Override the failing operation
    #[must_use]
    pub fn with_operation(mut self, operation: QueryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Transient failures that a caller could retry
    ///
    /// ViewSets never retry; this is exposed for logging.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            QueryErrorKind::ConnectionFailed | QueryErrorKind::Timeout
        )
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Query {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for QueryError {}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_error(QueryOperation::Find, err.to_string())
    }
}

/// Result alias for query source calls
pub type QueryResult<T> = Result<T, QueryError>;
