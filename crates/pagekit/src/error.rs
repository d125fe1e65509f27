//! Pagination error types.

use thiserror::Error;

/// Errors surfaced by a pagination request.
///
/// Configuration errors are reported before any store round trip. Store
/// errors carry the stage that failed and the underlying driver error.
#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid page size, must be greater than 0")]
    InvalidPageSize,

    #[error("invalid page number, must be greater than 0")]
    InvalidPage,

    #[error("invalid summary directive '{directive}': {reason}")]
    InvalidSummaryDirective { directive: String, reason: String },

    #[error("invalid comparison operator: {0}")]
    InvalidOperator(String),

    #[error("invalid sort direction: {0}")]
    InvalidDirection(String),

    #[error("invalid sort expression: {0:?}")]
    InvalidSort(String),

    #[error("failed to execute {stage} query: {source}")]
    Store {
        stage: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("prefetch task failed: {0}")]
    Prefetch(String),
}

impl PaginationError {
    /// Wrap a driver error with the pipeline stage that produced it.
    pub fn store(stage: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Store {
            stage: stage.into(),
            source,
        }
    }

    /// Whether the error was raised before touching the store.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Store { .. } | Self::Prefetch(_))
    }
}

/// Result type alias using PaginationError.
pub type Result<T> = std::result::Result<T, PaginationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_error_messages() {
        assert_eq!(
            PaginationError::InvalidPageSize.to_string(),
            "invalid page size, must be greater than 0"
        );
        assert_eq!(
            PaginationError::InvalidPage.to_string(),
            "invalid page number, must be greater than 0"
        );
    }

    #[test]
    fn store_error_keeps_driver_message() {
        let err = PaginationError::store("count", sqlx::Error::RowNotFound);
        let msg = err.to_string();
        assert!(msg.starts_with("failed to execute count query"), "{msg}");
        assert!(msg.contains("no rows returned"), "{msg}");
        assert!(!err.is_configuration());
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(PaginationError::InvalidPage.is_configuration());
        assert!(PaginationError::InvalidSort(String::new()).is_configuration());
    }
}
