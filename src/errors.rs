use thiserror::Error;

/// Classification of knowledge-store failures.
///
/// Transient failures (connection resets, pool timeouts) are worth one retry
/// on the vector-search path; structural failures (missing vector index,
/// undefined function) must fall back to text search immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Transient,
    Structural,
}

#[derive(Error, Debug)]
pub enum FloraRagError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Knowledge store error ({kind:?}): {message}")]
    KnowledgeStore {
        kind: StoreErrorKind,
        message: String,
    },

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Model call error: {0}")]
    ModelCall(String),

    #[error("Response parse error: {0}")]
    ResponseParse(String),

    #[error("Knowledge validation error: {0}")]
    KnowledgeValidation(String),

    #[error("Batch not found: {0}")]
    BatchNotFound(uuid::Uuid),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FloraRagError {
    /// Build a knowledge-store error from a raw sqlx error, classifying it
    /// as transient or structural.
    pub fn from_store_error(err: &sqlx::Error) -> Self {
        Self::KnowledgeStore {
            kind: classify_store_error(err),
            message: err.to_string(),
        }
    }

    /// Whether a retry is worth attempting for this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::KnowledgeStore {
                kind: StoreErrorKind::Transient,
                ..
            }
        )
    }
}

/// Classify a sqlx error as transient (retryable) or structural.
///
/// Postgres reports a missing similarity-search function, a missing vector
/// column, or an absent pgvector extension with SQLSTATE codes in the 42xxx
/// class; those never succeed on retry.
pub fn classify_store_error(err: &sqlx::Error) -> StoreErrorKind {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreErrorKind::Transient
        }
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // 42xxx: undefined_function, undefined_table, undefined_column, ...
            Some(code) if code.starts_with("42") => StoreErrorKind::Structural,
            Some("0A000") => StoreErrorKind::Structural, // feature_not_supported
            _ => StoreErrorKind::Transient,
        },
        _ => StoreErrorKind::Structural,
    }
}

pub type Result<T> = std::result::Result<T, FloraRagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_are_transient() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ));
        assert_eq!(classify_store_error(&err), StoreErrorKind::Transient);
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        assert_eq!(
            classify_store_error(&sqlx::Error::PoolTimedOut),
            StoreErrorKind::Transient
        );
    }

    #[test]
    fn test_row_not_found_is_structural() {
        assert_eq!(
            classify_store_error(&sqlx::Error::RowNotFound),
            StoreErrorKind::Structural
        );
    }

    #[test]
    fn test_is_transient_flag() {
        let err = FloraRagError::KnowledgeStore {
            kind: StoreErrorKind::Transient,
            message: "connection reset".to_string(),
        };
        assert!(err.is_transient());

        let err = FloraRagError::EmbeddingService("timeout".to_string());
        assert!(!err.is_transient());
    }
}
