//! Error types for the core library subsystem.

use thiserror::Error;

/// Errors surfaced by libraries, the document processor, and the registry.
///
/// Mutations are all-or-nothing: any error from a write operation means the
/// library state is unchanged. The one exception to surfacing is
/// [`Error::InternalInconsistency`], which read paths log and recover from
/// by dropping the offending id.
#[derive(Debug, Error)]
pub enum Error {
    /// Library / document / chunk id does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Id collision on insert
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Embedding dimension disagrees with the library's established dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension established by the library's first chunk
        expected: usize,
        /// Dimension of the offending vector
        actual: usize,
    },

    /// Zero or near-zero vector presented for normalization
    #[error("degenerate vector: norm is zero or near-zero")]
    DegenerateVector,

    /// Upstream failure from the embedding provider
    #[error("embedding provider error: {0}")]
    EmbeddingProvider(String),

    /// Invalid request parameter (k < 1, unknown index type, bad params)
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Index and chunk store disagree; logged, never fatal to reads
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// Operation cancelled before any mutation began
    #[error("operation cancelled")]
    Cancelled,
}

impl From<ragsearch_index::Error> for Error {
    fn from(e: ragsearch_index::Error) -> Self {
        use ragsearch_index::Error as IndexError;
        match e {
            IndexError::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            IndexError::AlreadyExists(id) => Self::AlreadyExists(id.to_string()),
            IndexError::DegenerateVector => Self::DegenerateVector,
            IndexError::InvalidParameter(msg) => Self::InvalidParameter(msg),
        }
    }
}

impl From<ragsearch_embed::Error> for Error {
    fn from(e: ragsearch_embed::Error) -> Self {
        Self::EmbeddingProvider(e.to_string())
    }
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_conversion() {
        let err: Error = ragsearch_index::Error::DimensionMismatch {
            expected: 3,
            actual: 2,
        }
        .into();
        assert!(matches!(
            err,
            Error::DimensionMismatch { expected: 3, actual: 2 }
        ));
    }

    #[test]
    fn test_embed_error_conversion() {
        let err: Error = ragsearch_embed::Error::Provider("boom".into()).into();
        assert!(matches!(err, Error::EmbeddingProvider(_)));
        assert!(err.to_string().contains("boom"));
    }
}
