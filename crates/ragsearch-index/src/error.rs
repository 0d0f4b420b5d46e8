//! Error types for the vector index family.

use uuid::Uuid;

/// Errors that can occur in index operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Vector dimension disagrees with the index's established dimension
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension established by the first vector
        expected: usize,
        /// Dimension of the offending vector
        actual: usize,
    },

    /// Id collision on insert
    #[error("id already present in index: {0}")]
    AlreadyExists(Uuid),

    /// Zero or near-zero vector presented for normalization
    #[error("degenerate vector: norm is zero or near-zero")]
    DegenerateVector,

    /// Malformed index parameters
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
