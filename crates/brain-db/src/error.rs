//! Error types for the database layer

use thiserror::Error;

/// Result alias used across the database layer
pub type DbResult<T> = Result<T, DbError>;

/// Database layer errors
#[derive(Debug, Error)]
pub enum DbError {
    // =========================================================================
    // Pool Errors
    // =========================================================================
    #[error("Connection pool exhausted: no connection became available within the acquire timeout")]
    PoolExhausted,

    #[error("Connection pool has been shut down")]
    PoolClosed,

    // =========================================================================
    // Driver Errors
    // =========================================================================
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// A statement in an atomic batch failed and the whole batch was rolled
    /// back. `index` is the position of the failing statement; an index equal
    /// to the batch length means the final COMMIT itself failed.
    #[error("Transaction failed at statement {index}: {message}")]
    Transaction { index: usize, message: String },
}

impl DbError {
    /// Check if this is a pool-level error (exhausted or closed)
    pub fn is_pool_error(&self) -> bool {
        matches!(self, Self::PoolExhausted | Self::PoolClosed)
    }

    /// Index of the failing statement for transaction errors
    pub fn failing_index(&self) -> Option<usize> {
        match self {
            Self::Transaction { index, .. } => Some(*index),
            _ => None,
        }
    }
}
