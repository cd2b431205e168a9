//! Store error model.

use thiserror::Error;

/// Storage-layer error, backend-agnostic.
///
/// Postgres error codes are translated at the sqlx boundary (23505 unique →
/// `Conflict`, 23503 foreign key → `MissingReference`); everything else is
/// `Backend`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness rule was violated (duplicate code, second current price, …).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced row does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// Backend failure (connectivity, serialization, unexpected data).
    #[error("store backend error: {0}")]
    Backend(String),
}
