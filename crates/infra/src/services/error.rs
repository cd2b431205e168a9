//! Service error model.

use thiserror::Error;

use bodega_core::DomainError;

use crate::stores::error::StoreError;

/// Application-service error, the single error surface handed to transports.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request would break a maintained invariant or needs configuration
    /// that is absent (e.g. converting through a currency with no rate).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The addressed resource does not exist in the caller's company.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness rule was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The storage layer failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::NotFound => ServiceError::NotFound("resource"),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::MissingReference(msg) => ServiceError::Conflict(msg),
            StoreError::Backend(_) => ServiceError::Store(err),
        }
    }
}
