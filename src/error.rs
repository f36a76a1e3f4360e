use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entity::PayloadError;
use crate::repository::RepositoryError;

/// Errors raised synchronously by aggregates and value objects.
///
/// These describe programmer or policy mistakes and are returned to the
/// immediate caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid reservation period: start {start} must be before end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("permission denied: {0}")]
    Permission(&'static str),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Failure of anything outside the aggregate: stores, queries, blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("{aggregate} {id} not found")]
    NotFound { aggregate: &'static str, id: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("transition rejected: {0}")]
    Rejected(#[from] DomainError),

    #[error("backend error: {0}")]
    Backend(String),
}

impl CollaboratorError {
    pub fn backend(message: impl Into<String>) -> Self {
        CollaboratorError::Backend(message.into())
    }
}
