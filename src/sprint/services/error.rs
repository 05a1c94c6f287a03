//! Errors returned by the sprint services.

use crate::sprint::{
    domain::{SprintDomainError, SprintId, UserStoryId},
    ports::WorkItemRepositoryError,
};
use thiserror::Error;

/// Service-level errors for sprint operations.
#[derive(Debug, Error)]
pub enum SprintServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] SprintDomainError),
    /// No sprint exists with the given identifier.
    #[error("sprint {0} not found")]
    SprintNotFound(SprintId),
    /// No user story exists with the given identifier.
    #[error("user story {0} not found")]
    UserStoryNotFound(UserStoryId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] WorkItemRepositoryError),
}

/// Result type for sprint service operations.
pub type SprintServiceResult<T> = Result<T, SprintServiceError>;
