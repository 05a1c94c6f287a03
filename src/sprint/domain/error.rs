//! Error types for sprint domain validation and parsing.

use super::{SprintId, SprintStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned while constructing or transitioning sprint domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SprintDomainError {
    /// The sprint title is shorter than the configured minimum.
    #[error("sprint title '{title}' is too short, expected at least {min_length} characters")]
    TitleTooShort {
        /// The rejected title after trimming.
        title: String,
        /// Minimum accepted length in characters.
        min_length: usize,
    },

    /// The story title is empty after trimming.
    #[error("user story title must not be empty")]
    EmptyStoryTitle,

    /// The task title is empty after trimming.
    #[error("backlog task title must not be empty")]
    EmptyTaskTitle,

    /// The sprint time box ends before it starts.
    #[error("sprint starts at {start} which is after its end {end}")]
    StartAfterEnd {
        /// Requested start instant.
        start: DateTime<Utc>,
        /// Requested end instant.
        end: DateTime<Utc>,
    },

    /// The story code prefix is empty or contains a separator.
    #[error("invalid story code prefix '{0}'")]
    InvalidStoryCodePrefix(String),

    /// The requested lifecycle transition is not permitted.
    #[error("sprint {sprint_id} cannot transition from {from} to {to}")]
    InvalidStateTransition {
        /// Sprint being transitioned.
        sprint_id: SprintId,
        /// Current lifecycle status.
        from: SprintStatus,
        /// Requested lifecycle status.
        to: SprintStatus,
    },

    /// A closed sprint cannot have its content changed.
    #[error("sprint {0} is closed and cannot be modified")]
    SprintClosed(SprintId),
}

/// Error returned while parsing sprint statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sprint status: {0}")]
pub struct ParseSprintStatusError(pub String);

/// Error returned while parsing backlog task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown backlog task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing a story code such as `US-003`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid story code: {0}")]
pub struct ParseStoryCodeError(pub String);
