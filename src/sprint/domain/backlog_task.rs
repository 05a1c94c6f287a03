//! Backlog task entity.

use super::{Badge, BacklogTaskId, ParseTaskStatusError, SprintDomainError, UserStoryId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Backlog task workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BacklogTaskStatus {
    /// Work has not started.
    Todo,
    /// Work is underway.
    InProgress,
    /// Work is being verified.
    InTesting,
    /// Work is finished.
    Done,
}

impl BacklogTaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::InTesting => "in-testing",
            Self::Done => "done",
        }
    }

    /// Returns `true` for statuses that count as work underway.
    #[must_use]
    pub const fn is_underway(self) -> bool {
        matches!(self, Self::InProgress | Self::InTesting)
    }
}

impl TryFrom<&str> for BacklogTaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "todo" => Ok(Self::Todo),
            "in-progress" => Ok(Self::InProgress),
            "in-testing" => Ok(Self::InTesting),
            "done" => Ok(Self::Done),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Backlog task entity.
///
/// Sprint membership is derived from `user_story_ids`; it is never stored on
/// the task itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogTask {
    id: BacklogTaskId,
    title: String,
    status: BacklogTaskStatus,
    #[serde(default)]
    user_story_ids: Vec<UserStoryId>,
    #[serde(default)]
    badge: Option<Badge>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted backlog task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBacklogTaskData {
    /// Persisted task identifier.
    pub id: BacklogTaskId,
    /// Task title.
    pub title: String,
    /// Workflow status.
    pub status: BacklogTaskStatus,
    /// Stories this task implements.
    pub user_story_ids: Vec<UserStoryId>,
    /// Denormalized sprint marker.
    pub badge: Option<Badge>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl BacklogTask {
    /// Creates a task in [`BacklogTaskStatus::Todo`].
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::EmptyTaskTitle`] when the title is blank.
    pub fn new(
        title: impl Into<String>,
        user_story_ids: Vec<UserStoryId>,
        clock: &impl Clock,
    ) -> Result<Self, SprintDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SprintDomainError::EmptyTaskTitle);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: BacklogTaskId::new(),
            title: trimmed.to_owned(),
            status: BacklogTaskStatus::Todo,
            user_story_ids,
            badge: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedBacklogTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            status: data.status,
            user_story_ids: data.user_story_ids,
            badge: data.badge,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &BacklogTaskId {
        &self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn status(&self) -> BacklogTaskStatus {
        self.status
    }

    /// Returns the implemented stories.
    #[must_use]
    pub fn user_story_ids(&self) -> &[UserStoryId] {
        &self.user_story_ids
    }

    /// Returns the sprint marker.
    #[must_use]
    pub const fn badge(&self) -> Option<Badge> {
        self.badge
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the task is done.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == BacklogTaskStatus::Done
    }

    /// Returns `true` when at least one implemented story is in `story_ids`.
    #[must_use]
    pub fn references_any(&self, story_ids: &BTreeSet<&UserStoryId>) -> bool {
        self.user_story_ids.iter().any(|id| story_ids.contains(id))
    }

    /// Moves the task to another workflow status.
    pub fn set_status(&mut self, status: BacklogTaskStatus, clock: &impl Clock) {
        if self.status != status {
            self.status = status;
            self.touch(clock);
        }
    }

    /// Sets the badge, returning `true` when it changed.
    pub fn set_badge(&mut self, badge: Option<Badge>, clock: &impl Clock) -> bool {
        if self.badge == badge {
            return false;
        }
        self.badge = badge;
        self.touch(clock);
        true
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
