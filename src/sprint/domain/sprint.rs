//! Sprint aggregate root and its lifecycle state machine.

use super::{ParseSprintStatusError, SprintDomainError, SprintId, UserStoryId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress reported by a closed sprint.
pub const CLOSED_SPRINT_PROGRESS: u8 = 100;

/// Sprint lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    /// Sprint has been scheduled but has not started.
    Planned,
    /// Sprint is running.
    Active,
    /// Sprint has been closed. Terminal.
    Done,
}

impl SprintStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Done => "done",
        }
    }

    /// Returns `true` when no further transition is permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns `true` when the lifecycle permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Planned, Self::Active | Self::Done) | (Self::Active, Self::Done)
        )
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SprintStatus {
    type Error = ParseSprintStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "planned" => Ok(Self::Planned),
            "active" => Ok(Self::Active),
            "done" => Ok(Self::Done),
            _ => Err(ParseSprintStatusError(value.to_owned())),
        }
    }
}

/// Validated scheduling input for a new sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintDraft {
    title: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

impl SprintDraft {
    /// Validates a sprint title and time box.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::TitleTooShort`] when the trimmed title has
    /// fewer than `min_title_length` characters, or
    /// [`SprintDomainError::StartAfterEnd`] when `start_date > end_date`.
    pub fn new(
        title: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        min_title_length: usize,
    ) -> Result<Self, SprintDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.chars().count() < min_title_length {
            return Err(SprintDomainError::TitleTooShort {
                title: trimmed.to_owned(),
                min_length: min_title_length,
            });
        }
        if start_date > end_date {
            return Err(SprintDomainError::StartAfterEnd {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            title: trimmed.to_owned(),
            start_date,
            end_date,
        })
    }
}

/// Sprint aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    id: SprintId,
    title: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: SprintStatus,
    progress: u8,
    velocity: u32,
    #[serde(default)]
    user_story_ids: Vec<UserStoryId>,
    closed_at: Option<DateTime<Utc>>,
    has_review: bool,
    has_retrospective: bool,
    #[serde(default)]
    is_active: Option<bool>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted sprint aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSprintData {
    /// Persisted sprint identifier.
    pub id: SprintId,
    /// Persisted title.
    pub title: String,
    /// Start of the time box.
    pub start_date: DateTime<Utc>,
    /// End of the time box.
    pub end_date: DateTime<Utc>,
    /// Persisted lifecycle status.
    pub status: SprintStatus,
    /// Completion percentage.
    pub progress: u8,
    /// Sum of story points.
    pub velocity: u32,
    /// Ordered push-reference list of member stories.
    pub user_story_ids: Vec<UserStoryId>,
    /// Closure instant, if closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Whether the sprint review happened.
    pub has_review: bool,
    /// Whether the retrospective happened.
    pub has_retrospective: bool,
    /// Optional manual activity override.
    pub is_active: Option<bool>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Sprint {
    /// Creates a planned sprint from a validated draft.
    #[must_use]
    pub fn new(draft: SprintDraft, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: SprintId::new(),
            title: draft.title,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: SprintStatus::Planned,
            progress: 0,
            velocity: 0,
            user_story_ids: Vec::new(),
            closed_at: None,
            has_review: false,
            has_retrospective: false,
            is_active: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a sprint from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSprintData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            start_date: data.start_date,
            end_date: data.end_date,
            status: data.status,
            progress: data.progress,
            velocity: data.velocity,
            user_story_ids: data.user_story_ids,
            closed_at: data.closed_at,
            has_review: data.has_review,
            has_retrospective: data.has_retrospective,
            is_active: data.is_active,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the sprint identifier.
    #[must_use]
    pub const fn id(&self) -> &SprintId {
        &self.id
    }

    /// Returns the sprint title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the start of the time box.
    #[must_use]
    pub const fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    /// Returns the end of the time box.
    #[must_use]
    pub const fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> SprintStatus {
        self.status
    }

    /// Returns the completion percentage.
    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.progress
    }

    /// Returns the advisory velocity.
    #[must_use]
    pub const fn velocity(&self) -> u32 {
        self.velocity
    }

    /// Returns the push-reference story list.
    #[must_use]
    pub fn user_story_ids(&self) -> &[UserStoryId] {
        &self.user_story_ids
    }

    /// Returns the closure instant.
    #[must_use]
    pub const fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    /// Returns whether the review ceremony is recorded.
    #[must_use]
    pub const fn has_review(&self) -> bool {
        self.has_review
    }

    /// Returns whether the retrospective ceremony is recorded.
    #[must_use]
    pub const fn has_retrospective(&self) -> bool {
        self.has_retrospective
    }

    /// Returns the manual activity override.
    #[must_use]
    pub const fn is_active_override(&self) -> Option<bool> {
        self.is_active
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

    /// Returns `true` until the sprint is closed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Returns `true` when the sprint is running, either by status or by the
    /// manual override.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.is_open()
            && (self.status == SprintStatus::Active || self.is_active == Some(true))
    }

    /// Returns `true` when the time box elapsed strictly before `now`.
    #[must_use]
    pub fn has_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date < now
    }

    /// Returns `true` when the push-reference list is authoritative.
    #[must_use]
    pub const fn uses_push_list(&self) -> bool {
        !self.user_story_ids.is_empty()
    }

    /// Moves a planned sprint to [`SprintStatus::Active`].
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::InvalidStateTransition`] unless the sprint
    /// is planned.
    pub fn activate(&mut self, clock: &impl Clock) -> Result<(), SprintDomainError> {
        self.transition_to(SprintStatus::Active)?;
        self.touch(clock);
        Ok(())
    }

    /// Closes the sprint.
    ///
    /// Sets the status to done, stamps `closed_at`, forces progress to 100 and
    /// marks both review and retrospective as held.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::InvalidStateTransition`] when the sprint is
    /// already done.
    pub fn close(&mut self, clock: &impl Clock) -> Result<(), SprintDomainError> {
        self.transition_to(SprintStatus::Done)?;
        let timestamp = clock.utc();
        self.closed_at = Some(timestamp);
        self.progress = CLOSED_SPRINT_PROGRESS;
        self.has_review = true;
        self.has_retrospective = true;
        self.updated_at = timestamp;
        Ok(())
    }

    /// Sets or clears the manual activity override.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::SprintClosed`] for a done sprint.
    pub fn set_active_override(
        &mut self,
        is_active: Option<bool>,
        clock: &impl Clock,
    ) -> Result<(), SprintDomainError> {
        self.ensure_open()?;
        self.is_active = is_active;
        self.touch(clock);
        Ok(())
    }

    /// Replaces the push-reference story list.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::SprintClosed`] for a done sprint.
    pub fn replace_user_story_ids(
        &mut self,
        user_story_ids: Vec<UserStoryId>,
        clock: &impl Clock,
    ) -> Result<(), SprintDomainError> {
        self.ensure_open()?;
        self.user_story_ids = user_story_ids;
        self.touch(clock);
        Ok(())
    }

    /// Appends a story to the push-reference list unless already present.
    ///
    /// Returns `true` when the list changed.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::SprintClosed`] for a done sprint.
    pub fn add_user_story(
        &mut self,
        story_id: &UserStoryId,
        clock: &impl Clock,
    ) -> Result<bool, SprintDomainError> {
        self.ensure_open()?;
        if self.user_story_ids.contains(story_id) {
            return Ok(false);
        }
        self.user_story_ids.push(story_id.clone());
        self.touch(clock);
        Ok(true)
    }

    /// Removes a story from the push-reference list.
    ///
    /// Returns `true` when the list changed.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::SprintClosed`] for a done sprint.
    pub fn remove_user_story(
        &mut self,
        story_id: &UserStoryId,
        clock: &impl Clock,
    ) -> Result<bool, SprintDomainError> {
        self.ensure_open()?;
        let before = self.user_story_ids.len();
        self.user_story_ids.retain(|id| id != story_id);
        let changed = self.user_story_ids.len() != before;
        if changed {
            self.touch(clock);
        }
        Ok(changed)
    }

    /// Records the advisory velocity.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::SprintClosed`] for a done sprint.
    pub fn set_velocity(&mut self, velocity: u32, clock: &impl Clock) -> Result<(), SprintDomainError> {
        self.ensure_open()?;
        if self.velocity != velocity {
            self.velocity = velocity;
            self.touch(clock);
        }
        Ok(())
    }

    /// Rejects content mutation once the sprint is closed.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::SprintClosed`] for a done sprint.
    pub fn ensure_open(&self) -> Result<(), SprintDomainError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(SprintDomainError::SprintClosed(self.id.clone()))
        }
    }

    fn transition_to(&mut self, target: SprintStatus) -> Result<(), SprintDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(SprintDomainError::InvalidStateTransition {
                sprint_id: self.id.clone(),
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
