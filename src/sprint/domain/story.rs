//! User story entity, story codes and Definition-of-Done tracking.

use super::{Badge, ParseStoryCodeError, SprintDomainError, SprintId, UserStoryId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Sequential, human-facing story code such as `US-003`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoryCode {
    prefix: String,
    number: u32,
    width: usize,
}

impl StoryCode {
    /// Creates a story code.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::InvalidStoryCodePrefix`] when the prefix
    /// is empty or contains `-` or whitespace.
    pub fn new(prefix: &str, number: u32, width: usize) -> Result<Self, SprintDomainError> {
        if !is_valid_prefix(prefix) {
            return Err(SprintDomainError::InvalidStoryCodePrefix(prefix.to_owned()));
        }
        Ok(Self {
            prefix: prefix.to_owned(),
            number,
            width,
        })
    }

    /// Returns the first unused code for `prefix`, filling gaps left by
    /// deleted stories before extending the sequence.
    ///
    /// Codes with another prefix are ignored. Numbering starts at 1.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::InvalidStoryCodePrefix`] for an invalid
    /// prefix.
    pub fn next_available<'a>(
        prefix: &str,
        width: usize,
        existing: impl IntoIterator<Item = &'a Self>,
    ) -> Result<Self, SprintDomainError> {
        let taken: BTreeSet<u32> = existing
            .into_iter()
            .filter(|code| code.prefix == prefix)
            .map(|code| code.number)
            .collect();
        let number = (1..=u32::MAX)
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or(u32::MAX);
        Self::new(prefix, number, width)
    }

    /// Returns the code prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the sequence number.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && !prefix.contains('-') && !prefix.chars().any(char::is_whitespace)
}

impl fmt::Display for StoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:0width$}", self.prefix, self.number, width = self.width)
    }
}

impl TryFrom<&str> for StoryCode {
    type Error = ParseStoryCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let invalid = || ParseStoryCodeError(value.to_owned());
        let (prefix, digits) = value.trim().rsplit_once('-').ok_or_else(invalid)?;
        if !is_valid_prefix(prefix) || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let number = digits.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self {
            prefix: prefix.to_owned(),
            number,
            width: digits.len(),
        })
    }
}

impl TryFrom<String> for StoryCode {
    type Error = ParseStoryCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<StoryCode> for String {
    fn from(code: StoryCode) -> Self {
        code.to_string()
    }
}

/// Named Definition-of-Done criteria and whether each is satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionOfDone(BTreeMap<String, bool>);

impl DefinitionOfDone {
    /// Creates an empty checklist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when every criterion is satisfied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0.values().all(|done| *done)
    }

    /// Sets a criterion, returning the checklist for chaining.
    #[must_use]
    pub fn with(mut self, criterion: impl Into<String>, done: bool) -> Self {
        self.0.insert(criterion.into(), done);
        self
    }

    /// Iterates criteria in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(name, done)| (name.as_str(), *done))
    }
}

/// User story entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStory {
    id: UserStoryId,
    code: StoryCode,
    title: String,
    #[serde(default)]
    story_points: Option<u32>,
    #[serde(default)]
    sprint_id: Option<SprintId>,
    #[serde(default)]
    dod_progress: Option<DefinitionOfDone>,
    #[serde(default)]
    badge: Option<Badge>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted user story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUserStoryData {
    /// Persisted story identifier.
    pub id: UserStoryId,
    /// Sequential story code.
    pub code: StoryCode,
    /// Story title.
    pub title: String,
    /// Estimated story points.
    pub story_points: Option<u32>,
    /// Pull-reference to the owning sprint.
    pub sprint_id: Option<SprintId>,
    /// Definition-of-Done checklist.
    pub dod_progress: Option<DefinitionOfDone>,
    /// Denormalized sprint marker.
    pub badge: Option<Badge>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl UserStory {
    /// Creates an unscheduled story.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::EmptyStoryTitle`] when the title is blank.
    pub fn new(
        code: StoryCode,
        title: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, SprintDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SprintDomainError::EmptyStoryTitle);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: UserStoryId::new(),
            code,
            title: trimmed.to_owned(),
            story_points: None,
            sprint_id: None,
            dod_progress: None,
            badge: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a story from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedUserStoryData) -> Self {
        Self {
            id: data.id,
            code: data.code,
            title: data.title,
            story_points: data.story_points,
            sprint_id: data.sprint_id,
            dod_progress: data.dod_progress,
            badge: data.badge,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the story identifier.
    #[must_use]
    pub const fn id(&self) -> &UserStoryId {
        &self.id
    }

    /// Returns the story code.
    #[must_use]
    pub const fn code(&self) -> &StoryCode {
        &self.code
    }

    /// Returns the story title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the story point estimate.
    #[must_use]
    pub const fn story_points(&self) -> Option<u32> {
        self.story_points
    }

    /// Returns the pull-reference sprint.
    #[must_use]
    pub const fn sprint_id(&self) -> Option<&SprintId> {
        self.sprint_id.as_ref()
    }

    /// Returns the Definition-of-Done checklist.
    #[must_use]
    pub const fn dod_progress(&self) -> Option<&DefinitionOfDone> {
        self.dod_progress.as_ref()
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

    /// Returns `true` when every Definition-of-Done criterion holds.
    ///
    /// A story without a checklist is never complete.
    #[must_use]
    pub fn is_dod_complete(&self) -> bool {
        self.dod_progress
            .as_ref()
            .is_some_and(DefinitionOfDone::is_complete)
    }

    /// Returns `true` when the pull reference points at `sprint_id`.
    #[must_use]
    pub fn belongs_to(&self, sprint_id: &SprintId) -> bool {
        self.sprint_id.as_ref() == Some(sprint_id)
    }

    /// Sets or clears the pull reference.
    pub fn assign_to_sprint(&mut self, sprint_id: Option<SprintId>, clock: &impl Clock) {
        self.sprint_id = sprint_id;
        self.touch(clock);
    }

    /// Returns the story to the unscheduled backlog, clearing its sprint and
    /// badge.
    ///
    /// Returns `true` when anything changed.
    pub fn return_to_backlog(&mut self, clock: &impl Clock) -> bool {
        if self.sprint_id.is_none() && self.badge.is_none() {
            return false;
        }
        self.sprint_id = None;
        self.badge = None;
        self.touch(clock);
        true
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

    /// Records a Definition-of-Done criterion.
    pub fn set_criterion(&mut self, criterion: impl Into<String>, done: bool, clock: &impl Clock) {
        let checklist = self.dod_progress.take().unwrap_or_default();
        self.dod_progress = Some(checklist.with(criterion, done));
        self.touch(clock);
    }

    /// Sets the story point estimate.
    pub fn set_story_points(&mut self, story_points: Option<u32>, clock: &impl Clock) {
        self.story_points = story_points;
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
