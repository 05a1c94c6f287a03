//! Shared test helpers for in-memory sprint service integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::fixture;
use sprintwise::sprint::{
    adapters::{FixedClock, memory::InMemoryWorkItemRepository},
    domain::{
        BacklogTask, BacklogTaskId, BacklogTaskStatus, Badge, DefinitionOfDone,
        PersistedBacklogTaskData, PersistedSprintData, PersistedUserStoryData, Sprint, SprintId,
        SprintStatus, StoryCode, UserStory, UserStoryId,
    },
    ports::WorkItemRepository,
    services::{
        BacklogService, BadgeSyncService, ConsistencyRepairService, ExpiryMigrationService,
        SprintLifecycleService,
    },
};
use std::sync::Arc;

/// Result type for helpers that seed the repository.
pub type SeedResult<T> = Result<T, eyre::Report>;

/// Returns midnight UTC `offset` days after 1 May 2026.
#[must_use]
pub fn day(offset: i64) -> DateTime<Utc> {
    let base = Utc
        .with_ymd_and_hms(2026, 5, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    base + Duration::days(offset)
}

/// Repository and clock shared by the services under test.
#[derive(Clone)]
pub struct Board {
    /// Store seen by every service.
    pub repository: Arc<InMemoryWorkItemRepository>,
    /// Clock pinned to "now" for the test.
    pub clock: Arc<FixedClock>,
}

/// Provides a board whose clock reads day 10.
#[fixture]
pub fn board() -> Board {
    Board::at(day(10))
}

impl Board {
    /// Creates an empty board with the clock pinned to `now`.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            repository: Arc::new(InMemoryWorkItemRepository::new()),
            clock: Arc::new(FixedClock::new(now)),
        }
    }

    /// Returns a board over the same store with the clock moved to `now`.
    #[must_use]
    pub fn with_clock(&self, now: DateTime<Utc>) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::new(FixedClock::new(now)),
        }
    }

    /// Builds the lifecycle service.
    #[must_use]
    pub fn lifecycle(&self) -> SprintLifecycleService<InMemoryWorkItemRepository, FixedClock> {
        SprintLifecycleService::new(Arc::clone(&self.repository), Arc::clone(&self.clock))
    }

    /// Builds the backlog service.
    #[must_use]
    pub fn backlog(&self) -> BacklogService<InMemoryWorkItemRepository, FixedClock> {
        BacklogService::new(Arc::clone(&self.repository), Arc::clone(&self.clock))
    }

    /// Builds the expiry sweep service.
    #[must_use]
    pub fn migration(&self) -> ExpiryMigrationService<InMemoryWorkItemRepository, FixedClock> {
        ExpiryMigrationService::new(Arc::clone(&self.repository), Arc::clone(&self.clock))
    }

    /// Builds the badge service.
    #[must_use]
    pub fn badges(&self) -> BadgeSyncService<InMemoryWorkItemRepository, FixedClock> {
        BadgeSyncService::new(Arc::clone(&self.repository), Arc::clone(&self.clock))
    }

    /// Builds the repair service.
    #[must_use]
    pub fn repair(&self) -> ConsistencyRepairService<InMemoryWorkItemRepository, FixedClock> {
        ConsistencyRepairService::new(Arc::clone(&self.repository), Arc::clone(&self.clock))
    }

    /// Stores a sprint running from day `start` to day `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the sprint.
    pub async fn sprint(
        &self,
        key: &str,
        status: SprintStatus,
        (start, end): (i64, i64),
        push_list: &[&str],
    ) -> SeedResult<Sprint> {
        let sprint = Sprint::from_persisted(PersistedSprintData {
            id: SprintId::from_key(key),
            title: format!("Sprint {key}"),
            start_date: day(start),
            end_date: day(end),
            status,
            progress: 0,
            velocity: 0,
            user_story_ids: push_list.iter().map(|id| UserStoryId::from_key(*id)).collect(),
            closed_at: None,
            has_review: false,
            has_retrospective: false,
            is_active: None,
            created_at: day(start),
            updated_at: day(start),
        });
        self.repository.store_sprint(&sprint).await?;
        Ok(sprint)
    }

    /// Stores a story; `done` of `None` leaves the checklist absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is invalid or the store rejects it.
    pub async fn story(
        &self,
        key: &str,
        code: &str,
        sprint: Option<&str>,
        done: Option<bool>,
    ) -> SeedResult<UserStory> {
        let story = UserStory::from_persisted(PersistedUserStoryData {
            id: UserStoryId::from_key(key),
            code: StoryCode::try_from(code)?,
            title: format!("Story {key}"),
            story_points: Some(3),
            sprint_id: sprint.map(SprintId::from_key),
            dod_progress: done.map(|complete| {
                DefinitionOfDone::new()
                    .with("accepted", complete)
                    .with("documented", true)
            }),
            badge: sprint.map(|_| Badge::Sprint),
            created_at: day(0),
            updated_at: day(0),
        });
        self.repository.store_user_story(&story).await?;
        Ok(story)
    }

    /// Stores a task implementing `stories`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the task.
    pub async fn task(
        &self,
        key: &str,
        status: BacklogTaskStatus,
        stories: &[&str],
        badged: bool,
    ) -> SeedResult<BacklogTask> {
        let task = BacklogTask::from_persisted(PersistedBacklogTaskData {
            id: BacklogTaskId::from_key(key),
            title: format!("Task {key}"),
            status,
            user_story_ids: stories.iter().map(|id| UserStoryId::from_key(*id)).collect(),
            badge: badged.then_some(Badge::Sprint),
            created_at: day(0),
            updated_at: day(0),
        });
        self.repository.store_backlog_task(&task).await?;
        Ok(task)
    }

    /// Loads a sprint that must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or the sprint is missing.
    pub async fn stored_sprint(&self, key: &str) -> SeedResult<Sprint> {
        self.repository
            .find_sprint(&SprintId::from_key(key))
            .await?
            .ok_or_else(|| eyre::eyre!("sprint {key} missing"))
    }

    /// Loads a story that must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or the story is missing.
    pub async fn stored_story(&self, key: &str) -> SeedResult<UserStory> {
        self.repository
            .find_user_story(&UserStoryId::from_key(key))
            .await?
            .ok_or_else(|| eyre::eyre!("story {key} missing"))
    }

    /// Loads a task that must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails or the task is missing.
    pub async fn stored_task(&self, key: &str) -> SeedResult<BacklogTask> {
        self.repository
            .list_backlog_tasks()
            .await?
            .into_iter()
            .find(|task| task.id().as_str() == key)
            .ok_or_else(|| eyre::eyre!("task {key} missing"))
    }
}
