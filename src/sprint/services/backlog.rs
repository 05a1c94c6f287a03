//! Service layer for stories, tasks and story-to-sprint assignment.

use super::{BadgeSyncService, SprintServiceConfig, SprintServiceError, SprintServiceResult};
use crate::sprint::{
    domain::{
        BacklogTask, Badge, DefinitionOfDone, Sprint, SprintId, StoryCode, UserStory, UserStoryId,
        user_stories_for_sprint,
    },
    ports::{ChangeSet, WorkItemRepository},
};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for creating a user story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserStoryRequest {
    title: String,
    story_points: Option<u32>,
    definition_of_done: DefinitionOfDone,
}

impl CreateUserStoryRequest {
    /// Creates a request with a title only.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            story_points: None,
            definition_of_done: DefinitionOfDone::new(),
        }
    }

    /// Sets the story point estimate.
    #[must_use]
    pub const fn with_story_points(mut self, story_points: u32) -> Self {
        self.story_points = Some(story_points);
        self
    }

    /// Adds an open Definition-of-Done criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.definition_of_done = self.definition_of_done.with(criterion, false);
        self
    }
}

/// Backlog management service.
#[derive(Clone)]
pub struct BacklogService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    badges: BadgeSyncService<R, C>,
    config: SprintServiceConfig,
}

impl<R, C> BacklogService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    /// Creates a backlog service with the default configuration.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self::with_config(repository, clock, SprintServiceConfig::default())
    }

    /// Creates a backlog service with explicit configuration.
    #[must_use]
    pub fn with_config(repository: Arc<R>, clock: Arc<C>, config: SprintServiceConfig) -> Self {
        let badges = BadgeSyncService::new(Arc::clone(&repository), Arc::clone(&clock));
        Self {
            repository,
            clock,
            badges,
            config,
        }
    }

    /// Creates an unscheduled story with the first free story code.
    ///
    /// Numbering fills gaps: with `US-001` and `US-003` taken the new story
    /// gets `US-002`.
    ///
    /// # Errors
    ///
    /// Returns [`SprintServiceError::Domain`] for a blank title or invalid
    /// code prefix, or [`SprintServiceError::Repository`] when persistence
    /// fails.
    pub async fn create_user_story(
        &self,
        request: CreateUserStoryRequest,
    ) -> SprintServiceResult<UserStory> {
        let existing = self.repository.list_user_stories().await?;
        let code = StoryCode::next_available(
            &self.config.story_code_prefix,
            self.config.story_code_width,
            existing.iter().map(UserStory::code),
        )?;

        let mut story = UserStory::new(code, request.title, &*self.clock)?;
        if request.story_points.is_some() {
            story.set_story_points(request.story_points, &*self.clock);
        }
        for (criterion, done) in request.definition_of_done.iter() {
            story.set_criterion(criterion, done, &*self.clock);
        }

        self.repository.store_user_story(&story).await?;
        tracing::info!(story_id = %story.id(), code = %story.code(), "user story created");
        Ok(story)
    }

    /// Creates a task implementing the given stories.
    ///
    /// # Errors
    ///
    /// Returns [`SprintServiceError::UserStoryNotFound`] when a referenced
    /// story does not exist, [`SprintServiceError::Domain`] for a blank
    /// title, or [`SprintServiceError::Repository`] when persistence fails.
    pub async fn create_backlog_task(
        &self,
        title: &str,
        user_story_ids: Vec<UserStoryId>,
    ) -> SprintServiceResult<BacklogTask> {
        for story_id in &user_story_ids {
            self.find_story_or_error(story_id).await?;
        }
        let task = BacklogTask::new(title, user_story_ids, &*self.clock)?;
        self.repository.store_backlog_task(&task).await?;
        tracing::info!(task_id = %task.id(), "backlog task created");
        Ok(task)
    }

    /// Moves a story into `target`, or back to the backlog when `None`.
    ///
    /// Updates the story's sprint reference and badge, both sprints' story
    /// lists and their velocity in one change set, then refreshes open-sprint
    /// badges. A `done` previous sprint keeps its record as it was closed.
    ///
    /// # Errors
    ///
    /// Returns [`SprintServiceError::UserStoryNotFound`] or
    /// [`SprintServiceError::SprintNotFound`] for unknown records,
    /// [`SprintServiceError::Domain`] when the target sprint is closed, or
    /// [`SprintServiceError::Repository`] when persistence fails.
    #[tracing::instrument(name = "backlog.assign_story", skip(self, story_id, target), fields(story_id = %story_id))]
    pub async fn assign_story_to_sprint(
        &self,
        story_id: &UserStoryId,
        target: Option<&SprintId>,
    ) -> SprintServiceResult<UserStory> {
        let mut story = self.find_story_or_error(story_id).await?;
        if story.sprint_id() == target {
            return Ok(story);
        }

        let mut previous = None;
        if let Some(id) = story.sprint_id() {
            match self.repository.find_sprint(id).await? {
                Some(sprint) if sprint.is_open() => previous = Some(sprint),
                Some(_) => tracing::debug!(sprint_id = %id, "leaving closed sprint record untouched"),
                None => {}
            }
        }
        let mut next = None;
        if let Some(id) = target {
            let sprint = self.find_sprint_or_error(id).await?;
            sprint.ensure_open()?;
            next = Some(sprint);
        }

        story.assign_to_sprint(target.cloned(), &*self.clock);
        story.set_badge(target.map(|_| Badge::Sprint), &*self.clock);
        if let Some(sprint) = previous.as_mut() {
            sprint.remove_user_story(story.id(), &*self.clock)?;
        }
        if let Some(sprint) = next.as_mut().filter(|sprint| sprint.uses_push_list()) {
            sprint.add_user_story(story.id(), &*self.clock)?;
        }

        let mut stories = self.repository.list_user_stories().await?;
        if let Some(slot) = stories.iter_mut().find(|candidate| candidate.id() == story.id()) {
            slot.clone_from(&story);
        }

        let mut changes = ChangeSet::new();
        changes.push_user_story(story.clone());
        for mut sprint in previous.into_iter().chain(next) {
            sprint.set_velocity(velocity(&sprint, &stories), &*self.clock)?;
            changes.push_sprint(sprint);
        }
        self.repository.commit(&changes).await?;

        tracing::info!(
            story_id = %story.id(),
            sprint_id = ?story.sprint_id().map(SprintId::as_str),
            "story assignment updated"
        );
        self.badges.sync_open_sprint_badges().await?;
        Ok(story)
    }

    async fn find_story_or_error(&self, story_id: &UserStoryId) -> SprintServiceResult<UserStory> {
        self.repository
            .find_user_story(story_id)
            .await?
            .ok_or_else(|| SprintServiceError::UserStoryNotFound(story_id.clone()))
    }

    async fn find_sprint_or_error(&self, sprint_id: &SprintId) -> SprintServiceResult<Sprint> {
        self.repository
            .find_sprint(sprint_id)
            .await?
            .ok_or_else(|| SprintServiceError::SprintNotFound(sprint_id.clone()))
    }
}

fn velocity(sprint: &Sprint, stories: &[UserStory]) -> u32 {
    user_stories_for_sprint(Some(sprint), stories)
        .iter()
        .filter_map(|story| story.story_points())
        .sum()
}
