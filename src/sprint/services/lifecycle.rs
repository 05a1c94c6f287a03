//! Service layer for sprint creation, activation, closure and read views.

use super::{SprintServiceConfig, SprintServiceError, SprintServiceResult, closure::commit_plan};
use crate::sprint::{
    domain::{
        BacklogTask, ClosureOptions, ClosureSummary, Sprint, SprintDraft, SprintId, SprintMembership,
        SprintPhase, TimelineEntry, UserStory, build_timeline, compute_sprint_status,
        plan_closure,
    },
    ports::WorkItemRepository,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for creating a sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSprintRequest {
    /// Sprint title.
    pub title: String,
    /// Start of the time box.
    pub start_date: DateTime<Utc>,
    /// End of the time box.
    pub end_date: DateTime<Utc>,
}

impl CreateSprintRequest {
    /// Creates a sprint request.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            start_date,
            end_date,
        }
    }
}

/// Request payload for closing a sprint.
///
/// Candidate stories and tasks are optional; when absent and a disposition
/// step needs them, the full collections are loaded. Candidates are always
/// filtered through membership resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseSprintRequest {
    sprint_id: SprintId,
    options: ClosureOptions,
    user_stories: Option<Vec<UserStory>>,
    tasks: Option<Vec<BacklogTask>>,
}

impl CloseSprintRequest {
    /// Creates a request that only closes the sprint record.
    #[must_use]
    pub const fn new(sprint_id: SprintId) -> Self {
        Self {
            sprint_id,
            options: ClosureOptions::sprint_only(),
            user_stories: None,
            tasks: None,
        }
    }

    /// Sets the disposition options.
    #[must_use]
    pub const fn with_options(mut self, options: ClosureOptions) -> Self {
        self.options = options;
        self
    }

    /// Supplies candidate stories instead of loading them.
    #[must_use]
    pub fn with_user_stories(mut self, stories: Vec<UserStory>) -> Self {
        self.user_stories = Some(stories);
        self
    }

    /// Supplies candidate tasks instead of loading them.
    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<BacklogTask>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    /// Returns the sprint to close.
    #[must_use]
    pub const fn sprint_id(&self) -> &SprintId {
        &self.sprint_id
    }
}

/// Resolved contents and projected phase of one sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintOverview {
    /// The sprint record.
    pub sprint: Sprint,
    /// Resolved member stories.
    pub user_stories: Vec<UserStory>,
    /// Tasks implementing the member stories.
    pub tasks: Vec<BacklogTask>,
    /// Phase projected from the member tasks.
    pub phase: SprintPhase,
}

/// Sprint lifecycle orchestration service.
#[derive(Clone)]
pub struct SprintLifecycleService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    config: SprintServiceConfig,
}

impl<R, C> SprintLifecycleService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    /// Creates a lifecycle service with the default configuration.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self::with_config(repository, clock, SprintServiceConfig::default())
    }

    /// Creates a lifecycle service with explicit configuration.
    #[must_use]
    pub const fn with_config(
        repository: Arc<R>,
        clock: Arc<C>,
        config: SprintServiceConfig,
    ) -> Self {
        Self {
            repository,
            clock,
            config,
        }
    }

    /// Creates a planned sprint.
    ///
    /// # Errors
    ///
    /// Returns [`SprintServiceError::Domain`] when the title or time box is
    /// invalid, or [`SprintServiceError::Repository`] when persistence fails.
    pub async fn create_sprint(&self, request: CreateSprintRequest) -> SprintServiceResult<Sprint> {
        let draft = SprintDraft::new(
            request.title,
            request.start_date,
            request.end_date,
            self.config.min_title_length,
        )?;
        let sprint = Sprint::new(draft, &*self.clock);
        self.repository.store_sprint(&sprint).await?;
        tracing::info!(sprint_id = %sprint.id(), title = sprint.title(), "sprint created");
        Ok(sprint)
    }

    /// Moves a planned sprint to active.
    ///
    /// # Errors
    ///
    /// Returns [`SprintServiceError::SprintNotFound`] for an unknown sprint,
    /// [`SprintServiceError::Domain`] unless the sprint is planned, or
    /// [`SprintServiceError::Repository`] when persistence fails.
    pub async fn activate_sprint(&self, sprint_id: &SprintId) -> SprintServiceResult<Sprint> {
        let mut sprint = self.find_sprint_or_error(sprint_id).await?;
        sprint.activate(&*self.clock)?;
        self.repository.update_sprint(&sprint).await?;
        tracing::info!(sprint_id = %sprint.id(), "sprint activated");
        Ok(sprint)
    }

    /// Sets or clears the manual activity override of an open sprint.
    ///
    /// A planned sprint with the override set counts as running on the
    /// timeline without changing its status.
    ///
    /// # Errors
    ///
    /// Returns [`SprintServiceError::SprintNotFound`] for an unknown sprint,
    /// [`SprintServiceError::Domain`] when the sprint is closed, or
    /// [`SprintServiceError::Repository`] when persistence fails.
    pub async fn set_sprint_activity(
        &self,
        sprint_id: &SprintId,
        is_active: Option<bool>,
    ) -> SprintServiceResult<Sprint> {
        let mut sprint = self.find_sprint_or_error(sprint_id).await?;
        sprint.set_active_override(is_active, &*self.clock)?;
        self.repository.update_sprint(&sprint).await?;
        tracing::info!(
            sprint_id = %sprint.id(),
            running = sprint.is_running(),
            "sprint activity override updated"
        );
        Ok(sprint)
    }

    /// Closes a sprint, disposing of its unfinished work.
    ///
    /// The sprint record, the released stories and the unbadged tasks are
    /// written as one change set.
    ///
    /// # Errors
    ///
    /// Returns [`SprintServiceError::SprintNotFound`] before any write when
    /// the sprint does not exist, [`SprintServiceError::Domain`] when it is
    /// already closed, or [`SprintServiceError::Repository`] when persistence
    /// fails.
    #[tracing::instrument(name = "sprint.close", skip(self, request), fields(sprint_id = %request.sprint_id()))]
    pub async fn close_sprint(
        &self,
        request: CloseSprintRequest,
    ) -> SprintServiceResult<ClosureSummary> {
        let CloseSprintRequest {
            sprint_id,
            options,
            user_stories: supplied_stories,
            tasks: supplied_tasks,
        } = request;
        let sprint = self.find_sprint_or_error(&sprint_id).await?;

        let stories = match supplied_stories {
            Some(supplied) => supplied,
            None if options.needs_user_stories() => self.repository.list_user_stories().await?,
            None => Vec::new(),
        };
        let tasks = match supplied_tasks {
            Some(supplied) => supplied,
            None if options.needs_tasks() => self.repository.list_backlog_tasks().await?,
            None => Vec::new(),
        };

        let plan = plan_closure(&sprint, &stories, &tasks, options, &*self.clock)?;
        commit_plan(&*self.repository, &plan).await?;
        let (_, _, _, summary) = plan.into_parts();
        Ok(summary)
    }

    /// Returns a sprint with its resolved stories, tasks and phase.
    ///
    /// # Errors
    ///
    /// Returns [`SprintServiceError::SprintNotFound`] for an unknown sprint or
    /// [`SprintServiceError::Repository`] when loading fails.
    pub async fn sprint_overview(&self, sprint_id: &SprintId) -> SprintServiceResult<SprintOverview> {
        let sprint = self.find_sprint_or_error(sprint_id).await?;
        let stories = self.repository.list_user_stories().await?;
        let tasks = self.repository.list_backlog_tasks().await?;

        let membership = SprintMembership::resolve(&sprint, &stories, &tasks);
        let phase = compute_sprint_status(membership.tasks().iter().copied());
        let user_stories = membership.stories().iter().map(|story| (*story).clone()).collect();
        let member_tasks = membership.tasks().iter().map(|task| (*task).clone()).collect();

        Ok(SprintOverview {
            sprint,
            user_stories,
            tasks: member_tasks,
            phase,
        })
    }

    /// Builds the cross-sprint story timeline.
    ///
    /// # Errors
    ///
    /// Returns [`SprintServiceError::Repository`] when loading fails.
    pub async fn timeline(&self) -> SprintServiceResult<Vec<TimelineEntry>> {
        let sprints = self.repository.list_sprints().await?;
        let stories = self.repository.list_user_stories().await?;
        let tasks = self.repository.list_backlog_tasks().await?;
        Ok(build_timeline(&sprints, &stories, &tasks))
    }

    async fn find_sprint_or_error(&self, sprint_id: &SprintId) -> SprintServiceResult<Sprint> {
        self.repository
            .find_sprint(sprint_id)
            .await?
            .ok_or_else(|| SprintServiceError::SprintNotFound(sprint_id.clone()))
    }
}
