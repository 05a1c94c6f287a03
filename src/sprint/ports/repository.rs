//! Repository port over the sprint, story and task document collections.

use crate::sprint::domain::{
    BacklogTask, BacklogTaskId, ClosurePlan, Sprint, SprintId, UserStory, UserStoryId,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for work-item repository operations.
pub type WorkItemRepositoryResult<T> = Result<T, WorkItemRepositoryError>;

/// Document-store contract consumed by the sprint services.
#[async_trait]
pub trait WorkItemRepository: Send + Sync {
    /// Returns every sprint.
    async fn list_sprints(&self) -> WorkItemRepositoryResult<Vec<Sprint>>;

    /// Finds a sprint by identifier.
    ///
    /// Returns `None` when the sprint does not exist.
    async fn find_sprint(&self, id: &SprintId) -> WorkItemRepositoryResult<Option<Sprint>>;

    /// Stores a new sprint.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemRepositoryError::Duplicate`] when the id is taken.
    async fn store_sprint(&self, sprint: &Sprint) -> WorkItemRepositoryResult<()>;

    /// Replaces an existing sprint.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemRepositoryError::NotFound`] when the sprint does not
    /// exist.
    async fn update_sprint(&self, sprint: &Sprint) -> WorkItemRepositoryResult<()>;

    /// Returns every user story.
    async fn list_user_stories(&self) -> WorkItemRepositoryResult<Vec<UserStory>>;

    /// Finds a user story by identifier.
    async fn find_user_story(&self, id: &UserStoryId)
    -> WorkItemRepositoryResult<Option<UserStory>>;

    /// Stores a new user story.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemRepositoryError::Duplicate`] when the id is taken.
    async fn store_user_story(&self, story: &UserStory) -> WorkItemRepositoryResult<()>;

    /// Returns every backlog task.
    async fn list_backlog_tasks(&self) -> WorkItemRepositoryResult<Vec<BacklogTask>>;

    /// Stores a new backlog task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemRepositoryError::Duplicate`] when the id is taken.
    async fn store_backlog_task(&self, task: &BacklogTask) -> WorkItemRepositoryResult<()>;

    /// Replaces every record in `changes` atomically.
    ///
    /// Either all records are written or none are.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemRepositoryError::NotFound`] when any record does not
    /// exist, in which case nothing is written.
    async fn commit(&self, changes: &ChangeSet) -> WorkItemRepositoryResult<()>;
}

/// Collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkItemKind {
    /// The `sprints` collection.
    Sprint,
    /// The `user_stories` collection.
    UserStory,
    /// The `backlog_tasks` collection.
    BacklogTask,
}

impl WorkItemKind {
    /// Returns the collection name.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Sprint => "sprints",
            Self::UserStory => "user_stories",
            Self::BacklogTask => "backlog_tasks",
        }
    }
}

impl fmt::Display for WorkItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sprint => "sprint",
            Self::UserStory => "user story",
            Self::BacklogTask => "backlog task",
        })
    }
}

/// Set of existing records replaced together by [`WorkItemRepository::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    sprints: Vec<Sprint>,
    user_stories: Vec<UserStory>,
    backlog_tasks: Vec<BacklogTask>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the change set that persists a closure plan.
    #[must_use]
    pub fn from_closure(plan: &ClosurePlan) -> Self {
        Self {
            sprints: vec![plan.sprint().clone()],
            user_stories: plan.user_stories().to_vec(),
            backlog_tasks: plan.backlog_tasks().to_vec(),
        }
    }

    /// Adds a sprint replacement.
    pub fn push_sprint(&mut self, sprint: Sprint) {
        self.sprints.push(sprint);
    }

    /// Adds a story replacement.
    pub fn push_user_story(&mut self, story: UserStory) {
        self.user_stories.push(story);
    }

    /// Adds a task replacement.
    pub fn push_backlog_task(&mut self, task: BacklogTask) {
        self.backlog_tasks.push(task);
    }

    /// Returns the sprint replacements.
    #[must_use]
    pub fn sprints(&self) -> &[Sprint] {
        &self.sprints
    }

    /// Returns the story replacements.
    #[must_use]
    pub fn user_stories(&self) -> &[UserStory] {
        &self.user_stories
    }

    /// Returns the task replacements.
    #[must_use]
    pub fn backlog_tasks(&self) -> &[BacklogTask] {
        &self.backlog_tasks
    }

    /// Returns the number of records in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.sprints.len() + self.user_stories.len() + self.backlog_tasks.len()
    }

    /// Returns `true` when there is nothing to write.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Errors returned by work-item repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkItemRepositoryError {
    /// A record with the same identifier already exists.
    #[error("duplicate {kind} identifier: {id}")]
    Duplicate {
        /// Collection of the rejected record.
        kind: WorkItemKind,
        /// Rejected identifier.
        id: String,
    },

    /// The record was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Collection searched.
        kind: WorkItemKind,
        /// Missing identifier.
        id: String,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkItemRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Builds a not-found error for a sprint.
    #[must_use]
    pub fn sprint_not_found(id: &SprintId) -> Self {
        Self::NotFound {
            kind: WorkItemKind::Sprint,
            id: id.to_string(),
        }
    }

    /// Builds a not-found error for a user story.
    #[must_use]
    pub fn user_story_not_found(id: &UserStoryId) -> Self {
        Self::NotFound {
            kind: WorkItemKind::UserStory,
            id: id.to_string(),
        }
    }

    /// Builds a not-found error for a backlog task.
    #[must_use]
    pub fn backlog_task_not_found(id: &BacklogTaskId) -> Self {
        Self::NotFound {
            kind: WorkItemKind::BacklogTask,
            id: id.to_string(),
        }
    }
}
