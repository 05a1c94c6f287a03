//! Keeps the denormalized sprint badge aligned with resolved membership.

use super::SprintServiceResult;
use crate::sprint::{
    domain::{
        Badge, BacklogTaskId, Sprint, SprintMembership, UserStory, UserStoryId,
        user_stories_for_sprint,
    },
    ports::{ChangeSet, WorkItemRepository},
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Outcome of a badge refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeSyncSummary {
    /// Tasks that gained the sprint badge.
    pub badged: usize,
    /// Tasks that lost the sprint badge.
    pub cleared: usize,
}

/// Outcome of a completed-sprint badge cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeCleanupSummary {
    /// Stories and tasks whose badge was removed.
    pub cleaned: usize,
}

/// Badge synchronisation service.
#[derive(Clone)]
pub struct BadgeSyncService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> BadgeSyncService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    /// Creates a badge synchronisation service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Badges every task referencing one of `story_ids` and unbadges every
    /// other badged task.
    ///
    /// Tasks already in the right state are not written. All changes are
    /// committed together; nothing is written when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns [`super::SprintServiceError::Repository`] when loading or the
    /// commit fails.
    #[tracing::instrument(name = "badges.update", skip(self, story_ids), fields(stories = story_ids.len()))]
    pub async fn update_badges_for_sprint_user_stories(
        &self,
        story_ids: &[UserStoryId],
    ) -> SprintServiceResult<BadgeSyncSummary> {
        let wanted: BTreeSet<&UserStoryId> = story_ids.iter().collect();
        let tasks = self.repository.list_backlog_tasks().await?;

        let mut summary = BadgeSyncSummary::default();
        let mut changes = ChangeSet::new();
        for mut task in tasks {
            let target = task.references_any(&wanted).then_some(Badge::Sprint);
            let had_badge = task.badge().is_some();
            if task.set_badge(target, &*self.clock) {
                if had_badge {
                    summary.cleared += 1;
                } else {
                    summary.badged += 1;
                }
                changes.push_backlog_task(task);
            } else {
                tracing::debug!(task_id = %task.id(), "badge already current");
            }
        }

        if !changes.is_empty() {
            self.repository.commit(&changes).await?;
        }
        tracing::info!(
            badged = summary.badged,
            cleared = summary.cleared,
            "task badges refreshed"
        );
        Ok(summary)
    }

    /// Refreshes task badges against the union of every open sprint's
    /// resolved stories.
    ///
    /// # Errors
    ///
    /// Returns [`super::SprintServiceError::Repository`] when loading or the
    /// commit fails.
    pub async fn sync_open_sprint_badges(&self) -> SprintServiceResult<BadgeSyncSummary> {
        let sprints = self.repository.list_sprints().await?;
        let stories = self.repository.list_user_stories().await?;
        let open_story_ids: Vec<UserStoryId> = open_sprint_story_ids(&sprints, &stories)
            .into_iter()
            .cloned()
            .collect();
        self.update_badges_for_sprint_user_stories(&open_story_ids)
            .await
    }

    /// Removes stale badges from the stories and tasks of done sprints.
    ///
    /// Items still belonging to an open sprint keep their badge.
    ///
    /// # Errors
    ///
    /// Returns [`super::SprintServiceError::Repository`] when loading or the
    /// commit fails.
    #[tracing::instrument(name = "badges.cleanup", skip(self))]
    pub async fn cleanup_completed_sprints_badges(&self) -> SprintServiceResult<BadgeCleanupSummary> {
        let sprints = self.repository.list_sprints().await?;
        let stories = self.repository.list_user_stories().await?;
        let tasks = self.repository.list_backlog_tasks().await?;
        let still_open = open_sprint_story_ids(&sprints, &stories);

        let mut stale_stories: BTreeSet<&UserStoryId> = BTreeSet::new();
        let mut stale_tasks: BTreeSet<&BacklogTaskId> = BTreeSet::new();
        for sprint in sprints.iter().filter(|sprint| !sprint.is_open()) {
            let membership = SprintMembership::resolve(sprint, &stories, &tasks);
            for story in membership.stories() {
                if story.badge().is_some() && !still_open.contains(story.id()) {
                    stale_stories.insert(story.id());
                }
            }
            for task in membership.tasks() {
                if task.badge().is_some() && !task.references_any(&still_open) {
                    stale_tasks.insert(task.id());
                }
            }
        }

        let mut changes = ChangeSet::new();
        for story in stories.iter().filter(|story| stale_stories.contains(story.id())) {
            let mut cleaned = story.clone();
            if cleaned.set_badge(None, &*self.clock) {
                changes.push_user_story(cleaned);
            }
        }
        for task in tasks.iter().filter(|task| stale_tasks.contains(task.id())) {
            let mut cleaned = task.clone();
            if cleaned.set_badge(None, &*self.clock) {
                changes.push_backlog_task(cleaned);
            }
        }

        let cleaned = changes.len();
        if !changes.is_empty() {
            self.repository.commit(&changes).await?;
        }
        tracing::info!(cleaned, "completed sprint badges cleaned");
        Ok(BadgeCleanupSummary { cleaned })
    }
}

fn open_sprint_story_ids<'a>(
    sprints: &[Sprint],
    stories: &'a [UserStory],
) -> BTreeSet<&'a UserStoryId> {
    sprints
        .iter()
        .filter(|sprint| sprint.is_open())
        .flat_map(|sprint| user_stories_for_sprint(Some(sprint), stories))
        .map(UserStory::id)
        .collect()
}
