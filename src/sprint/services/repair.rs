//! Reconciliation of sprint story lists against story back-references.

use super::SprintServiceResult;
use crate::sprint::{
    domain::{Sprint, UserStory, UserStoryId},
    ports::WorkItemRepository,
};
use futures::future::join_all;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Outcome of a repair sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Sprints whose story list was rewritten.
    pub synced: usize,
}

/// Consistency repair service.
///
/// A story's `sprint_id` is treated as the truth; each open sprint's
/// `user_story_ids` is rewritten when it names a different set of stories.
#[derive(Clone)]
pub struct ConsistencyRepairService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> ConsistencyRepairService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    /// Creates a repair service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Rewrites every diverging open sprint's story list.
    ///
    /// Order-only differences are left alone. Existing order is preserved
    /// and newly referenced stories are appended. A failure on one sprint is
    /// logged and the sweep continues.
    ///
    /// # Errors
    ///
    /// Returns [`super::SprintServiceError::Repository`] only when the
    /// initial load fails.
    #[tracing::instrument(name = "sprint.sync_user_stories", skip(self))]
    pub async fn sync_sprint_user_stories(&self) -> SprintServiceResult<SyncSummary> {
        let sprints = self.repository.list_sprints().await?;
        let stories = self.repository.list_user_stories().await?;

        let corrections: Vec<Sprint> = sprints
            .into_iter()
            .filter_map(|sprint| self.correct(sprint, &stories))
            .collect();

        let outcomes = join_all(corrections.iter().map(|sprint| async move {
            (sprint, self.repository.update_sprint(sprint).await)
        }))
        .await;

        let mut synced = 0;
        for (sprint, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    tracing::debug!(
                        sprint_id = %sprint.id(),
                        stories = sprint.user_story_ids().len(),
                        "sprint story list repaired"
                    );
                    synced += 1;
                }
                Err(err) => tracing::warn!(
                    sprint_id = %sprint.id(),
                    error = %err,
                    "failed to repair sprint story list"
                ),
            }
        }

        tracing::info!(synced, attempted = corrections.len(), "story list repair finished");
        Ok(SyncSummary { synced })
    }

    fn correct(&self, mut sprint: Sprint, stories: &[UserStory]) -> Option<Sprint> {
        if !sprint.is_open() {
            tracing::debug!(sprint_id = %sprint.id(), "skipping closed sprint");
            return None;
        }

        let referencing: Vec<&UserStoryId> = stories
            .iter()
            .filter(|story| story.belongs_to(sprint.id()))
            .map(UserStory::id)
            .collect();
        let expected: BTreeSet<&UserStoryId> = referencing.iter().copied().collect();
        let stored: BTreeSet<&UserStoryId> = sprint.user_story_ids().iter().collect();
        if expected == stored {
            return None;
        }

        let mut repaired: Vec<UserStoryId> = sprint
            .user_story_ids()
            .iter()
            .filter(|id| expected.contains(id))
            .cloned()
            .collect();
        for id in referencing {
            if !stored.contains(id) {
                repaired.push(id.clone());
            }
        }

        match sprint.replace_user_story_ids(repaired, &*self.clock) {
            Ok(()) => Some(sprint),
            Err(err) => {
                tracing::warn!(sprint_id = %sprint.id(), error = %err, "sprint rejected repair");
                None
            }
        }
    }
}
