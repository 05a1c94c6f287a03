//! Sweep that closes sprints whose time box has elapsed.

use super::{SprintServiceConfig, SprintServiceResult, closure::commit_plan};
use crate::sprint::{
    domain::{ClosureOptions, ClosureSummary, SprintId, apply_to_snapshot, plan_closure},
    ports::WorkItemRepository,
};
use mockable::Clock;
use std::sync::Arc;

/// Which child collections an expiry sweep disposes of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationScope {
    /// Dispose of unfinished stories.
    pub include_user_stories: bool,
    /// Dispose of tasks.
    pub include_tasks: bool,
}

impl Default for MigrationScope {
    fn default() -> Self {
        Self::all()
    }
}

impl MigrationScope {
    /// Disposes of both stories and tasks.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            include_user_stories: true,
            include_tasks: true,
        }
    }

    /// Only closes the sprint records.
    #[must_use]
    pub const fn sprints_only() -> Self {
        Self {
            include_user_stories: false,
            include_tasks: false,
        }
    }
}

/// Expiry sweep service.
#[derive(Clone)]
pub struct ExpiryMigrationService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    config: SprintServiceConfig,
}

impl<R, C> ExpiryMigrationService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    /// Creates an expiry sweep service with the default configuration.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self::with_config(repository, clock, SprintServiceConfig::default())
    }

    /// Creates an expiry sweep service with explicit configuration.
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

    /// Closes every open sprint whose end date is strictly before now.
    ///
    /// Stories and tasks are loaded once and shared by the whole sweep. Each
    /// sprint is committed as its own change set and the shared snapshot is
    /// updated afterwards, so later sprints see earlier dispositions. An
    /// empty result means nothing was written.
    ///
    /// # Errors
    ///
    /// Returns [`super::SprintServiceError::Repository`] when loading or a
    /// commit fails. Sprints committed before the failure stay closed.
    #[tracing::instrument(name = "sprint.migrate_expired", skip(self))]
    pub async fn migrate_expired_sprints(
        &self,
        scope: MigrationScope,
    ) -> SprintServiceResult<Vec<ClosureSummary>> {
        let options = self.closure_options(scope);
        let mut sprints = self.repository.list_sprints().await?;
        let mut stories = if options.needs_user_stories() {
            self.repository.list_user_stories().await?
        } else {
            Vec::new()
        };
        let mut tasks = if options.needs_tasks() {
            self.repository.list_backlog_tasks().await?
        } else {
            Vec::new()
        };

        let now = self.clock.utc();
        let expired: Vec<SprintId> = sprints
            .iter()
            .filter(|sprint| sprint.is_open() && sprint.has_expired_at(now))
            .map(|sprint| sprint.id().clone())
            .collect();

        let mut summaries = Vec::with_capacity(expired.len());
        for sprint_id in &expired {
            let Some(sprint) = sprints.iter().find(|sprint| sprint.id() == sprint_id) else {
                continue;
            };
            let plan = plan_closure(sprint, &stories, &tasks, options, &*self.clock)?;
            commit_plan(&*self.repository, &plan).await?;
            apply_to_snapshot(&plan, &mut sprints, &mut stories, &mut tasks);
            summaries.push(plan.summary().clone());
        }

        tracing::info!(
            examined = sprints.len(),
            migrated = summaries.len(),
            %now,
            "expiry sweep finished"
        );
        Ok(summaries)
    }

    const fn closure_options(&self, scope: MigrationScope) -> ClosureOptions {
        let defaults = self.config.migration_options();
        ClosureOptions {
            user_stories: if scope.include_user_stories {
                defaults.user_stories
            } else {
                None
            },
            tasks: if scope.include_tasks {
                defaults.tasks
            } else {
                None
            },
        }
    }
}
