//! Planning of sprint closure and disposition of unfinished work.
//!
//! Planning is pure: it computes the closed sprint and every story and task
//! that changes, leaving persistence to the caller so the whole disposition of
//! one sprint can be written atomically.

use super::{BacklogTask, Sprint, SprintDomainError, SprintId, SprintMembership, UserStory};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// How unfinished work is handled when its sprint closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionStrategy {
    /// Release unfinished items to the unscheduled backlog.
    Backlog,
    /// Carry unfinished items into the next sprint. Recorded as deferred;
    /// records are left untouched.
    NextSprint,
}

/// Disposition choices for one closure.
///
/// `None` skips the corresponding disposition step entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureOptions {
    /// Strategy for stories that do not meet their Definition of Done.
    pub user_stories: Option<DispositionStrategy>,
    /// Strategy for the sprint's tasks.
    pub tasks: Option<DispositionStrategy>,
}

impl ClosureOptions {
    /// Sends both unfinished stories and tasks back to the backlog.
    #[must_use]
    pub const fn backlog() -> Self {
        Self {
            user_stories: Some(DispositionStrategy::Backlog),
            tasks: Some(DispositionStrategy::Backlog),
        }
    }

    /// Closes the sprint without touching its children.
    #[must_use]
    pub const fn sprint_only() -> Self {
        Self {
            user_stories: None,
            tasks: None,
        }
    }

    /// Returns `true` when any disposition step needs the story snapshot.
    #[must_use]
    pub const fn needs_user_stories(&self) -> bool {
        self.user_stories.is_some() || self.tasks.is_some()
    }

    /// Returns `true` when the task disposition step runs.
    #[must_use]
    pub const fn needs_tasks(&self) -> bool {
        self.tasks.is_some()
    }
}

/// Counts reported for one closed sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureSummary {
    /// Closed sprint.
    pub sprint_id: SprintId,
    /// Title of the closed sprint.
    pub sprint_title: String,
    /// Member stories meeting their Definition of Done.
    pub stories_completed: usize,
    /// Unfinished stories returned to the backlog.
    pub stories_moved: usize,
    /// Unfinished stories left in place for a next-sprint hand-over.
    pub stories_deferred: usize,
    /// Member tasks that are done.
    pub tasks_completed: usize,
    /// Unfinished tasks released from the sprint board.
    pub tasks_moved: usize,
    /// Unfinished tasks left in place for a next-sprint hand-over.
    pub tasks_deferred: usize,
}

impl ClosureSummary {
    fn empty(sprint: &Sprint) -> Self {
        Self {
            sprint_id: sprint.id().clone(),
            sprint_title: sprint.title().to_owned(),
            stories_completed: 0,
            stories_moved: 0,
            stories_deferred: 0,
            tasks_completed: 0,
            tasks_moved: 0,
            tasks_deferred: 0,
        }
    }

    /// Returns the number of tasks the task disposition step looked at.
    #[must_use]
    pub const fn tasks_affected(&self) -> usize {
        self.tasks_completed + self.tasks_moved + self.tasks_deferred
    }
}

/// Records to write for one sprint closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosurePlan {
    sprint: Sprint,
    user_stories: Vec<UserStory>,
    backlog_tasks: Vec<BacklogTask>,
    summary: ClosureSummary,
}

impl ClosurePlan {
    /// Returns the closed sprint record.
    #[must_use]
    pub const fn sprint(&self) -> &Sprint {
        &self.sprint
    }

    /// Returns the stories that changed.
    #[must_use]
    pub fn user_stories(&self) -> &[UserStory] {
        &self.user_stories
    }

    /// Returns the tasks that changed.
    #[must_use]
    pub fn backlog_tasks(&self) -> &[BacklogTask] {
        &self.backlog_tasks
    }

    /// Returns the closure counts.
    #[must_use]
    pub const fn summary(&self) -> &ClosureSummary {
        &self.summary
    }

    /// Splits the plan into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Sprint, Vec<UserStory>, Vec<BacklogTask>, ClosureSummary) {
        (self.sprint, self.user_stories, self.backlog_tasks, self.summary)
    }
}

/// Plans the closure of `sprint` against a snapshot of stories and tasks.
///
/// Membership is resolved before any disposition, so tasks follow the
/// sprint's story set as it stood when closure began. Under
/// [`DispositionStrategy::Backlog`] every member task loses its badge,
/// finished or not.
///
/// # Errors
///
/// Returns [`SprintDomainError::InvalidStateTransition`] when the sprint is
/// already closed.
pub fn plan_closure(
    sprint: &Sprint,
    stories: &[UserStory],
    tasks: &[BacklogTask],
    options: ClosureOptions,
    clock: &impl Clock,
) -> Result<ClosurePlan, SprintDomainError> {
    let mut closed = sprint.clone();
    closed.close(clock)?;

    let membership = SprintMembership::resolve(sprint, stories, tasks);
    let mut summary = ClosureSummary::empty(sprint);
    let mut changed_stories = Vec::new();
    let mut changed_tasks = Vec::new();

    if let Some(strategy) = options.user_stories {
        for story in membership.stories() {
            if story.is_dod_complete() {
                summary.stories_completed += 1;
                continue;
            }
            match strategy {
                DispositionStrategy::Backlog => {
                    summary.stories_moved += 1;
                    let mut released = (*story).clone();
                    if released.return_to_backlog(clock) {
                        changed_stories.push(released);
                    }
                }
                DispositionStrategy::NextSprint => summary.stories_deferred += 1,
            }
        }
    }

    if let Some(strategy) = options.tasks {
        for task in membership.tasks() {
            let complete = task.is_complete();
            if complete {
                summary.tasks_completed += 1;
            }
            match strategy {
                DispositionStrategy::Backlog => {
                    if !complete {
                        summary.tasks_moved += 1;
                    }
                    let mut unbadged = (*task).clone();
                    if unbadged.set_badge(None, clock) {
                        changed_tasks.push(unbadged);
                    }
                }
                DispositionStrategy::NextSprint if !complete => summary.tasks_deferred += 1,
                DispositionStrategy::NextSprint => {}
            }
        }
    }

    Ok(ClosurePlan {
        sprint: closed,
        user_stories: changed_stories,
        backlog_tasks: changed_tasks,
        summary,
    })
}

/// Applies a committed plan to an in-memory snapshot so later sprints in the
/// same sweep observe earlier dispositions.
pub fn apply_to_snapshot(
    plan: &ClosurePlan,
    sprints: &mut [Sprint],
    stories: &mut [UserStory],
    tasks: &mut [BacklogTask],
) {
    replace_by_id(sprints, std::slice::from_ref(&plan.sprint), |s| s.id().clone());
    replace_by_id(stories, &plan.user_stories, |s| s.id().clone());
    replace_by_id(tasks, &plan.backlog_tasks, |t| t.id().clone());
}

fn replace_by_id<T: Clone, K: PartialEq>(records: &mut [T], updates: &[T], key: impl Fn(&T) -> K) {
    for update in updates {
        let update_key = key(update);
        if let Some(slot) = records.iter_mut().find(|record| key(record) == update_key) {
            slot.clone_from(update);
        }
    }
}
