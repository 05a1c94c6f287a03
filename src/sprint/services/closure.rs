//! Persistence of closure plans shared by the closure and expiry services.

use super::SprintServiceResult;
use crate::sprint::{
    domain::{ClosurePlan, ClosureSummary},
    ports::{ChangeSet, WorkItemRepository},
};

/// Writes one sprint's closure as a single change set and reports it.
pub(super) async fn commit_plan<R>(repository: &R, plan: &ClosurePlan) -> SprintServiceResult<()>
where
    R: WorkItemRepository + ?Sized,
{
    let changes = ChangeSet::from_closure(plan);
    repository.commit(&changes).await?;
    report(plan.summary(), changes.len());
    Ok(())
}

fn report(summary: &ClosureSummary, records_written: usize) {
    tracing::info!(
        sprint_id = %summary.sprint_id,
        sprint_title = %summary.sprint_title,
        stories_completed = summary.stories_completed,
        stories_moved = summary.stories_moved,
        tasks_completed = summary.tasks_completed,
        tasks_moved = summary.tasks_moved,
        records_written,
        "sprint closed"
    );
    if summary.stories_deferred > 0 || summary.tasks_deferred > 0 {
        tracing::warn!(
            sprint_id = %summary.sprint_id,
            stories_deferred = summary.stories_deferred,
            tasks_deferred = summary.tasks_deferred,
            "next-sprint hand-over is not automated; unfinished work left in place"
        );
    }
}
