//! Then steps for sprint closure BDD scenarios.

use super::world::{SprintClosureWorld, run_async};
use rstest_bdd_macros::then;
use sprintwise::sprint::{
    domain::{Badge, Sprint, SprintDomainError, SprintId, SprintStatus, UserStoryId},
    ports::WorkItemRepository,
    services::SprintServiceError,
};

fn stored_sprint(world: &SprintClosureWorld, title: String) -> Result<Sprint, eyre::Report> {
    run_async(world.repository.find_sprint(&SprintId::from_key(title)))?
        .ok_or_else(|| eyre::eyre!("sprint missing from repository"))
}

#[then(r#"sprint "{title}" is done"#)]
fn sprint_is_done(world: &SprintClosureWorld, title: String) -> Result<(), eyre::Report> {
    let sprint = stored_sprint(world, title)?;
    if sprint.status() != SprintStatus::Done || sprint.closed_at().is_none() {
        return Err(eyre::eyre!(
            "expected a closed sprint, found {} (closed at {:?})",
            sprint.status(),
            sprint.closed_at()
        ));
    }
    Ok(())
}

#[then(r#"sprint "{title}" is "{status}""#)]
fn sprint_has_status(
    world: &SprintClosureWorld,
    title: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = SprintStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let sprint = stored_sprint(world, title)?;
    if sprint.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            sprint.status()
        ));
    }
    Ok(())
}

#[then(r#"story "{code}" is back in the backlog"#)]
fn story_is_in_backlog(world: &SprintClosureWorld, code: String) -> Result<(), eyre::Report> {
    let story = run_async(world.repository.find_user_story(&UserStoryId::from_key(code)))?
        .ok_or_else(|| eyre::eyre!("story missing from repository"))?;
    if story.sprint_id().is_some() || story.badge() == Some(Badge::Sprint) {
        return Err(eyre::eyre!(
            "story still attached to sprint {:?} with badge {:?}",
            story.sprint_id(),
            story.badge()
        ));
    }
    Ok(())
}

#[then(
    "the last migration reports {count:u64} sprints with {moved:u64} moved and {completed:u64} completed stories"
)]
fn last_migration_reports(
    world: &SprintClosureWorld,
    count: u64,
    moved: u64,
    completed: u64,
) -> Result<(), eyre::Report> {
    let summaries = match world.last_migration.as_ref() {
        Some(Ok(summaries)) => summaries,
        Some(Err(err)) => return Err(eyre::eyre!("migration failed: {err}")),
        None => return Err(eyre::eyre!("no migration has run")),
    };
    let total_moved: usize = summaries.iter().map(|summary| summary.stories_moved).sum();
    let total_completed: usize = summaries
        .iter()
        .map(|summary| summary.stories_completed)
        .sum();
    let observed = (
        u64::try_from(summaries.len())?,
        u64::try_from(total_moved)?,
        u64::try_from(total_completed)?,
    );
    if observed != (count, moved, completed) {
        return Err(eyre::eyre!(
            "expected ({count}, {moved}, {completed}) sprints/moved/completed, found {observed:?}"
        ));
    }
    Ok(())
}

#[then("closing fails with a not found error")]
fn closing_fails_with_not_found(world: &SprintClosureWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_close
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing close result"))?;
    if !matches!(result, Err(SprintServiceError::SprintNotFound(_))) {
        return Err(eyre::eyre!("expected SprintNotFound error, got {result:?}"));
    }
    Ok(())
}

#[then("no sprint is stored")]
fn no_sprint_is_stored(world: &SprintClosureWorld) -> Result<(), eyre::Report> {
    let sprints = run_async(world.repository.list_sprints())?;
    if !sprints.is_empty() {
        return Err(eyre::eyre!("expected no sprints, found {}", sprints.len()));
    }
    Ok(())
}

#[then("closing fails with an invalid state transition error")]
fn closing_fails_with_invalid_transition(world: &SprintClosureWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_close
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing close result"))?;
    if !matches!(
        result,
        Err(SprintServiceError::Domain(
            SprintDomainError::InvalidStateTransition { .. }
        ))
    ) {
        return Err(eyre::eyre!(
            "expected InvalidStateTransition error, got {result:?}"
        ));
    }
    Ok(())
}
