//! In-memory integration tests for sprint closure.

use super::helpers::{Board, board, day};
use rstest::rstest;
use sprintwise::sprint::{
    domain::{
        BacklogTaskStatus, ClosureOptions, SprintDomainError, SprintId, SprintPhase, SprintStatus,
        TimelinePhase,
    },
    services::{CloseSprintRequest, CreateSprintRequest, SprintServiceError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closing_releases_unfinished_stories_and_clears_task_badges(
    board: Board,
) -> eyre::Result<()> {
    board
        .sprint("s1", SprintStatus::Active, (0, 14), &["done", "open"])
        .await?;
    board.story("done", "US-001", Some("s1"), Some(true)).await?;
    board.story("open", "US-002", Some("s1"), Some(false)).await?;
    board
        .task("t1", BacklogTaskStatus::Done, &["done"], true)
        .await?;
    board
        .task("t2", BacklogTaskStatus::InTesting, &["open"], true)
        .await?;

    let summary = board
        .lifecycle()
        .close_sprint(
            CloseSprintRequest::new(SprintId::from_key("s1"))
                .with_options(ClosureOptions::backlog()),
        )
        .await?;

    assert!(summary.stories_completed == 1 && summary.stories_moved == 1);
    assert!(summary.tasks_completed == 1 && summary.tasks_moved == 1);

    let sprint = board.stored_sprint("s1").await?;
    assert_eq!(sprint.status(), SprintStatus::Done);
    assert_eq!(sprint.closed_at(), Some(day(10)));
    assert_eq!(sprint.progress(), 100);

    let released = board.stored_story("open").await?;
    assert!(released.sprint_id().is_none() && released.badge().is_none());
    let kept = board.stored_story("done").await?;
    assert!(kept.sprint_id().is_some(), "completed story stays attached");

    for key in ["t1", "t2"] {
        let task = board.stored_task(key).await?;
        assert!(task.badge().is_none(), "task {key} still badged");
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closing_twice_is_rejected_and_changes_nothing(board: Board) -> eyre::Result<()> {
    board
        .sprint("s1", SprintStatus::Planned, (0, 14), &[])
        .await?;
    let lifecycle = board.lifecycle();
    lifecycle
        .close_sprint(CloseSprintRequest::new(SprintId::from_key("s1")))
        .await?;
    let closed = board.stored_sprint("s1").await?;

    let later = board.with_clock(day(12)).lifecycle();
    let result = later
        .close_sprint(CloseSprintRequest::new(SprintId::from_key("s1")))
        .await;

    eyre::ensure!(
        matches!(
            result,
            Err(SprintServiceError::Domain(
                SprintDomainError::InvalidStateTransition { .. }
            ))
        ),
        "expected invalid transition, got {result:?}"
    );
    assert_eq!(board.stored_sprint("s1").await?, closed);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn supplied_candidates_are_still_filtered_by_membership(board: Board) -> eyre::Result<()> {
    board
        .sprint("s1", SprintStatus::Active, (0, 14), &[])
        .await?;
    let member = board.story("a", "US-001", Some("s1"), Some(false)).await?;
    let stranger = board.story("b", "US-002", Some("s2"), Some(false)).await?;

    let summary = board
        .lifecycle()
        .close_sprint(
            CloseSprintRequest::new(SprintId::from_key("s1"))
                .with_options(ClosureOptions::backlog())
                .with_user_stories(vec![member, stranger])
                .with_tasks(Vec::new()),
        )
        .await?;

    assert_eq!(summary.stories_moved, 1);
    assert!(board.stored_story("b").await?.sprint_id().is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_sprint_can_be_activated_and_inspected(board: Board) -> eyre::Result<()> {
    let lifecycle = board.lifecycle();
    let sprint = lifecycle
        .create_sprint(CreateSprintRequest::new(" Checkout ", day(8), day(22)))
        .await?;
    let activated = lifecycle.activate_sprint(sprint.id()).await?;
    assert_eq!(activated.status(), SprintStatus::Active);
    assert_eq!(activated.title(), "Checkout");

    let again = lifecycle.activate_sprint(sprint.id()).await;
    assert!(matches!(again, Err(SprintServiceError::Domain(_))));

    let overview = lifecycle.sprint_overview(sprint.id()).await?;
    assert_eq!(overview.phase, SprintPhase::Planned);
    assert!(overview.user_stories.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_sprint_is_rejected_before_any_write(board: Board) -> eyre::Result<()> {
    let result = board
        .lifecycle()
        .create_sprint(CreateSprintRequest::new("Late", day(9), day(3)))
        .await;

    assert!(matches!(
        result,
        Err(SprintServiceError::Domain(SprintDomainError::StartAfterEnd { .. }))
    ));
    let stored = sprintwise::sprint::ports::WorkItemRepository::list_sprints(&*board.repository)
        .await?;
    assert!(stored.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overview_and_timeline_follow_task_progress(board: Board) -> eyre::Result<()> {
    board
        .sprint("s1", SprintStatus::Active, (0, 14), &["a", "b"])
        .await?;
    board.story("a", "US-001", None, Some(false)).await?;
    board.story("b", "US-002", None, Some(false)).await?;
    board
        .task("t1", BacklogTaskStatus::InProgress, &["a"], true)
        .await?;
    board.task("t2", BacklogTaskStatus::Todo, &["b"], true).await?;

    let lifecycle = board.lifecycle();
    let overview = lifecycle.sprint_overview(&SprintId::from_key("s1")).await?;
    assert_eq!(overview.phase, SprintPhase::Active);
    assert_eq!(overview.tasks.len(), 2);

    let timeline = lifecycle.timeline().await?;
    let phases: Vec<_> = timeline.iter().map(|entry| entry.phase).collect();
    assert_eq!(phases, [TimelinePhase::Planning, TimelinePhase::Execution]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn activity_override_is_stored_and_shown_on_the_timeline(board: Board) -> eyre::Result<()> {
    board
        .sprint("s1", SprintStatus::Planned, (0, 14), &[])
        .await?;
    board
        .sprint("s2", SprintStatus::Done, (-14, -1), &[])
        .await?;
    board.story("a", "US-001", Some("s1"), None).await?;
    let lifecycle = board.lifecycle();

    let flagged = lifecycle
        .set_sprint_activity(&SprintId::from_key("s1"), Some(true))
        .await?;
    assert!(flagged.is_running());
    assert_eq!(flagged.status(), SprintStatus::Planned);
    assert!(board.stored_sprint("s1").await?.is_running());

    let timeline = lifecycle.timeline().await?;
    let phases: Vec<_> = timeline.iter().map(|entry| entry.phase).collect();
    assert_eq!(phases, [TimelinePhase::Execution]);

    let closed = lifecycle
        .set_sprint_activity(&SprintId::from_key("s2"), Some(true))
        .await;
    assert!(matches!(
        closed,
        Err(SprintServiceError::Domain(SprintDomainError::SprintClosed(_)))
    ));
    Ok(())
}
