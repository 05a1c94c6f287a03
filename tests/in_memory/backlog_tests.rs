//! In-memory integration tests for backlog management.

use super::helpers::{Board, board};
use rstest::rstest;
use sprintwise::sprint::{
    domain::{Badge, BacklogTaskStatus, SprintDomainError, SprintId, SprintStatus, UserStoryId},
    services::{CloseSprintRequest, CreateUserStoryRequest, SprintServiceError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn story_codes_fill_gaps(board: Board) -> eyre::Result<()> {
    board.story("a", "US-001", None, None).await?;
    board.story("c", "US-003", None, None).await?;

    let created = board
        .backlog()
        .create_user_story(
            CreateUserStoryRequest::new("Refund by card")
                .with_story_points(5)
                .with_criterion("accepted"),
        )
        .await?;
    let next = board
        .backlog()
        .create_user_story(CreateUserStoryRequest::new("Refund by voucher"))
        .await?;

    eyre::ensure!(created.code().to_string() == "US-002", "gap is filled");
    eyre::ensure!(next.code().to_string() == "US-004", "sequence extends");
    eyre::ensure!(created.story_points() == Some(5), "points kept");
    eyre::ensure!(!created.is_dod_complete(), "open criterion");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_for_unknown_story_is_rejected(board: Board) -> eyre::Result<()> {
    let result = board
        .backlog()
        .create_backlog_task("Wire refunds", vec![UserStoryId::from_key("ghost")])
        .await;

    eyre::ensure!(
        matches!(result, Err(SprintServiceError::UserStoryNotFound(_))),
        "expected missing story, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn moving_a_story_updates_both_sprints_and_badges(board: Board) -> eyre::Result<()> {
    board
        .sprint("from", SprintStatus::Active, (0, 14), &["a", "keep"])
        .await?;
    board
        .sprint("to", SprintStatus::Planned, (14, 28), &["other"])
        .await?;
    board.story("a", "US-001", Some("from"), None).await?;
    board.story("keep", "US-002", Some("from"), None).await?;
    board.story("other", "US-003", Some("to"), None).await?;
    let task = board
        .backlog()
        .create_backlog_task("Migrate ledger", vec![UserStoryId::from_key("a")])
        .await?;
    eyre::ensure!(task.status() == BacklogTaskStatus::Todo, "new task is todo");

    let moved = board
        .backlog()
        .assign_story_to_sprint(&UserStoryId::from_key("a"), Some(&SprintId::from_key("to")))
        .await?;

    eyre::ensure!(
        moved.sprint_id().map(SprintId::as_str) == Some("to"),
        "pull reference updated"
    );
    let from = board.stored_sprint("from").await?;
    let to = board.stored_sprint("to").await?;
    eyre::ensure!(
        from.user_story_ids() == [UserStoryId::from_key("keep")],
        "removed from old list"
    );
    eyre::ensure!(
        to.user_story_ids() == [UserStoryId::from_key("other"), UserStoryId::from_key("a")],
        "appended to new list"
    );
    eyre::ensure!(from.velocity() == 3 && to.velocity() == 6, "velocity recomputed");
    let badged = board.stored_task(task.id().as_str()).await?;
    eyre::ensure!(badged.badge().is_some(), "task of open sprint story badged");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn returning_to_backlog_clears_membership(board: Board) -> eyre::Result<()> {
    board
        .sprint("s1", SprintStatus::Active, (0, 14), &[])
        .await?;
    board.story("a", "US-001", Some("s1"), None).await?;

    let story = board
        .backlog()
        .assign_story_to_sprint(&UserStoryId::from_key("a"), None)
        .await?;

    eyre::ensure!(story.sprint_id().is_none(), "story unscheduled");
    eyre::ensure!(story.badge().is_none(), "badge cleared");
    eyre::ensure!(board.stored_story("a").await?.badge().is_none(), "stored badge cleared");
    eyre::ensure!(board.stored_sprint("s1").await?.velocity() == 0, "velocity drops");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scheduling_a_backlog_story_badges_it(board: Board) -> eyre::Result<()> {
    board
        .sprint("s1", SprintStatus::Active, (0, 14), &[])
        .await?;
    board.story("a", "US-001", None, None).await?;

    let story = board
        .backlog()
        .assign_story_to_sprint(&UserStoryId::from_key("a"), Some(&SprintId::from_key("s1")))
        .await?;

    assert_eq!(story.badge(), Some(Badge::Sprint));
    assert_eq!(board.stored_story("a").await?.badge(), Some(Badge::Sprint));
    assert_eq!(board.stored_sprint("s1").await?.velocity(), 3);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn story_left_in_a_closed_sprint_can_move_to_an_open_one(board: Board) -> eyre::Result<()> {
    board
        .sprint("s1", SprintStatus::Active, (0, 14), &["a"])
        .await?;
    board
        .sprint("s2", SprintStatus::Planned, (14, 28), &[])
        .await?;
    board.story("a", "US-001", Some("s1"), Some(false)).await?;
    board
        .lifecycle()
        .close_sprint(CloseSprintRequest::new(SprintId::from_key("s1")))
        .await?;
    let closed = board.stored_sprint("s1").await?;

    let story = board
        .backlog()
        .assign_story_to_sprint(&UserStoryId::from_key("a"), Some(&SprintId::from_key("s2")))
        .await?;

    assert_eq!(story.sprint_id().map(SprintId::as_str), Some("s2"));
    assert_eq!(story.badge(), Some(Badge::Sprint));
    assert_eq!(board.stored_sprint("s1").await?, closed);
    assert_eq!(board.stored_sprint("s2").await?.velocity(), 3);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assigning_into_a_closed_sprint_is_rejected(board: Board) -> eyre::Result<()> {
    board
        .sprint("done", SprintStatus::Done, (0, 5), &[])
        .await?;
    let story = board.story("a", "US-001", None, None).await?;

    let result = board
        .backlog()
        .assign_story_to_sprint(&UserStoryId::from_key("a"), Some(&SprintId::from_key("done")))
        .await;

    eyre::ensure!(
        matches!(
            result,
            Err(SprintServiceError::Domain(SprintDomainError::SprintClosed(_)))
        ),
        "expected closed sprint, got {result:?}"
    );
    eyre::ensure!(board.stored_story("a").await? == story, "story untouched");
    Ok(())
}
