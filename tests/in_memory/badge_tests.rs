//! In-memory integration tests for badge synchronisation.

use super::helpers::{Board, board};
use rstest::rstest;
use sprintwise::sprint::domain::{BacklogTaskStatus, SprintStatus, UserStoryId};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn open_sprint_refresh_badges_members_and_clears_strays(board: Board) -> eyre::Result<()> {
    board
        .sprint("s1", SprintStatus::Active, (0, 14), &["a"])
        .await?;
    board
        .sprint("old", SprintStatus::Done, (0, 5), &["b"])
        .await?;
    board.story("a", "US-001", None, None).await?;
    board.story("b", "US-002", None, None).await?;
    board.task("t1", BacklogTaskStatus::Todo, &["a"], false).await?;
    board.task("t2", BacklogTaskStatus::Done, &["b"], true).await?;

    let summary = board.badges().sync_open_sprint_badges().await?;

    eyre::ensure!(summary.badged == 1 && summary.cleared == 1, "one of each");
    eyre::ensure!(board.stored_task("t1").await?.badge().is_some(), "member badged");
    eyre::ensure!(board.stored_task("t2").await?.badge().is_none(), "stray cleared");

    let again = board.badges().sync_open_sprint_badges().await?;
    eyre::ensure!(again.badged == 0 && again.cleared == 0, "second pass is a no-op");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn explicit_story_set_drives_task_badges(board: Board) -> eyre::Result<()> {
    let before = board
        .task("t1", BacklogTaskStatus::Todo, &["x", "y"], false)
        .await?;

    let summary = board
        .badges()
        .update_badges_for_sprint_user_stories(&[UserStoryId::from_key("y")])
        .await?;

    eyre::ensure!(summary.badged == 1, "task gains badge");
    let after = board.stored_task("t1").await?;
    eyre::ensure!(after.badge().is_some(), "badge stored");
    eyre::ensure!(after.updated_at() >= before.updated_at(), "timestamp moves forward");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cleanup_clears_done_sprint_items_not_shared_with_open_sprints(
    board: Board,
) -> eyre::Result<()> {
    board
        .sprint("old", SprintStatus::Done, (0, 5), &[])
        .await?;
    board
        .sprint("new", SprintStatus::Active, (6, 20), &[])
        .await?;
    board.story("a", "US-001", Some("old"), Some(true)).await?;
    board.story("b", "US-002", Some("new"), Some(false)).await?;
    board.task("only-old", BacklogTaskStatus::Done, &["a"], true).await?;
    board
        .task("shared", BacklogTaskStatus::InProgress, &["a", "b"], true)
        .await?;

    let summary = board.badges().cleanup_completed_sprints_badges().await?;

    eyre::ensure!(summary.cleaned == 2, "story a and task only-old cleaned");
    eyre::ensure!(board.stored_story("a").await?.badge().is_none(), "story cleaned");
    eyre::ensure!(board.stored_task("only-old").await?.badge().is_none(), "task cleaned");
    eyre::ensure!(board.stored_task("shared").await?.badge().is_some(), "shared kept");
    eyre::ensure!(board.stored_story("b").await?.badge().is_some(), "open story kept");

    let again = board.badges().cleanup_completed_sprints_badges().await?;
    eyre::ensure!(again.cleaned == 0, "cleanup is idempotent");
    Ok(())
}
