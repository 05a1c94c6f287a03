//! Resolution of which stories and tasks belong to a sprint.
//!
//! Two references can place a story in a sprint: the sprint's ordered
//! `user_story_ids` list (push) and the story's `sprint_id` (pull). When the
//! push list is non-empty it is authoritative and the pull reference is
//! ignored; otherwise pull is the fallback. The two are never unioned.

use super::{BacklogTask, Sprint, UserStory, UserStoryId};
use std::collections::BTreeSet;

/// Returns the stories resolved as members of `sprint`, in `stories` order.
///
/// Returns an empty list when `sprint` is `None`.
#[must_use]
pub fn user_stories_for_sprint<'a>(
    sprint: Option<&Sprint>,
    stories: &'a [UserStory],
) -> Vec<&'a UserStory> {
    let Some(sprint) = sprint else {
        return Vec::new();
    };

    if sprint.uses_push_list() {
        let listed: BTreeSet<&UserStoryId> = sprint.user_story_ids().iter().collect();
        stories
            .iter()
            .filter(|story| listed.contains(story.id()))
            .collect()
    } else {
        stories
            .iter()
            .filter(|story| story.belongs_to(sprint.id()))
            .collect()
    }
}

/// Returns the tasks implementing at least one of `story_ids`.
///
/// A task serving stories of several sprints is returned for each of them.
#[must_use]
pub fn tasks_for_sprint<'a>(
    tasks: &'a [BacklogTask],
    story_ids: &[UserStoryId],
) -> Vec<&'a BacklogTask> {
    if story_ids.is_empty() {
        return Vec::new();
    }
    let wanted: BTreeSet<&UserStoryId> = story_ids.iter().collect();
    tasks
        .iter()
        .filter(|task| task.references_any(&wanted))
        .collect()
}

/// Resolved stories and tasks of one sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintMembership<'a> {
    stories: Vec<&'a UserStory>,
    tasks: Vec<&'a BacklogTask>,
}

impl<'a> SprintMembership<'a> {
    /// Resolves stories first, then the tasks implementing them.
    #[must_use]
    pub fn resolve(sprint: &Sprint, stories: &'a [UserStory], tasks: &'a [BacklogTask]) -> Self {
        let member_stories = user_stories_for_sprint(Some(sprint), stories);
        let story_ids: Vec<UserStoryId> =
            member_stories.iter().map(|story| story.id().clone()).collect();
        Self {
            tasks: tasks_for_sprint(tasks, &story_ids),
            stories: member_stories,
        }
    }

    /// Returns the member stories.
    #[must_use]
    pub fn stories(&self) -> &[&'a UserStory] {
        &self.stories
    }

    /// Returns the member tasks.
    #[must_use]
    pub fn tasks(&self) -> &[&'a BacklogTask] {
        &self.tasks
    }

    /// Returns the member story identifiers.
    #[must_use]
    pub fn story_ids(&self) -> BTreeSet<&'a UserStoryId> {
        self.stories.iter().map(|story| story.id()).collect()
    }
}
