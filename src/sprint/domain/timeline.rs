//! Display-ordered timeline of stories appearing on sprints.

use super::{
    Badge, BacklogTask, BacklogTaskId, BacklogTaskStatus, Sprint, SprintId, SprintStatus,
    UserStory, UserStoryId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Timeline phase. Ordering follows the declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelinePhase {
    /// Work is scheduled but not started.
    Planning,
    /// Work is underway.
    Execution,
    /// Work is finished and awaiting review.
    Review,
}

impl TimelinePhase {
    /// Maps a task status onto the three timeline buckets.
    #[must_use]
    pub const fn from_task_status(status: BacklogTaskStatus) -> Self {
        match status {
            BacklogTaskStatus::Done => Self::Review,
            BacklogTaskStatus::InProgress | BacklogTaskStatus::InTesting => Self::Execution,
            BacklogTaskStatus::Todo => Self::Planning,
        }
    }

    fn from_sprint(sprint: &Sprint) -> Self {
        if sprint.status() == SprintStatus::Done {
            Self::Review
        } else if sprint.is_running() {
            Self::Execution
        } else {
            Self::Planning
        }
    }
}

/// One story placed on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Story shown by the entry.
    pub user_story_id: UserStoryId,
    /// Story code, for display.
    pub story_code: String,
    /// Story title, for display.
    pub story_title: String,
    /// Task through which the story was found, if any.
    pub task_id: Option<BacklogTaskId>,
    /// Sprint the story was matched to, if any.
    pub sprint_id: Option<SprintId>,
    /// Display phase.
    pub phase: TimelinePhase,
    /// Sprint start, when a sprint matched.
    pub start_date: Option<DateTime<Utc>>,
    /// Sprint end, when a sprint matched.
    pub end_date: Option<DateTime<Utc>>,
    /// Sort timestamp: sprint start, or story creation without a sprint.
    pub timestamp: DateTime<Utc>,
}

/// Builds one entry per story seen on a sprint, ordered by phase then time.
///
/// Badge-carrying tasks are scanned first, each contributing the first story
/// it references with a phase taken from the task's status. Stories with a
/// sprint reference that were not reached through a task are added next,
/// phased by their sprint: review once done, execution while running (by
/// status or activity override), planning otherwise. The first entry for a
/// story wins.
#[must_use]
pub fn build_timeline(
    sprints: &[Sprint],
    stories: &[UserStory],
    tasks: &[BacklogTask],
) -> Vec<TimelineEntry> {
    let mut seen: BTreeSet<&UserStoryId> = BTreeSet::new();
    let mut entries = Vec::new();

    for task in tasks.iter().filter(|task| task.badge() == Some(Badge::Sprint)) {
        let Some(story_id) = task.user_story_ids().first() else {
            continue;
        };
        let Some(story) = stories.iter().find(|story| story.id() == story_id) else {
            continue;
        };
        if !seen.insert(story.id()) {
            continue;
        }
        let sprint = sprint_for_story(sprints, story);
        entries.push(entry(
            story,
            Some(task.id().clone()),
            sprint,
            TimelinePhase::from_task_status(task.status()),
        ));
    }

    for story in stories.iter().filter(|story| story.sprint_id().is_some()) {
        if !seen.insert(story.id()) {
            continue;
        }
        let sprint = sprint_for_story(sprints, story);
        let phase = sprint.map_or(TimelinePhase::Planning, TimelinePhase::from_sprint);
        entries.push(entry(story, None, sprint, phase));
    }

    entries.sort_by(|a, b| (a.phase, a.timestamp).cmp(&(b.phase, b.timestamp)));
    entries
}

fn sprint_for_story<'a>(sprints: &'a [Sprint], story: &UserStory) -> Option<&'a Sprint> {
    story
        .sprint_id()
        .and_then(|sprint_id| sprints.iter().find(|sprint| sprint.id() == sprint_id))
        .or_else(|| {
            sprints
                .iter()
                .find(|sprint| sprint.user_story_ids().contains(story.id()))
        })
}

fn entry(
    story: &UserStory,
    task_id: Option<BacklogTaskId>,
    sprint: Option<&Sprint>,
    phase: TimelinePhase,
) -> TimelineEntry {
    TimelineEntry {
        user_story_id: story.id().clone(),
        story_code: story.code().to_string(),
        story_title: story.title().to_owned(),
        task_id,
        sprint_id: sprint.map(|s| s.id().clone()),
        phase,
        start_date: sprint.map(Sprint::start_date),
        end_date: sprint.map(Sprint::end_date),
        timestamp: sprint.map_or_else(|| story.created_at(), Sprint::start_date),
    }
}
