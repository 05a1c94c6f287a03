//! Run-time phase projected from a sprint's tasks.

use super::{BacklogTask, BacklogTaskStatus};
use serde::{Deserialize, Serialize};

/// Display phase of a sprint derived from its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintPhase {
    /// Nothing has started.
    Planned,
    /// At least one task is underway.
    Active,
    /// Every task is done.
    Review,
    /// Reserved for the retrospective ceremony. Not produced by
    /// [`compute_sprint_status`].
    Retrospective,
}

impl SprintPhase {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Review => "review",
            Self::Retrospective => "retrospective",
        }
    }
}

/// Projects the phase of a sprint from its resolved tasks.
///
/// Rules, first match wins: all done is [`SprintPhase::Review`]; any in
/// progress or in testing is [`SprintPhase::Active`]; anything else,
/// including an empty set and a done/todo mixture, is
/// [`SprintPhase::Planned`].
#[must_use]
pub fn compute_sprint_status<'a, I>(tasks: I) -> SprintPhase
where
    I: IntoIterator<Item = &'a BacklogTask>,
{
    let mut seen_any = false;
    let mut all_done = true;
    let mut any_underway = false;

    for task in tasks {
        seen_any = true;
        let status = task.status();
        all_done &= status == BacklogTaskStatus::Done;
        any_underway |= status.is_underway();
    }

    if seen_any && all_done {
        SprintPhase::Review
    } else if any_underway {
        SprintPhase::Active
    } else {
        SprintPhase::Planned
    }
}
