//! Domain model for sprint lifecycle and work-item reconciliation.
//!
//! Everything here is pure: membership resolution, status and timeline
//! projection, and closure planning operate on snapshots and return values,
//! leaving persistence to the services.

mod backlog_task;
mod badge;
mod closure;
mod error;
mod ids;
mod membership;
mod phase;
mod sprint;
mod story;
mod timeline;

pub use backlog_task::{BacklogTask, BacklogTaskStatus, PersistedBacklogTaskData};
pub use badge::Badge;
pub use closure::{
    ClosureOptions, ClosurePlan, ClosureSummary, DispositionStrategy, apply_to_snapshot,
    plan_closure,
};
pub use error::{
    ParseSprintStatusError, ParseStoryCodeError, ParseTaskStatusError, SprintDomainError,
};
pub use ids::{BacklogTaskId, SprintId, UserStoryId};
pub use membership::{SprintMembership, tasks_for_sprint, user_stories_for_sprint};
pub use phase::{SprintPhase, compute_sprint_status};
pub use sprint::{
    CLOSED_SPRINT_PROGRESS, PersistedSprintData, Sprint, SprintDraft, SprintStatus,
};
pub use story::{DefinitionOfDone, PersistedUserStoryData, StoryCode, UserStory};
pub use timeline::{TimelineEntry, TimelinePhase, build_timeline};
