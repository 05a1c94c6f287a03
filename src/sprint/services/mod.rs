//! Orchestration services for the sprint context.

mod backlog;
mod badges;
mod closure;
mod config;
mod error;
mod lifecycle;
mod migration;
mod repair;

pub use backlog::{BacklogService, CreateUserStoryRequest};
pub use badges::{BadgeCleanupSummary, BadgeSyncService, BadgeSyncSummary};
pub use config::SprintServiceConfig;
pub use error::{SprintServiceError, SprintServiceResult};
pub use lifecycle::{CloseSprintRequest, CreateSprintRequest, SprintLifecycleService, SprintOverview};
pub use migration::{ExpiryMigrationService, MigrationScope};
pub use repair::{ConsistencyRepairService, SyncSummary};
