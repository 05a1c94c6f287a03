//! Shared world state for sprint closure BDD scenarios.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rstest::fixture;
use sprintwise::sprint::{
    adapters::{FixedClock, memory::InMemoryWorkItemRepository},
    domain::ClosureSummary,
    services::{ExpiryMigrationService, SprintLifecycleService, SprintServiceError},
};

/// Lifecycle service type used by the BDD world.
pub type TestLifecycleService = SprintLifecycleService<InMemoryWorkItemRepository, FixedClock>;

/// Expiry sweep service type used by the BDD world.
pub type TestMigrationService = ExpiryMigrationService<InMemoryWorkItemRepository, FixedClock>;

/// Scenario world for sprint closure behaviour tests.
pub struct SprintClosureWorld {
    pub repository: Arc<InMemoryWorkItemRepository>,
    pub now: DateTime<Utc>,
    pub lifecycle: TestLifecycleService,
    pub migration: TestMigrationService,
    pub last_migration: Option<Result<Vec<ClosureSummary>, SprintServiceError>>,
    pub last_close: Option<Result<ClosureSummary, SprintServiceError>>,
}

impl SprintClosureWorld {
    /// Creates a world whose clock reads noon on 10 June 2026.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc
            .with_ymd_and_hms(2026, 6, 10, 12, 0, 0)
            .single()
            .unwrap_or_default();
        let repository = Arc::new(InMemoryWorkItemRepository::new());
        let clock = Arc::new(FixedClock::new(now));

        Self {
            lifecycle: SprintLifecycleService::new(Arc::clone(&repository), Arc::clone(&clock)),
            migration: ExpiryMigrationService::new(Arc::clone(&repository), clock),
            repository,
            now,
            last_migration: None,
            last_close: None,
        }
    }
}

impl Default for SprintClosureWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> SprintClosureWorld {
    SprintClosureWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
