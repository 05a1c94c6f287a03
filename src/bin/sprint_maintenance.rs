//! Runs sprint maintenance sweeps against the `PostgreSQL` work-item store.
//!
//! Usage:
//!
//! ```text
//! sprint-maintenance [--database-url URL] [--as-of RFC3339] <command>
//! ```
//!
//! Commands:
//!
//! - `migrate`: close every open sprint whose end date has passed
//! - `sync-stories`: rewrite sprint story lists from story back-references
//! - `cleanup-badges`: clear stale badges left on done sprints
//! - `refresh-badges`: align task badges with open sprint membership
//!
//! The result summary is printed to stdout as JSON. Logs go to stderr and are
//! filtered through `RUST_LOG` (default `info`).

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::{Clock, DefaultClock};
use serde_json::Value;
use sprintwise::sprint::{
    adapters::{FixedClock, postgres::PostgresWorkItemRepository},
    ports::WorkItemRepository,
    services::{
        BadgeSyncService, ConsistencyRepairService, ExpiryMigrationService, MigrationScope,
        SprintServiceError,
    },
};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "sprint-maintenance", version, about = "Sprint maintenance sweeps")]
struct Cli {
    /// `PostgreSQL` connection string.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Maximum number of pooled connections.
    #[arg(long, default_value_t = 4)]
    pool_size: u32,

    /// Evaluate expiry as of this instant instead of now.
    #[arg(long, value_name = "RFC3339")]
    as_of: Option<DateTime<Utc>>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

/// Maintenance operation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Close expired sprints and dispose of their unfinished work.
    Migrate {
        /// Leave unfinished stories attached to their sprint.
        #[arg(long)]
        skip_stories: bool,
        /// Leave task badges untouched.
        #[arg(long)]
        skip_tasks: bool,
    },
    /// Rewrite sprint story lists from story back-references.
    SyncStories,
    /// Clear badges left on the stories and tasks of done sprints.
    CleanupBadges,
    /// Align task badges with the stories of open sprints.
    RefreshBadges,
}

impl Command {
    const fn migration_scope(skip_stories: bool, skip_tasks: bool) -> MigrationScope {
        MigrationScope {
            include_user_stories: !skip_stories,
            include_tasks: !skip_tasks,
        }
    }
}

/// Errors that can occur during a maintenance run.
#[derive(Debug, Error)]
enum MaintenanceError {
    #[error("failed to build connection pool: {0}")]
    Pool(#[source] diesel::r2d2::PoolError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error(transparent)]
    Service(#[from] SprintServiceError),
    #[error("failed to encode result: {0}")]
    Encode(#[source] serde_json::Error),
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let pool = Pool::builder()
        .max_size(cli.pool_size)
        .build(ConnectionManager::<PgConnection>::new(&cli.database_url))
        .map_err(MaintenanceError::Pool)?;
    let repository = Arc::new(PostgresWorkItemRepository::new(pool));

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(MaintenanceError::RuntimeInit)?;
    let output = runtime.block_on(async {
        match cli.as_of {
            Some(instant) => run(cli.command, repository, Arc::new(FixedClock::new(instant))).await,
            None => run(cli.command, repository, Arc::new(DefaultClock)).await,
        }
    })?;

    emit(&output)?;
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

async fn run<R, C>(
    command: Command,
    repository: Arc<R>,
    clock: Arc<C>,
) -> Result<Value, MaintenanceError>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    let output = match command {
        Command::Migrate {
            skip_stories,
            skip_tasks,
        } => {
            let service = ExpiryMigrationService::new(repository, clock);
            let summaries = service
                .migrate_expired_sprints(Command::migration_scope(skip_stories, skip_tasks))
                .await?;
            serde_json::to_value(summaries)
        }
        Command::SyncStories => {
            let service = ConsistencyRepairService::new(repository, clock);
            serde_json::to_value(service.sync_sprint_user_stories().await?)
        }
        Command::CleanupBadges => {
            let service = BadgeSyncService::new(repository, clock);
            serde_json::to_value(service.cleanup_completed_sprints_badges().await?)
        }
        Command::RefreshBadges => {
            let service = BadgeSyncService::new(repository, clock);
            serde_json::to_value(service.sync_open_sprint_badges().await?)
        }
    };
    output.map_err(MaintenanceError::Encode)
}

#[expect(
    clippy::print_stdout,
    reason = "the command result is the program's stdout contract"
)]
fn emit(output: &Value) -> Result<(), MaintenanceError> {
    let rendered = serde_json::to_string_pretty(output).map_err(MaintenanceError::Encode)?;
    println!("{rendered}");
    Ok(())
}
