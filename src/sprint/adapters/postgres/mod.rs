//! `PostgreSQL` adapters for work-item persistence.

mod models;
mod repository;

pub use repository::{PostgresWorkItemRepository, WorkItemPgPool};
