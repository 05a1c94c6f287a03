//! Port contracts for sprint lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by sprint services.

pub mod repository;

pub use repository::{
    ChangeSet, WorkItemKind, WorkItemRepository, WorkItemRepositoryError,
    WorkItemRepositoryResult,
};
