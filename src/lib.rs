//! Sprintwise: sprint lifecycle and work-item reconciliation engine.
//!
//! This crate decides which user stories and backlog tasks belong to a
//! sprint, derives sprint status from task progress, closes sprints with
//! disposition of unfinished work, and keeps denormalized sprint badges and
//! story lists consistent with resolved membership.
//!
//! # Architecture
//!
//! Sprintwise follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` document stores, fixed clock
//! - **Services**: Async orchestration over a repository and a clock
//!
//! # Modules
//!
//! - [`sprint`]: Sprints, stories, tasks and their reconciliation

pub mod sprint;
