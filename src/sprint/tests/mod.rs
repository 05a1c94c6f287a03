//! Unit tests for the sprint module.
//!
//! Domain tests exercise the pure resolvers and planners on hand-built
//! snapshots; service tests drive the orchestration layer against the
//! in-memory repository or a mocked port.
