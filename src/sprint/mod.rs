//! Sprint lifecycle and work-item reconciliation.
//!
//! Sprints, user stories and backlog tasks reference each other two ways:
//! a sprint lists its stories and a story points at its sprint. This module
//! resolves membership across both, projects sprint status and timelines,
//! closes sprints with disposition of unfinished work, sweeps expired
//! sprints, and keeps badges and story lists consistent.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
