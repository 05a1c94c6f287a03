//! Adapter implementations for the sprint context.

mod clock;
pub mod memory;
pub mod postgres;

pub use clock::FixedClock;
