//! Clock pinned to a single instant.

use chrono::{DateTime, Local, Utc};
use mockable::Clock;

/// [`Clock`] that always reports the same instant.
///
/// Used to replay an expiry sweep "as of" a given time and to make tests
/// deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Creates a clock pinned to `instant`.
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Returns the pinned instant.
    #[must_use]
    pub const fn instant(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}
