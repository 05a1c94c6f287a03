//! Denormalized display marker carried by stories and tasks.

use serde::{Deserialize, Serialize};

/// Marker flagging a record as part of a live sprint board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    /// The record belongs to a sprint that is still open.
    Sprint,
}

impl Badge {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sprint => "sprint",
        }
    }
}
