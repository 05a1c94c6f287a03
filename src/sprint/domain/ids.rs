//! Identifier types for the sprint domain.
//!
//! Records live in a document store keyed by opaque strings, so identifiers
//! wrap `String` rather than a parsed UUID. Freshly minted identifiers are
//! UUIDv4 strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Wraps an existing document key.
            #[must_use]
            pub fn from_key(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Returns the document key.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier, returning the document key.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from_key(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

document_id!(
    /// Unique identifier for a sprint record.
    SprintId
);

document_id!(
    /// Unique identifier for a user story record.
    UserStoryId
);

document_id!(
    /// Unique identifier for a backlog task record.
    BacklogTaskId
);
