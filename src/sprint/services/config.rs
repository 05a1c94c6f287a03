//! Tunables shared by the sprint services.

use crate::sprint::domain::{ClosureOptions, DispositionStrategy};

/// Configuration for sprint lifecycle and backlog services.
///
/// # Examples
///
/// ```
/// use sprintwise::sprint::services::SprintServiceConfig;
///
/// let config = SprintServiceConfig::default();
/// assert_eq!(config.story_code_prefix, "US");
///
/// let carry_over = SprintServiceConfig::carry_over();
/// assert!(carry_over.migration_options().needs_user_stories());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintServiceConfig {
    /// Minimum number of characters in a trimmed sprint title.
    pub min_title_length: usize,
    /// Prefix of generated story codes.
    pub story_code_prefix: String,
    /// Zero-padded width of the story code sequence number.
    pub story_code_width: usize,
    /// Strategy applied to unfinished stories by the expiry sweep.
    pub migration_stories: DispositionStrategy,
    /// Strategy applied to tasks by the expiry sweep.
    pub migration_tasks: DispositionStrategy,
}

impl Default for SprintServiceConfig {
    fn default() -> Self {
        Self {
            min_title_length: 3,
            story_code_prefix: "US".to_owned(),
            story_code_width: 3,
            migration_stories: DispositionStrategy::Backlog,
            migration_tasks: DispositionStrategy::Backlog,
        }
    }
}

impl SprintServiceConfig {
    /// Creates a configuration that leaves unfinished work where it is when
    /// a sprint expires.
    #[must_use]
    pub fn carry_over() -> Self {
        Self {
            migration_stories: DispositionStrategy::NextSprint,
            migration_tasks: DispositionStrategy::NextSprint,
            ..Default::default()
        }
    }

    /// Sets the story code prefix.
    #[must_use]
    pub fn with_story_code_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.story_code_prefix = prefix.into();
        self
    }

    /// Returns the closure options used by the expiry sweep.
    #[must_use]
    pub const fn migration_options(&self) -> ClosureOptions {
        ClosureOptions {
            user_stories: Some(self.migration_stories),
            tasks: Some(self.migration_tasks),
        }
    }
}
