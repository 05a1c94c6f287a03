//! Diesel row models for work-item document collections.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row shared by the three document collections.
#[derive(Debug, Clone, QueryableByName)]
pub struct DocumentRow {
    /// Document key.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub id: String,
    /// JSONB document body.
    #[diesel(sql_type = diesel::sql_types::Jsonb)]
    pub document: Value,
    /// Last write timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub updated_at: DateTime<Utc>,
}
