use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::TimelineEntryType;

/// An append-only entry on an incident's timeline.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TimelineEntry {
    pub id: String,
    pub incident_id: String,
    pub entry_type: TimelineEntryType,
    pub message: String,
    pub actor_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
