use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A free-text comment on an incident.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub incident_id: String,
    pub author_id: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
