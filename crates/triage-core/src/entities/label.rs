use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A category assigned to an incident.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct IncidentCategory {
    pub incident_id: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// A free-form tag assigned to an incident.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct IncidentTag {
    pub incident_id: String,
    pub tag: String,
    pub created_at: DateTime<Utc>,
}
