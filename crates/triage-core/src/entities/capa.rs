use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::CapaStatus;

/// A corrective and preventive action raised against an incident.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Capa {
    pub id: String,
    pub incident_id: String,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Option<String>,
    pub status: CapaStatus,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
