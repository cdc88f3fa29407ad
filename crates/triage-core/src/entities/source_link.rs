use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A reference from an incident to the external alert or ticket that raised it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SourceLink {
    pub id: String,
    pub incident_id: String,
    /// Originating system, e.g. `datadog`, `pagerduty`, `manual`.
    pub source: String,
    pub external_id: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}
