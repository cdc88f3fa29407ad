use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{IncidentStatus, Milestone, Severity};

/// The audited entity: an operational incident and its lifecycle milestones.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: IncidentStatus,
    pub severity: Severity,
    pub reporter_id: Option<String>,
    pub assignee_id: Option<String>,
    pub team_id: Option<String>,
    pub service_id: Option<String>,
    pub triaged_at: Option<DateTime<Utc>>,
    pub in_progress_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Storage bookkeeping. Bumped on every row write, including audit
    /// stamps, so it is never part of the audited payload.
    pub updated_at: DateTime<Utc>,
    pub audit_hash: Option<String>,
    pub audit_hash_updated_at: Option<DateTime<Utc>>,
}

impl Incident {
    /// Current value of a milestone timestamp.
    #[must_use]
    pub const fn milestone(&self, milestone: Milestone) -> Option<DateTime<Utc>> {
        match milestone {
            Milestone::Triaged => self.triaged_at,
            Milestone::InProgress => self.in_progress_at,
            Milestone::Resolved => self.resolved_at,
            Milestone::Closed => self.closed_at,
        }
    }

    /// Stamp a milestone unless it already holds a value.
    ///
    /// Returns `true` when the stamp was written.
    pub fn stamp_milestone(&mut self, milestone: Milestone, at: DateTime<Utc>) -> bool {
        let slot = match milestone {
            Milestone::Triaged => &mut self.triaged_at,
            Milestone::InProgress => &mut self.in_progress_at,
            Milestone::Resolved => &mut self.resolved_at,
            Milestone::Closed => &mut self.closed_at,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(at);
        true
    }
}
