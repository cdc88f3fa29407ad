//! Trusted single-incident export.

use serde::Serialize;

use triage_core::payload::AuditSnapshot;

use crate::audit::AuditStamp;
use crate::error::DatabaseError;
use crate::service::IncidentService;

/// An incident and its audited collections, with the digest that covers them.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IncidentExport {
    #[serde(flatten)]
    pub snapshot: AuditSnapshot,
    /// `None` when auditing is disabled: the export is unstamped.
    pub audit: Option<AuditStamp>,
}

impl IncidentService {
    /// Verify the incident's digest, then return exactly the state it covers.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::IntegrityViolation` when the stored digest does
    /// not match current state. No export is produced in that case.
    pub async fn export_incident(&self, incident_id: &str) -> Result<IncidentExport, DatabaseError> {
        let (outcome, snapshot) = self.audit().verify_snapshot(incident_id).await?;
        tracing::info!(incident_id, stamped = outcome.stamp().is_some(), "incident exported");
        Ok(IncidentExport {
            audit: outcome.stamp().cloned(),
            snapshot,
        })
    }
}
