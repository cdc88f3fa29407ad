//! Audit coordination: digest refresh after mutations and fail-closed
//! verification before trusted exports.
//!
//! The digest is HMAC-SHA256 over the canonical payload of an
//! [`AuditSnapshot`]. Refresh is best effort and never fails the mutation
//! that triggered it. Verification is fatal on mismatch and records a
//! `tamper_alert` timeline entry without re-stamping, so the incident keeps
//! failing verification until someone refreshes it deliberately.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use triage_core::enums::TimelineEntryType;
use triage_core::integrity::{self, AuditSecret};
use triage_core::payload::{self, AuditSnapshot};

use crate::error::DatabaseError;
use crate::helpers::now;
use crate::service::IncidentService;

/// A persisted digest and the time it was written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditStamp {
    pub hash: String,
    pub updated_at: DateTime<Utc>,
}

/// Result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// No secret configured; nothing was checked.
    Disabled,
    /// The incident had no digest yet; one was computed and stored.
    Backfilled(AuditStamp),
    /// The stored digest matches current state.
    Verified(AuditStamp),
}

impl VerifyOutcome {
    /// The stamp covering the verified state, if any.
    #[must_use]
    pub const fn stamp(&self) -> Option<&AuditStamp> {
        match self {
            Self::Disabled => None,
            Self::Backfilled(stamp) | Self::Verified(stamp) => Some(stamp),
        }
    }
}

/// Read-only diagnostic view of an incident's digest.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuditStatus {
    pub incident_id: String,
    pub enabled: bool,
    pub stored: Option<String>,
    pub stored_at: Option<DateTime<Utc>>,
    pub computed: Option<String>,
    /// `None` when disabled or when nothing is stored yet.
    pub matches: Option<bool>,
}

/// Digest coordinator for one [`IncidentService`].
pub struct AuditCoordinator<'a> {
    service: &'a IncidentService,
    secret: Option<&'a AuditSecret>,
}

fn compute_digest(secret: &AuditSecret, snapshot: &AuditSnapshot) -> Result<String, DatabaseError> {
    let canonical = payload::canonical_payload(snapshot)?;
    Ok(integrity::sign(secret.expose(), &canonical)?)
}

fn short(hash: &str) -> String {
    hash.chars().take(12).collect()
}

impl<'a> AuditCoordinator<'a> {
    #[must_use]
    pub const fn new(service: &'a IncidentService, secret: Option<&'a AuditSecret>) -> Self {
        Self { service, secret }
    }

    /// Whether a secret is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Recompute and persist the digest for `incident_id`.
    ///
    /// Returns `Ok(None)` without touching storage when auditing is disabled.
    /// The snapshot read and the digest write happen under the write lock, so
    /// no mutation lands between them.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the incident is missing, the snapshot cannot
    /// be read, or the digest cannot be computed or stored.
    pub async fn refresh_hash(&self, incident_id: &str) -> Result<Option<AuditStamp>, DatabaseError> {
        let Some(secret) = self.secret else {
            return Ok(None);
        };

        let _guard = self.service.db().write_lock().await;
        let snapshot = self.service.read_snapshot(incident_id).await?;
        let hash = compute_digest(secret, &snapshot)?;
        let at = now();
        self.service.store_audit_hash(incident_id, &hash, at).await?;

        tracing::debug!(incident_id, hash = %short(&hash), "audit digest refreshed");
        Ok(Some(AuditStamp {
            hash,
            updated_at: at,
        }))
    }

    /// [`Self::refresh_hash`] for callers whose own work already committed.
    ///
    /// Failures are logged and swallowed: store-level transient failures at
    /// `warn`, anything else at `error` since it points at a bug or a schema
    /// mismatch. The stored digest stays stale until the next refresh or a
    /// verification backfill.
    pub async fn refresh_best_effort(&self, incident_id: &str) -> Option<AuditStamp> {
        match self.refresh_hash(incident_id).await {
            Ok(stamp) => stamp,
            Err(error) if error.is_transient() => {
                tracing::warn!(incident_id, %error, "audit digest refresh failed; stored digest is stale");
                None
            }
            Err(error) => {
                tracing::error!(incident_id, %error, "audit digest refresh failed unexpectedly");
                None
            }
        }
    }

    /// Run [`Self::refresh_best_effort`] on a detached task.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use = "dropping the handle detaches the refresh; await it to observe the stamp"]
    pub fn spawn_refresh(&self, incident_id: &str) -> JoinHandle<Option<AuditStamp>> {
        let service = self.service.clone();
        let incident_id = incident_id.to_string();
        tokio::spawn(async move { service.audit().refresh_best_effort(&incident_id).await })
    }

    /// Verify the stored digest against current state before a trusted export.
    ///
    /// Disabled auditing returns [`VerifyOutcome::Disabled`] without reading
    /// anything. A missing digest is backfilled.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::IntegrityViolation`] on mismatch, after
    /// appending a `tamper_alert` timeline entry. Other errors propagate as-is.
    pub async fn verify_or_fail(&self, incident_id: &str) -> Result<VerifyOutcome, DatabaseError> {
        if !self.is_enabled() {
            return Ok(VerifyOutcome::Disabled);
        }
        Ok(self.verify_snapshot(incident_id).await?.0)
    }

    /// Verify and return the exact snapshot the outcome covers.
    ///
    /// With auditing disabled the snapshot is still loaded and the outcome
    /// is [`VerifyOutcome::Disabled`].
    pub(crate) async fn verify_snapshot(
        &self,
        incident_id: &str,
    ) -> Result<(VerifyOutcome, AuditSnapshot), DatabaseError> {
        let guard = self.service.db().write_lock().await;
        let mut snapshot = self.service.read_snapshot(incident_id).await?;

        let Some(secret) = self.secret else {
            return Ok((VerifyOutcome::Disabled, snapshot));
        };

        let canonical = payload::canonical_payload(&snapshot)?;

        let Some(stored) = snapshot.incident.audit_hash.clone() else {
            let hash = integrity::sign(secret.expose(), &canonical)?;
            let at = now();
            self.service.store_audit_hash(incident_id, &hash, at).await?;
            snapshot.incident.audit_hash = Some(hash.clone());
            snapshot.incident.audit_hash_updated_at = Some(at);
            snapshot.incident.updated_at = at;

            tracing::info!(incident_id, hash = %short(&hash), "audit digest backfilled");
            return Ok((
                VerifyOutcome::Backfilled(AuditStamp {
                    hash,
                    updated_at: at,
                }),
                snapshot,
            ));
        };

        if integrity::verify(secret.expose(), &canonical, &stored)? {
            let stamp = AuditStamp {
                hash: stored,
                updated_at: snapshot
                    .incident
                    .audit_hash_updated_at
                    .unwrap_or(snapshot.incident.updated_at),
            };
            tracing::debug!(incident_id, "audit digest verified");
            return Ok((VerifyOutcome::Verified(stamp), snapshot));
        }

        let computed = integrity::sign(secret.expose(), &canonical)?;
        drop(guard);

        tracing::error!(
            incident_id,
            stored = %short(&stored),
            computed = %short(&computed),
            "audit digest mismatch; refusing trusted export"
        );

        let message = format!(
            "Integrity check failed: stored digest {} does not match current state {}",
            short(&stored),
            short(&computed)
        );
        if let Err(error) = self
            .service
            .append_timeline(incident_id, TimelineEntryType::TamperAlert, &message, None)
            .await
        {
            tracing::error!(incident_id, %error, "failed to record tamper alert");
        }

        Err(DatabaseError::IntegrityViolation {
            incident_id: incident_id.to_string(),
            stored,
            computed,
        })
    }

    /// Report stored vs recomputed digest without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the incident is missing or the snapshot
    /// cannot be read.
    pub async fn audit_status(&self, incident_id: &str) -> Result<AuditStatus, DatabaseError> {
        let snapshot = {
            let _guard = self.service.db().write_lock().await;
            self.service.read_snapshot(incident_id).await?
        };

        let stored = snapshot.incident.audit_hash.clone();
        let stored_at = snapshot.incident.audit_hash_updated_at;
        let computed = match self.secret {
            Some(secret) => Some(compute_digest(secret, &snapshot)?),
            None => None,
        };
        let matches = match (&stored, &computed) {
            (Some(stored), Some(computed)) => Some(stored == computed),
            _ => None,
        };

        Ok(AuditStatus {
            incident_id: incident_id.to_string(),
            enabled: self.is_enabled(),
            stored,
            stored_at,
            computed,
            matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use triage_core::enums::{IncidentStatus, Severity, TimelineEntryType};

    use super::*;
    use crate::repos::incident::NewIncident;
    use crate::test_support::helpers::{
        tamper, tamper_alerts, tamper_title, test_service, test_service_without_audit,
    };

    async fn create(svc: &IncidentService) -> String {
        svc.create_incident(Some("usr-1"), &NewIncident::new("DB down", Severity::Sev1))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn create_stamps_initial_digest() {
        let svc = test_service().await;
        let id = create(&svc).await;
        let incident = svc.get_incident(&id).await.unwrap();
        let hash = incident.audit_hash.expect("digest stored after create");
        assert_eq!(hash.len(), 64);
        assert!(incident.audit_hash_updated_at.is_some());
    }

    #[tokio::test]
    async fn refresh_is_idempotent_on_unchanged_state() {
        let svc = test_service().await;
        let id = create(&svc).await;
        let first = svc.audit().refresh_hash(&id).await.unwrap().unwrap();
        let second = svc.audit().refresh_hash(&id).await.unwrap().unwrap();
        assert_eq!(first.hash, second.hash);
    }

    #[tokio::test]
    async fn refresh_missing_incident_is_not_found() {
        let svc = test_service().await;
        let err = svc.audit().refresh_hash("inc-missing").await.unwrap_err();
        assert!(err.is_validation());
        assert!(svc.audit().refresh_best_effort("inc-missing").await.is_none());
    }

    #[tokio::test]
    async fn verify_fresh_incident_succeeds() {
        let svc = test_service().await;
        let id = create(&svc).await;
        let stored = svc.get_incident(&id).await.unwrap().audit_hash.unwrap();
        match svc.audit().verify_or_fail(&id).await.unwrap() {
            VerifyOutcome::Verified(stamp) => assert_eq!(stamp.hash, stored),
            other => panic!("expected Verified, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn verify_backfills_missing_digest() {
        let svc = test_service().await;
        let id = create(&svc).await;
        svc.db()
            .conn()
            .execute(
                "UPDATE incidents SET audit_hash = NULL, audit_hash_updated_at = NULL WHERE id = ?1",
                [id.as_str()],
            )
            .await
            .unwrap();

        let outcome = svc.audit().verify_or_fail(&id).await.unwrap();
        let VerifyOutcome::Backfilled(stamp) = outcome else {
            panic!("expected Backfilled, got {outcome:?}");
        };
        let incident = svc.get_incident(&id).await.unwrap();
        assert_eq!(incident.audit_hash, Some(stamp.hash));

        assert!(matches!(
            svc.audit().verify_or_fail(&id).await.unwrap(),
            VerifyOutcome::Verified(_)
        ));
    }

    #[tokio::test]
    async fn tampering_fails_closed_and_records_alert() {
        let svc = test_service().await;
        let id = create(&svc).await;
        let stored = svc.get_incident(&id).await.unwrap().audit_hash.unwrap();
        tamper_title(&svc, &id, "DB fine actually").await;

        let err = svc.audit().verify_or_fail(&id).await.unwrap_err();
        match &err {
            DatabaseError::IntegrityViolation {
                incident_id,
                stored: s,
                computed,
            } => {
                assert_eq!(incident_id, &id);
                assert_eq!(s, &stored);
                assert_ne!(computed, &stored);
            }
            other => panic!("expected IntegrityViolation, got {other:?}"),
        }

        let timeline = svc.list_timeline(&id).await.unwrap();
        let alerts: Vec<_> = timeline
            .iter()
            .filter(|e| e.entry_type == TimelineEntryType::TamperAlert)
            .collect();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].actor_id, None);

        // The alert does not re-stamp, so the incident keeps failing.
        assert_eq!(svc.get_incident(&id).await.unwrap().audit_hash, Some(stored));
        assert!(svc.audit().verify_or_fail(&id).await.unwrap_err().is_integrity_violation());
    }

    #[tokio::test]
    async fn updated_at_only_change_still_verifies() {
        let svc = test_service().await;
        let id = create(&svc).await;
        svc.db()
            .conn()
            .execute(
                "UPDATE incidents SET updated_at = '2030-01-01T00:00:00.000Z' WHERE id = ?1",
                [id.as_str()],
            )
            .await
            .unwrap();
        assert!(matches!(
            svc.audit().verify_or_fail(&id).await.unwrap(),
            VerifyOutcome::Verified(_)
        ));
    }

    #[tokio::test]
    async fn disabled_audit_is_a_silent_no_op() {
        let svc = test_service_without_audit().await;
        let id = create(&svc).await;

        assert!(!svc.audit().is_enabled());
        assert_eq!(svc.audit().refresh_hash(&id).await.unwrap(), None);
        assert_eq!(svc.get_incident(&id).await.unwrap().audit_hash, None);

        tamper_title(&svc, &id, "anything").await;
        assert_eq!(
            svc.audit().verify_or_fail(&id).await.unwrap(),
            VerifyOutcome::Disabled
        );
        assert_eq!(
            svc.audit().verify_or_fail("inc-missing").await.unwrap(),
            VerifyOutcome::Disabled
        );
    }

    #[tokio::test]
    async fn spawned_refresh_stores_digest() {
        let svc = test_service().await;
        let id = create(&svc).await;
        tamper_title(&svc, &id, "changed out of band").await;

        let stamp = svc.audit().spawn_refresh(&id).await.unwrap().unwrap();
        assert_eq!(
            svc.get_incident(&id).await.unwrap().audit_hash,
            Some(stamp.hash)
        );
        assert!(matches!(
            svc.audit().verify_or_fail(&id).await.unwrap(),
            VerifyOutcome::Verified(_)
        ));
    }

    #[tokio::test]
    async fn audit_status_reports_without_writing() {
        let svc = test_service().await;
        let id = create(&svc).await;
        let before = svc.get_incident(&id).await.unwrap();

        let status = svc.audit().audit_status(&id).await.unwrap();
        assert!(status.enabled);
        assert_eq!(status.matches, Some(true));
        assert_eq!(status.stored, before.audit_hash);

        tamper_title(&svc, &id, "edited").await;
        let status = svc.audit().audit_status(&id).await.unwrap();
        assert_eq!(status.matches, Some(false));

        let after = svc.get_incident(&id).await.unwrap();
        assert_eq!(after.audit_hash, before.audit_hash);
        assert!(svc.list_timeline(&id).await.unwrap().iter().all(|e| e.entry_type != TimelineEntryType::TamperAlert));
    }

    #[tokio::test]
    async fn different_secrets_disagree() {
        let svc = test_service().await;
        let id = create(&svc).await;

        let mut other = svc.clone();
        other.set_audit_secret(AuditSecret::new("a-different-secret"));
        assert!(other.audit().verify_or_fail(&id).await.unwrap_err().is_integrity_violation());
        assert_eq!(
            svc.get_incident(&id).await.unwrap().status,
            IncidentStatus::New
        );
    }

    #[tokio::test]
    async fn unparseable_milestone_is_an_integrity_violation() {
        let svc = test_service().await;
        let id = create(&svc).await;
        svc.transition_incident(None, &id, IncidentStatus::Triaged, None)
            .await
            .unwrap();
        tamper(&svc, "UPDATE incidents SET triaged_at = 'garbage' WHERE id = ?1", &id).await;

        let status = svc.audit().audit_status(&id).await.unwrap();
        assert_eq!(status.matches, Some(false));

        let err = svc.audit().verify_or_fail(&id).await.unwrap_err();
        assert!(err.is_integrity_violation(), "got {err:?}");
        assert_eq!(tamper_alerts(&svc, &id).await, 1);
    }

    #[tokio::test]
    async fn unparseable_comment_time_is_an_integrity_violation() {
        let svc = test_service().await;
        let id = create(&svc).await;
        svc.add_comment(Some("usr-1"), &id, "rolled back").await.unwrap();
        tamper(&svc, "UPDATE comments SET created_at = 'not a date' WHERE incident_id = ?1", &id).await;

        let err = svc.audit().verify_or_fail(&id).await.unwrap_err();
        assert!(err.is_integrity_violation(), "got {err:?}");
        assert_eq!(tamper_alerts(&svc, &id).await, 1);
    }

    #[tokio::test]
    async fn unparseable_unaudited_time_still_verifies() {
        let svc = test_service().await;
        let id = create(&svc).await;
        tamper(&svc, "UPDATE incidents SET updated_at = 'garbage' WHERE id = ?1", &id).await;
        assert!(matches!(
            svc.audit().verify_or_fail(&id).await.unwrap(),
            VerifyOutcome::Verified(_)
        ));
    }

    #[tokio::test]
    async fn null_to_empty_string_is_an_integrity_violation() {
        let svc = test_service().await;
        let id = create(&svc).await;
        assert_eq!(svc.get_incident(&id).await.unwrap().description, None);
        tamper(&svc, "UPDATE incidents SET description = '' WHERE id = ?1", &id).await;

        assert_eq!(
            svc.get_incident(&id).await.unwrap().description.as_deref(),
            Some("")
        );
        let err = svc.audit().verify_or_fail(&id).await.unwrap_err();
        assert!(err.is_integrity_violation(), "got {err:?}");
        assert_eq!(tamper_alerts(&svc, &id).await, 1);
    }
}
