//! Audit storage: consistent snapshot reads and digest writes.
//!
//! The `pub(crate)` variants assume the caller already holds the write lock;
//! the audit coordinator uses them to keep read and write under one lock.

use chrono::{DateTime, Utc};

use triage_core::payload::AuditSnapshot;

use crate::error::DatabaseError;
use crate::helpers::{DateReader, fmt_datetime};
use crate::repos::capa::fetch_capas;
use crate::repos::comment::fetch_comments;
use crate::repos::incident::fetch_incident;
use crate::repos::label::{fetch_categories, fetch_tags};
use crate::repos::source_link::fetch_links;
use crate::repos::timeline::fetch_entries;
use crate::service::IncidentService;

impl IncidentService {
    /// Read the incident and every audited collection in one read transaction.
    ///
    /// Timestamps are read leniently: stored text that does not parse is
    /// listed in `unreadable` rather than failing the read, so an
    /// out-of-band edit still reaches the digest comparison.
    pub(crate) async fn read_snapshot(&self, incident_id: &str) -> Result<AuditSnapshot, DatabaseError> {
        let mut dates = DateReader::lenient();
        let tx = self.db().conn().transaction().await?;
        let mut snapshot = AuditSnapshot {
            incident: fetch_incident(&tx, incident_id, &mut dates).await?,
            categories: fetch_categories(&tx, incident_id, &mut dates).await?,
            tags: fetch_tags(&tx, incident_id, &mut dates).await?,
            timeline: fetch_entries(&tx, incident_id, &mut dates).await?,
            comments: fetch_comments(&tx, incident_id, &mut dates).await?,
            capas: fetch_capas(&tx, incident_id, &mut dates).await?,
            source_links: fetch_links(&tx, incident_id, &mut dates).await?,
            unreadable: Vec::new(),
        };
        tx.commit().await?;
        snapshot.unreadable = dates.into_unreadable();
        Ok(snapshot)
    }

    /// Persist a digest. `updated_at` moves with it.
    pub(crate) async fn store_audit_hash(
        &self,
        incident_id: &str,
        hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let at = fmt_datetime(at);
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE incidents SET audit_hash = ?1, audit_hash_updated_at = ?2, updated_at = ?2 WHERE id = ?3",
                libsql::params![hash, at.as_str(), incident_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::incident_not_found(incident_id));
        }
        Ok(())
    }

    /// Load an incident together with its audited collections.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the incident does not exist, or
    /// `DatabaseError` if a read fails.
    pub async fn load_audit_snapshot(&self, incident_id: &str) -> Result<AuditSnapshot, DatabaseError> {
        let _guard = self.db().write_lock().await;
        self.read_snapshot(incident_id).await
    }

    /// Write `{audit_hash, audit_hash_updated_at}` onto the incident row.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the incident does not exist, or
    /// `DatabaseError` if the UPDATE fails.
    pub async fn write_audit_hash(
        &self,
        incident_id: &str,
        hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let _guard = self.db().write_lock().await;
        self.store_audit_hash(incident_id, hash, at).await
    }
}
