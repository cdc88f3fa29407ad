//! Timeline repository: the incident's append-only history.
//!
//! Entries are written inside the transaction of the mutation they describe.
//! [`IncidentService::append_timeline`] is the standalone append: it does not
//! refresh the audit digest, so the tamper alert path can record itself
//! without re-stamping.

use triage_core::entities::TimelineEntry;
use triage_core::enums::TimelineEntryType;
use triage_core::ids::PREFIX_TIMELINE;
use triage_core::payload::COLLECTION_TIMELINE;

use crate::error::DatabaseError;
use crate::helpers::{DateReader, fmt_datetime, get_opt_string, non_blank, now, parse_enum};
use crate::service::IncidentService;

const SELECT_COLS: &str = "id, incident_id, entry_type, message, actor_id, created_at";

fn row_to_entry(row: &libsql::Row, dates: &mut DateReader) -> Result<TimelineEntry, DatabaseError> {
    let id: String = row.get(0)?;
    Ok(TimelineEntry {
        incident_id: row.get(1)?,
        entry_type: parse_enum(&row.get::<String>(2)?)?,
        message: row.get(3)?,
        actor_id: get_opt_string(row, 4)?,
        created_at: dates.required(row, 5, (COLLECTION_TIMELINE, &id), "created_at")?,
        id,
    })
}

pub(crate) async fn insert_entry(
    conn: &libsql::Connection,
    entry: &TimelineEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO timeline_entries (id, incident_id, entry_type, message, actor_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        libsql::params![
            entry.id.as_str(),
            entry.incident_id.as_str(),
            entry.entry_type.as_str(),
            entry.message.as_str(),
            entry.actor_id.as_deref(),
            fmt_datetime(entry.created_at)
        ],
    )
    .await?;
    Ok(())
}

/// Entries oldest first. Insertion order breaks ties within one millisecond;
/// the audit payload applies its own ordering.
pub(crate) async fn fetch_entries(
    conn: &libsql::Connection,
    incident_id: &str,
    dates: &mut DateReader,
) -> Result<Vec<TimelineEntry>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {SELECT_COLS} FROM timeline_entries WHERE incident_id = ?1 ORDER BY created_at, rowid"
            ),
            [incident_id],
        )
        .await?;

    let mut entries = Vec::new();
    while let Some(row) = rows.next().await? {
        entries.push(row_to_entry(&row, dates)?);
    }
    Ok(entries)
}

impl IncidentService {
    /// Build an unsaved timeline entry with a fresh ID.
    pub(crate) async fn new_timeline_entry(
        &self,
        incident_id: &str,
        entry_type: TimelineEntryType,
        message: impl Into<String>,
        actor_id: Option<&str>,
    ) -> Result<TimelineEntry, DatabaseError> {
        Ok(TimelineEntry {
            id: self.db().generate_id(PREFIX_TIMELINE).await?,
            incident_id: incident_id.to_string(),
            entry_type,
            message: message.into(),
            actor_id: non_blank(actor_id),
            created_at: now(),
        })
    }

    /// Append a timeline entry without refreshing the audit digest.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the incident does not exist, or
    /// `DatabaseError` if the INSERT fails.
    pub async fn append_timeline(
        &self,
        incident_id: &str,
        entry_type: TimelineEntryType,
        message: &str,
        actor_id: Option<&str>,
    ) -> Result<TimelineEntry, DatabaseError> {
        let entry = self
            .new_timeline_entry(incident_id, entry_type, message, actor_id)
            .await?;

        let _guard = self.db().write_lock().await;
        self.ensure_incident(self.db().conn(), incident_id).await?;
        insert_entry(self.db().conn(), &entry).await?;
        Ok(entry)
    }

    /// Append a free-form note and refresh the digest.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty message, or any error from
    /// [`Self::append_timeline`].
    pub async fn add_note(
        &self,
        actor_id: Option<&str>,
        incident_id: &str,
        message: &str,
    ) -> Result<TimelineEntry, DatabaseError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(triage_core::errors::CoreError::Validation(
                "note must not be empty".to_string(),
            )
            .into());
        }
        let entry = self
            .append_timeline(incident_id, TimelineEntryType::Note, message, actor_id)
            .await?;
        self.audit().refresh_best_effort(incident_id).await;
        Ok(entry)
    }

    /// Timeline of an incident, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_timeline(&self, incident_id: &str) -> Result<Vec<TimelineEntry>, DatabaseError> {
        fetch_entries(self.db().conn(), incident_id, &mut DateReader::strict()).await
    }
}
