//! CAPA (corrective and preventive action) repository.

use chrono::{DateTime, Utc};

use triage_core::entities::Capa;
use triage_core::enums::{CapaStatus, TimelineEntryType};
use triage_core::errors::CoreError;
use triage_core::ids::PREFIX_CAPA;
use triage_core::payload::COLLECTION_CAPAS;

use crate::error::DatabaseError;
use crate::helpers::{
    DateReader, fmt_datetime, fmt_optional_datetime, get_opt_string, non_blank, parse_enum,
};
use crate::repos::timeline::insert_entry;
use crate::service::IncidentService;

const SELECT_COLS: &str =
    "id, incident_id, title, description, owner_id, status, due_at, created_at, updated_at";

fn row_to_capa(row: &libsql::Row, dates: &mut DateReader) -> Result<Capa, DatabaseError> {
    let id: String = row.get(0)?;
    let at = (COLLECTION_CAPAS, id.as_str());
    Ok(Capa {
        incident_id: row.get(1)?,
        title: row.get(2)?,
        description: get_opt_string(row, 3)?,
        owner_id: get_opt_string(row, 4)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        due_at: dates.optional(row, 6, at, "due_at")?,
        created_at: dates.required(row, 7, at, "created_at")?,
        updated_at: dates.required(row, 8, at, "updated_at")?,
        id,
    })
}

pub(crate) async fn fetch_capas(
    conn: &libsql::Connection,
    incident_id: &str,
    dates: &mut DateReader,
) -> Result<Vec<Capa>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM capas WHERE incident_id = ?1 ORDER BY created_at, rowid"),
            [incident_id],
        )
        .await?;
    let mut capas = Vec::new();
    while let Some(row) = rows.next().await? {
        capas.push(row_to_capa(&row, dates)?);
    }
    Ok(capas)
}

async fn fetch_capa(conn: &libsql::Connection, capa_id: &str) -> Result<Capa, DatabaseError> {
    let mut rows = conn
        .query(&format!("SELECT {SELECT_COLS} FROM capas WHERE id = ?1"), [capa_id])
        .await?;
    let row = rows.next().await?.ok_or_else(|| {
        DatabaseError::Core(CoreError::NotFound {
            entity_type: "capa".to_string(),
            id: capa_id.to_string(),
        })
    })?;
    row_to_capa(&row, &mut DateReader::strict())
}

/// Fields for a new CAPA.
#[derive(Debug, Clone, Default)]
pub struct NewCapa {
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
}

impl IncidentService {
    /// Raise a CAPA against an incident. New CAPAs start `open`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty title, a not-found error for a
    /// missing incident, or `DatabaseError` if the INSERT fails.
    pub async fn add_capa(
        &self,
        actor_id: Option<&str>,
        incident_id: &str,
        new: &NewCapa,
    ) -> Result<Capa, DatabaseError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(CoreError::Validation("CAPA title must not be empty".to_string()).into());
        }

        let entry = self
            .new_timeline_entry(
                incident_id,
                TimelineEntryType::Capa,
                format!("CAPA added: {title}"),
                actor_id,
            )
            .await?;
        let capa = Capa {
            id: self.db().generate_id(PREFIX_CAPA).await?,
            incident_id: incident_id.to_string(),
            title: title.to_string(),
            description: non_blank(new.description.as_deref()),
            owner_id: non_blank(new.owner_id.as_deref()),
            status: CapaStatus::Open,
            due_at: new.due_at,
            created_at: entry.created_at,
            updated_at: entry.created_at,
        };

        {
            let _guard = self.db().write_lock().await;
            let tx = self.db().conn().transaction().await?;
            self.ensure_incident(&tx, incident_id).await?;
            let created = fmt_datetime(capa.created_at);
            tx.execute(
                "INSERT INTO capas (id, incident_id, title, description, owner_id, status, due_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    capa.id.as_str(),
                    incident_id,
                    capa.title.as_str(),
                    capa.description.as_deref(),
                    capa.owner_id.as_deref(),
                    capa.status.as_str(),
                    fmt_optional_datetime(capa.due_at),
                    created.as_str(),
                    created.as_str()
                ],
            )
            .await?;
            insert_entry(&tx, &entry).await?;
            tx.commit().await?;
        }

        tracing::debug!(incident_id, capa_id = %capa.id, "capa added");
        self.audit().refresh_best_effort(incident_id).await;
        Ok(capa)
    }

    /// Move a CAPA to `status` and refresh the owning incident's digest.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` (wrapped) for a move the CAPA
    /// lifecycle does not allow, a not-found error for a missing CAPA, or
    /// `DatabaseError` if the UPDATE fails.
    pub async fn update_capa_status(
        &self,
        actor_id: Option<&str>,
        capa_id: &str,
        status: CapaStatus,
    ) -> Result<Capa, DatabaseError> {
        let entry_id = self
            .db()
            .generate_id(triage_core::ids::PREFIX_TIMELINE)
            .await?;
        let at = crate::helpers::now();

        let updated = {
            let _guard = self.db().write_lock().await;
            let tx = self.db().conn().transaction().await?;
            let current = fetch_capa(&tx, capa_id).await?;
            if !current.status.can_transition_to(status) {
                return Err(CoreError::InvalidTransition {
                    entity_type: "capa".to_string(),
                    id: capa_id.to_string(),
                    from: current.status.to_string(),
                    to: status.to_string(),
                }
                .into());
            }

            tx.execute(
                "UPDATE capas SET status = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![status.as_str(), fmt_datetime(at), capa_id],
            )
            .await?;
            let entry = triage_core::entities::TimelineEntry {
                id: entry_id,
                incident_id: current.incident_id.clone(),
                entry_type: TimelineEntryType::Capa,
                message: format!(
                    "CAPA {} changed from {} to {}",
                    current.title, current.status, status
                ),
                actor_id: actor_id.map(String::from),
                created_at: at,
            };
            insert_entry(&tx, &entry).await?;
            tx.commit().await?;

            Capa {
                status,
                updated_at: at,
                ..current
            }
        };

        self.audit().refresh_best_effort(&updated.incident_id).await;
        Ok(updated)
    }

    /// CAPAs of an incident, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_capas(&self, incident_id: &str) -> Result<Vec<Capa>, DatabaseError> {
        fetch_capas(self.db().conn(), incident_id, &mut DateReader::strict()).await
    }
}
