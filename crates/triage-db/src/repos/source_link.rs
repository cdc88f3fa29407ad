//! Source link repository: references to the external alert or ticket that
//! raised an incident.

use triage_core::entities::SourceLink;
use triage_core::enums::TimelineEntryType;
use triage_core::errors::CoreError;
use triage_core::ids::PREFIX_SOURCE_LINK;
use triage_core::payload::COLLECTION_SOURCE_LINKS;

use crate::error::DatabaseError;
use crate::helpers::{DateReader, fmt_datetime, get_opt_string, non_blank};
use crate::repos::timeline::insert_entry;
use crate::service::IncidentService;

const SELECT_COLS: &str = "id, incident_id, source, external_id, url, created_at";

fn row_to_link(row: &libsql::Row, dates: &mut DateReader) -> Result<SourceLink, DatabaseError> {
    let id: String = row.get(0)?;
    Ok(SourceLink {
        incident_id: row.get(1)?,
        source: row.get(2)?,
        external_id: row.get(3)?,
        url: get_opt_string(row, 4)?,
        created_at: dates.required(row, 5, (COLLECTION_SOURCE_LINKS, &id), "created_at")?,
        id,
    })
}

pub(crate) async fn fetch_links(
    conn: &libsql::Connection,
    incident_id: &str,
    dates: &mut DateReader,
) -> Result<Vec<SourceLink>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {SELECT_COLS} FROM source_links WHERE incident_id = ?1 ORDER BY created_at, rowid"
            ),
            [incident_id],
        )
        .await?;
    let mut links = Vec::new();
    while let Some(row) = rows.next().await? {
        links.push(row_to_link(&row, dates)?);
    }
    Ok(links)
}

impl IncidentService {
    /// Link an external source to an incident.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty fields or a duplicate
    /// `(source, external_id)` pair, a not-found error for a missing
    /// incident, or `DatabaseError` if the INSERT fails.
    pub async fn link_source(
        &self,
        actor_id: Option<&str>,
        incident_id: &str,
        source: &str,
        external_id: &str,
        url: Option<&str>,
    ) -> Result<SourceLink, DatabaseError> {
        let source = source.trim().to_lowercase();
        let external_id = external_id.trim();
        if source.is_empty() || external_id.is_empty() {
            return Err(CoreError::Validation(
                "source and external id must not be empty".to_string(),
            )
            .into());
        }

        let entry = self
            .new_timeline_entry(
                incident_id,
                TimelineEntryType::SourceLinked,
                format!("Linked {source}:{external_id}"),
                actor_id,
            )
            .await?;
        let link = SourceLink {
            id: self.db().generate_id(PREFIX_SOURCE_LINK).await?,
            incident_id: incident_id.to_string(),
            source,
            external_id: external_id.to_string(),
            url: non_blank(url),
            created_at: entry.created_at,
        };

        {
            let _guard = self.db().write_lock().await;
            let tx = self.db().conn().transaction().await?;
            self.ensure_incident(&tx, incident_id).await?;

            let already_linked = {
                let mut existing = tx
                    .query(
                        "SELECT id FROM source_links WHERE incident_id = ?1 AND source = ?2 AND external_id = ?3",
                        libsql::params![incident_id, link.source.as_str(), link.external_id.as_str()],
                    )
                    .await?;
                existing.next().await?.is_some()
            };
            if already_linked {
                return Err(CoreError::Validation(format!(
                    "{}:{} is already linked to {incident_id}",
                    link.source, link.external_id
                ))
                .into());
            }

            tx.execute(
                "INSERT INTO source_links (id, incident_id, source, external_id, url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    link.id.as_str(),
                    incident_id,
                    link.source.as_str(),
                    link.external_id.as_str(),
                    link.url.as_deref(),
                    fmt_datetime(link.created_at)
                ],
            )
            .await?;
            insert_entry(&tx, &entry).await?;
            tx.commit().await?;
        }

        self.audit().refresh_best_effort(incident_id).await;
        Ok(link)
    }

    /// Source links of an incident, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_source_links(&self, incident_id: &str) -> Result<Vec<SourceLink>, DatabaseError> {
        fetch_links(self.db().conn(), incident_id, &mut DateReader::strict()).await
    }
}
