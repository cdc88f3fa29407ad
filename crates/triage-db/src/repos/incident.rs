//! Incident repository: CRUD plus validated status transitions.

use triage_core::entities::Incident;
use triage_core::enums::{IncidentStatus, Severity, TimelineEntryType};
use triage_core::errors::CoreError;
use triage_core::ids::PREFIX_INCIDENT;
use triage_core::lifecycle;
use triage_core::payload::COLLECTION_INCIDENT;

use crate::error::DatabaseError;
use crate::helpers::{DateReader, fmt_datetime, get_opt_string, non_blank, now, parse_enum};
use crate::repos::timeline::insert_entry;
use crate::service::IncidentService;
use crate::updates::incident::IncidentUpdate;

const SELECT_COLS: &str = "id, title, description, status, severity, reporter_id, assignee_id, \
     team_id, service_id, triaged_at, in_progress_at, resolved_at, closed_at, created_at, \
     updated_at, audit_hash, audit_hash_updated_at";

fn row_to_incident(row: &libsql::Row, dates: &mut DateReader) -> Result<Incident, DatabaseError> {
    let id: String = row.get(0)?;
    let at = (COLLECTION_INCIDENT, id.as_str());
    Ok(Incident {
        title: row.get(1)?,
        description: get_opt_string(row, 2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        severity: parse_enum(&row.get::<String>(4)?)?,
        reporter_id: get_opt_string(row, 5)?,
        assignee_id: get_opt_string(row, 6)?,
        team_id: get_opt_string(row, 7)?,
        service_id: get_opt_string(row, 8)?,
        triaged_at: dates.optional(row, 9, at, "triaged_at")?,
        in_progress_at: dates.optional(row, 10, at, "in_progress_at")?,
        resolved_at: dates.optional(row, 11, at, "resolved_at")?,
        closed_at: dates.optional(row, 12, at, "closed_at")?,
        created_at: dates.required(row, 13, at, "created_at")?,
        updated_at: dates.required(row, 14, at, "updated_at")?,
        audit_hash: get_opt_string(row, 15)?,
        audit_hash_updated_at: dates.optional(row, 16, at, "audit_hash_updated_at")?,
        id,
    })
}

pub(crate) async fn fetch_incident(
    conn: &libsql::Connection,
    id: &str,
    dates: &mut DateReader,
) -> Result<Incident, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM incidents WHERE id = ?1"),
            [id],
        )
        .await?;
    let row = rows
        .next()
        .await?
        .ok_or_else(|| DatabaseError::incident_not_found(id))?;
    row_to_incident(&row, dates)
}

/// Fields for a new incident.
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub reporter_id: Option<String>,
    pub assignee_id: Option<String>,
    pub team_id: Option<String>,
    pub service_id: Option<String>,
}

impl NewIncident {
    #[must_use]
    pub fn new(title: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: None,
            severity,
            reporter_id: None,
            assignee_id: None,
            team_id: None,
            service_id: None,
        }
    }
}

/// Filter criteria for incident listings.
#[derive(Debug, Default)]
pub struct IncidentFilter {
    pub status: Option<IncidentStatus>,
    pub severity: Option<Severity>,
    pub limit: Option<u32>,
}

fn require_title(title: &str) -> Result<&str, DatabaseError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::Validation("incident title must not be empty".to_string()).into());
    }
    Ok(title)
}

impl IncidentService {
    /// Fail with not-found unless the incident exists.
    pub(crate) async fn ensure_incident(
        &self,
        conn: &libsql::Connection,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let mut rows = conn
            .query("SELECT 1 FROM incidents WHERE id = ?1", [id])
            .await?;
        if rows.next().await?.is_none() {
            return Err(DatabaseError::incident_not_found(id));
        }
        Ok(())
    }

    /// Create an incident in status `new` and record it on the timeline.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty title, or `DatabaseError` if
    /// the INSERT fails.
    pub async fn create_incident(
        &self,
        actor_id: Option<&str>,
        new: &NewIncident,
    ) -> Result<Incident, DatabaseError> {
        let title = require_title(&new.title)?;
        let id = self.db().generate_id(PREFIX_INCIDENT).await?;
        let entry = self
            .new_timeline_entry(
                &id,
                TimelineEntryType::Created,
                format!("Incident created: {title}"),
                actor_id,
            )
            .await?;
        let created = fmt_datetime(entry.created_at);

        {
            let _guard = self.db().write_lock().await;
            let tx = self.db().conn().transaction().await?;
            tx.execute(
                "INSERT INTO incidents (id, title, description, status, severity, reporter_id, assignee_id, team_id, service_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                libsql::params![
                    id.as_str(),
                    title,
                    non_blank(new.description.as_deref()),
                    IncidentStatus::New.as_str(),
                    new.severity.as_str(),
                    non_blank(new.reporter_id.as_deref()),
                    non_blank(new.assignee_id.as_deref()),
                    non_blank(new.team_id.as_deref()),
                    non_blank(new.service_id.as_deref()),
                    created.as_str(),
                    created.as_str()
                ],
            )
            .await?;
            insert_entry(&tx, &entry).await?;
            tx.commit().await?;
        }

        tracing::info!(incident_id = %id, severity = %new.severity, "incident created");
        self.audit().refresh_best_effort(&id).await;
        self.get_incident(&id).await
    }

    /// # Errors
    ///
    /// Returns a not-found error if no incident has this ID.
    pub async fn get_incident(&self, id: &str) -> Result<Incident, DatabaseError> {
        fetch_incident(self.db().conn(), id, &mut DateReader::strict()).await
    }

    /// Incidents matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(severity) = filter.severity {
            params.push(libsql::Value::Text(severity.as_str().to_string()));
            conditions.push(format!("severity = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM incidents {where_clause} ORDER BY created_at DESC, id LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut dates = DateReader::strict();
        let mut incidents = Vec::new();
        while let Some(row) = rows.next().await? {
            incidents.push(row_to_incident(&row, &mut dates)?);
        }
        Ok(incidents)
    }

    /// Apply field edits and record the changed field names on the timeline.
    ///
    /// An empty update returns the incident unchanged.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the incident does not exist, a validation
    /// error for an empty title, or `DatabaseError` if the UPDATE fails.
    pub async fn update_incident(
        &self,
        actor_id: Option<&str>,
        incident_id: &str,
        update: IncidentUpdate,
    ) -> Result<Incident, DatabaseError> {
        if update.is_empty() {
            return self.get_incident(incident_id).await;
        }

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(ref title) = update.title {
            sets.push(format!("title = ?{idx}"));
            params.push(require_title(title)?.to_string().into());
            idx += 1;
        }
        if let Some(ref description) = update.description {
            sets.push(format!("description = ?{idx}"));
            params.push(non_blank(description.as_deref()).map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }
        if let Some(severity) = update.severity {
            sets.push(format!("severity = ?{idx}"));
            params.push(severity.as_str().into());
            idx += 1;
        }
        if let Some(ref assignee_id) = update.assignee_id {
            sets.push(format!("assignee_id = ?{idx}"));
            params.push(non_blank(assignee_id.as_deref()).map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }
        if let Some(ref team_id) = update.team_id {
            sets.push(format!("team_id = ?{idx}"));
            params.push(non_blank(team_id.as_deref()).map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }
        if let Some(ref service_id) = update.service_id {
            sets.push(format!("service_id = ?{idx}"));
            params.push(non_blank(service_id.as_deref()).map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }

        let entry = self
            .new_timeline_entry(
                incident_id,
                TimelineEntryType::FieldUpdate,
                format!("Updated {}", update.changed_fields().join(", ")),
                actor_id,
            )
            .await?;

        sets.push(format!("updated_at = ?{idx}"));
        params.push(fmt_datetime(entry.created_at).into());
        idx += 1;
        params.push(incident_id.into());
        let sql = format!("UPDATE incidents SET {} WHERE id = ?{idx}", sets.join(", "));

        {
            let _guard = self.db().write_lock().await;
            let tx = self.db().conn().transaction().await?;
            let changed = tx.execute(&sql, libsql::params_from_iter(params)).await?;
            if changed == 0 {
                return Err(DatabaseError::incident_not_found(incident_id));
            }
            insert_entry(&tx, &entry).await?;
            tx.commit().await?;
        }

        tracing::info!(incident_id, fields = ?update.changed_fields(), "incident updated");
        self.audit().refresh_best_effort(incident_id).await;
        self.get_incident(incident_id).await
    }

    /// Move an incident to `to` through the status lifecycle.
    ///
    /// Stamps the target milestone on first entry and appends a
    /// `status_change` timeline entry. A rejected transition leaves the
    /// incident, its timeline, and its digest untouched.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` (wrapped) naming both states,
    /// a not-found error, or `DatabaseError` if the UPDATE fails.
    pub async fn transition_incident(
        &self,
        actor_id: Option<&str>,
        incident_id: &str,
        to: IncidentStatus,
        message: Option<&str>,
    ) -> Result<Incident, DatabaseError> {
        let entry_id = self
            .db()
            .generate_id(triage_core::ids::PREFIX_TIMELINE)
            .await?;

        let plan = {
            let _guard = self.db().write_lock().await;
            let tx = self.db().conn().transaction().await?;
            let current = fetch_incident(&tx, incident_id, &mut DateReader::strict()).await?;
            let plan = lifecycle::plan_transition(&current, to, now())?;
            let at = fmt_datetime(plan.at);

            match plan.stamp {
                Some(milestone) => {
                    tx.execute(
                        &format!(
                            "UPDATE incidents SET status = ?1, {} = ?2, updated_at = ?2 WHERE id = ?3",
                            milestone.field()
                        ),
                        libsql::params![plan.to.as_str(), at.as_str(), incident_id],
                    )
                    .await?;
                }
                None => {
                    tx.execute(
                        "UPDATE incidents SET status = ?1, updated_at = ?2 WHERE id = ?3",
                        libsql::params![plan.to.as_str(), at.as_str(), incident_id],
                    )
                    .await?;
                }
            }

            let entry = triage_core::entities::TimelineEntry {
                id: entry_id,
                incident_id: incident_id.to_string(),
                entry_type: TimelineEntryType::StatusChange,
                message: plan.timeline_message(message),
                actor_id: actor_id.map(String::from),
                created_at: plan.at,
            };
            insert_entry(&tx, &entry).await?;
            tx.commit().await?;
            plan
        };

        tracing::info!(
            incident_id,
            from = %plan.from,
            to = %plan.to,
            stamped = plan.stamp.map(|m| m.field()),
            "incident status changed"
        );
        self.audit().refresh_best_effort(incident_id).await;
        self.get_incident(incident_id).await
    }

    /// Delete an incident and, through cascading keys, its collections.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the incident does not exist.
    pub async fn delete_incident(&self, incident_id: &str) -> Result<(), DatabaseError> {
        let _guard = self.db().write_lock().await;
        let deleted = self
            .db()
            .conn()
            .execute("DELETE FROM incidents WHERE id = ?1", [incident_id])
            .await?;
        if deleted == 0 {
            return Err(DatabaseError::incident_not_found(incident_id));
        }
        tracing::info!(incident_id, "incident deleted");
        Ok(())
    }
}
