//! Category and tag repository.
//!
//! Both are plain `(incident_id, name)` sets. Adding an existing label or
//! removing an absent one is a no-op that writes nothing.

use triage_core::entities::{IncidentCategory, IncidentTag};
use triage_core::enums::TimelineEntryType;
use triage_core::errors::CoreError;
use triage_core::payload::{COLLECTION_CATEGORIES, COLLECTION_TAGS};

use crate::error::DatabaseError;
use crate::helpers::{DateReader, fmt_datetime};
use crate::repos::timeline::insert_entry;
use crate::service::IncidentService;

/// Which label table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelKind {
    Category,
    Tag,
}

impl LabelKind {
    const fn table(self) -> &'static str {
        match self {
            Self::Category => "incident_categories",
            Self::Tag => "incident_tags",
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Tag => "tag",
        }
    }

    const fn noun(self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Tag => "Tag",
        }
    }
}

pub(crate) async fn fetch_categories(
    conn: &libsql::Connection,
    incident_id: &str,
    dates: &mut DateReader,
) -> Result<Vec<IncidentCategory>, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT incident_id, category, created_at FROM incident_categories
             WHERE incident_id = ?1 ORDER BY created_at, category",
            [incident_id],
        )
        .await?;
    let mut categories = Vec::new();
    while let Some(row) = rows.next().await? {
        let category: String = row.get(1)?;
        categories.push(IncidentCategory {
            incident_id: row.get(0)?,
            created_at: dates.required(&row, 2, (COLLECTION_CATEGORIES, &category), "created_at")?,
            category,
        });
    }
    Ok(categories)
}

pub(crate) async fn fetch_tags(
    conn: &libsql::Connection,
    incident_id: &str,
    dates: &mut DateReader,
) -> Result<Vec<IncidentTag>, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT incident_id, tag, created_at FROM incident_tags
             WHERE incident_id = ?1 ORDER BY created_at, tag",
            [incident_id],
        )
        .await?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next().await? {
        let tag: String = row.get(1)?;
        tags.push(IncidentTag {
            incident_id: row.get(0)?,
            created_at: dates.required(&row, 2, (COLLECTION_TAGS, &tag), "created_at")?,
            tag,
        });
    }
    Ok(tags)
}

fn normalize(kind: LabelKind, name: &str) -> Result<String, DatabaseError> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(CoreError::Validation(format!(
            "{} name must not be empty",
            kind.column()
        ))
        .into());
    }
    Ok(name)
}

impl IncidentService {
    async fn add_label(
        &self,
        kind: LabelKind,
        actor_id: Option<&str>,
        incident_id: &str,
        name: &str,
    ) -> Result<bool, DatabaseError> {
        let name = normalize(kind, name)?;
        let entry = self
            .new_timeline_entry(
                incident_id,
                TimelineEntryType::FieldUpdate,
                format!("{} added: {name}", kind.noun()),
                actor_id,
            )
            .await?;

        {
            let _guard = self.db().write_lock().await;
            let tx = self.db().conn().transaction().await?;
            self.ensure_incident(&tx, incident_id).await?;
            let inserted = tx
                .execute(
                    &format!(
                        "INSERT OR IGNORE INTO {} (incident_id, {}, created_at) VALUES (?1, ?2, ?3)",
                        kind.table(),
                        kind.column()
                    ),
                    libsql::params![incident_id, name.as_str(), fmt_datetime(entry.created_at)],
                )
                .await?;
            if inserted == 0 {
                return Ok(false);
            }
            insert_entry(&tx, &entry).await?;
            tx.commit().await?;
        }

        self.audit().refresh_best_effort(incident_id).await;
        Ok(true)
    }

    async fn remove_label(
        &self,
        kind: LabelKind,
        actor_id: Option<&str>,
        incident_id: &str,
        name: &str,
    ) -> Result<bool, DatabaseError> {
        let name = normalize(kind, name)?;
        let entry = self
            .new_timeline_entry(
                incident_id,
                TimelineEntryType::FieldUpdate,
                format!("{} removed: {name}", kind.noun()),
                actor_id,
            )
            .await?;

        {
            let _guard = self.db().write_lock().await;
            let tx = self.db().conn().transaction().await?;
            self.ensure_incident(&tx, incident_id).await?;
            let removed = tx
                .execute(
                    &format!(
                        "DELETE FROM {} WHERE incident_id = ?1 AND {} = ?2",
                        kind.table(),
                        kind.column()
                    ),
                    libsql::params![incident_id, name.as_str()],
                )
                .await?;
            if removed == 0 {
                return Ok(false);
            }
            insert_entry(&tx, &entry).await?;
            tx.commit().await?;
        }

        self.audit().refresh_best_effort(incident_id).await;
        Ok(true)
    }

    /// Add a category. Names are trimmed and lowercased. Returns `false` if
    /// the incident already had it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name, a not-found error for a
    /// missing incident, or `DatabaseError` if the INSERT fails.
    pub async fn add_category(
        &self,
        actor_id: Option<&str>,
        incident_id: &str,
        category: &str,
    ) -> Result<bool, DatabaseError> {
        self.add_label(LabelKind::Category, actor_id, incident_id, category)
            .await
    }

    /// Remove a category. Returns `false` if the incident did not have it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_category`].
    pub async fn remove_category(
        &self,
        actor_id: Option<&str>,
        incident_id: &str,
        category: &str,
    ) -> Result<bool, DatabaseError> {
        self.remove_label(LabelKind::Category, actor_id, incident_id, category)
            .await
    }

    /// Add a tag. Returns `false` if the incident already had it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_category`].
    pub async fn add_tag(
        &self,
        actor_id: Option<&str>,
        incident_id: &str,
        tag: &str,
    ) -> Result<bool, DatabaseError> {
        self.add_label(LabelKind::Tag, actor_id, incident_id, tag).await
    }

    /// Remove a tag. Returns `false` if the incident did not have it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_category`].
    pub async fn remove_tag(
        &self,
        actor_id: Option<&str>,
        incident_id: &str,
        tag: &str,
    ) -> Result<bool, DatabaseError> {
        self.remove_label(LabelKind::Tag, actor_id, incident_id, tag)
            .await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_categories(
        &self,
        incident_id: &str,
    ) -> Result<Vec<IncidentCategory>, DatabaseError> {
        fetch_categories(self.db().conn(), incident_id, &mut DateReader::strict()).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_tags(&self, incident_id: &str) -> Result<Vec<IncidentTag>, DatabaseError> {
        fetch_tags(self.db().conn(), incident_id, &mut DateReader::strict()).await
    }
}
