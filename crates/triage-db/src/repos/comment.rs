//! Comment repository.

use triage_core::entities::Comment;
use triage_core::enums::TimelineEntryType;
use triage_core::errors::CoreError;
use triage_core::ids::PREFIX_COMMENT;
use triage_core::payload::COLLECTION_COMMENTS;

use crate::error::DatabaseError;
use crate::helpers::{DateReader, fmt_datetime, get_opt_string, non_blank};
use crate::repos::timeline::insert_entry;
use crate::service::IncidentService;

const SELECT_COLS: &str = "id, incident_id, author_id, body, created_at";

fn row_to_comment(row: &libsql::Row, dates: &mut DateReader) -> Result<Comment, DatabaseError> {
    let id: String = row.get(0)?;
    Ok(Comment {
        incident_id: row.get(1)?,
        author_id: get_opt_string(row, 2)?,
        body: row.get(3)?,
        created_at: dates.required(row, 4, (COLLECTION_COMMENTS, &id), "created_at")?,
        id,
    })
}

pub(crate) async fn fetch_comments(
    conn: &libsql::Connection,
    incident_id: &str,
    dates: &mut DateReader,
) -> Result<Vec<Comment>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {SELECT_COLS} FROM comments WHERE incident_id = ?1 ORDER BY created_at, rowid"
            ),
            [incident_id],
        )
        .await?;

    let mut comments = Vec::new();
    while let Some(row) = rows.next().await? {
        comments.push(row_to_comment(&row, dates)?);
    }
    Ok(comments)
}

impl IncidentService {
    /// Add a comment to an incident.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty body, a not-found error for a
    /// missing incident, or `DatabaseError` if the INSERT fails.
    pub async fn add_comment(
        &self,
        author_id: Option<&str>,
        incident_id: &str,
        body: &str,
    ) -> Result<Comment, DatabaseError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CoreError::Validation("comment body must not be empty".to_string()).into());
        }

        let author_id = non_blank(author_id);
        let entry = self
            .new_timeline_entry(
                incident_id,
                TimelineEntryType::Comment,
                "Comment added",
                author_id.as_deref(),
            )
            .await?;
        let comment = Comment {
            id: self.db().generate_id(PREFIX_COMMENT).await?,
            incident_id: incident_id.to_string(),
            author_id,
            body: body.to_string(),
            created_at: entry.created_at,
        };

        {
            let _guard = self.db().write_lock().await;
            let tx = self.db().conn().transaction().await?;
            self.ensure_incident(&tx, incident_id).await?;
            tx.execute(
                "INSERT INTO comments (id, incident_id, author_id, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    comment.id.as_str(),
                    incident_id,
                    comment.author_id.as_deref(),
                    body,
                    fmt_datetime(comment.created_at)
                ],
            )
            .await?;
            insert_entry(&tx, &entry).await?;
            tx.commit().await?;
        }

        tracing::debug!(incident_id, comment_id = %comment.id, "comment added");
        self.audit().refresh_best_effort(incident_id).await;
        Ok(comment)
    }

    /// Comments on an incident, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_comments(&self, incident_id: &str) -> Result<Vec<Comment>, DatabaseError> {
        fetch_comments(self.db().conn(), incident_id, &mut DateReader::strict()).await
    }
}
