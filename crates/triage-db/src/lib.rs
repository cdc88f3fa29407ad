//! # triage-db
//!
//! libSQL persistence for Triage incidents and the audit layer bound to them.
//!
//! Handles all relational state: incidents, timeline entries, comments,
//! corrective actions, categories, tags, and source links. Every mutation
//! commits first and then refreshes the incident's integrity digest through
//! [`audit::AuditCoordinator`].
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29) in local mode.

pub mod audit;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod updates;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use error::DatabaseError;
use libsql::Builder;
use tokio::sync::{Mutex, MutexGuard};

/// Central database handle for all Triage state.
///
/// Cheap to clone: clones share the database, the connection, and the write
/// lock. The lock serializes transactions and audit stamp read-modify-write
/// cycles on the shared connection.
#[derive(Clone)]
pub struct TriageDb {
    #[allow(dead_code)]
    db: Arc<libsql::Database>,
    conn: libsql::Connection,
    write_lock: Arc<Mutex<()>>,
}

impl TriageDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let triage_db = Self {
            db: Arc::new(db),
            conn,
            write_lock: Arc::new(Mutex::new(())),
        };
        triage_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(triage_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Take the write lock. Hold it across a transaction so no other task's
    /// statements land inside it.
    pub async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"inc-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> TriageDb {
        TriageDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;

        let tables = [
            "incidents",
            "timeline_entries",
            "comments",
            "capas",
            "incident_categories",
            "incident_tags",
            "source_links",
        ];
        for table in &tables {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap();
            assert!(row.is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("inc").await.unwrap();
        assert!(id.starts_with("inc-"), "ID should start with 'inc-': {id}");
        assert_eq!(
            id.len(),
            12,
            "ID should be 12 chars (3 prefix + 1 dash + 8 hex): {id}"
        );

        let hex_part = &id[4..];
        assert!(
            hex_part.chars().all(|c| c.is_ascii_hexdigit()),
            "Random part should be hex: {hex_part}"
        );
    }

    #[tokio::test]
    async fn generate_id_all_prefixes() {
        let db = test_db().await;
        for prefix in triage_core::ids::ALL_PREFIXES {
            let id = db.generate_id(prefix).await.unwrap();
            assert!(id.starts_with(&format!("{prefix}-")));
        }
    }

    #[tokio::test]
    async fn generate_id_uniqueness() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let id = db.generate_id("tst").await.unwrap();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {id}");
        }
    }

    #[tokio::test]
    async fn idempotent_migrations() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn status_check_constraint_rejects_unknown_values() {
        let db = test_db().await;
        let result = db
            .conn()
            .execute(
                "INSERT INTO incidents (id, title, status, severity, created_at, updated_at)
                 VALUES ('inc-x', 't', 'exploded', 'sev1', '2026-01-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z')",
                (),
            )
            .await;
        assert!(result.is_err(), "unknown status should be rejected");
    }

    #[tokio::test]
    async fn deleting_incident_cascades_to_children() {
        let db = test_db().await;
        db.conn()
            .execute(
                "INSERT INTO incidents (id, title, severity, created_at, updated_at)
                 VALUES ('inc-1', 't', 'sev2', '2026-01-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z')",
                (),
            )
            .await
            .unwrap();
        db.conn()
            .execute(
                "INSERT INTO comments (id, incident_id, body, created_at)
                 VALUES ('cmt-1', 'inc-1', 'hi', '2026-01-01T00:00:00.000Z')",
                (),
            )
            .await
            .unwrap();
        db.conn()
            .execute("DELETE FROM incidents WHERE id = 'inc-1'", ())
            .await
            .unwrap();

        let mut rows = db
            .conn()
            .query("SELECT COUNT(*) FROM comments", ())
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 0);
    }
}
