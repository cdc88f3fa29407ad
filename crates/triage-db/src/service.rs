//! Service layer orchestrating incident mutations with audit stamping.
//!
//! `IncidentService` wraps `TriageDb` (raw database access) and the optional
//! audit secret. All repo methods are implemented as `impl IncidentService`.

use triage_core::integrity::AuditSecret;

use crate::TriageDb;
use crate::audit::AuditCoordinator;
use crate::error::DatabaseError;

/// Orchestrates incident mutations with integrity digest refresh.
///
/// Every mutation method follows this protocol:
/// 1. Take the write lock and begin a transaction
/// 2. Execute SQL, including the timeline entry describing the change
/// 3. Commit and release the lock
/// 4. Refresh the incident's audit digest (best effort, never fails the mutation)
#[derive(Clone)]
pub struct IncidentService {
    db: TriageDb,
    secret: Option<AuditSecret>,
}

impl IncidentService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    /// * `secret` - Audit signing secret. `None` disables stamping and
    ///   verification entirely.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(
        db_path: &str,
        secret: Option<AuditSecret>,
    ) -> Result<Self, DatabaseError> {
        let db = TriageDb::open_local(db_path).await?;
        Ok(Self::from_db(db, secret))
    }

    /// Create from an existing `TriageDb`.
    #[must_use]
    pub fn from_db(db: TriageDb, secret: Option<AuditSecret>) -> Self {
        if secret.is_none() {
            tracing::debug!("audit secret not configured; integrity digests disabled");
        }
        Self { db, secret }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &TriageDb {
        &self.db
    }

    /// Replace the audit secret. `None` disables the audit layer.
    pub fn set_audit_secret(&mut self, secret: Option<AuditSecret>) {
        self.secret = secret;
    }

    /// The audit coordinator bound to this service.
    #[must_use]
    pub fn audit(&self) -> AuditCoordinator<'_> {
        AuditCoordinator::new(self, self.secret.as_ref())
    }
}
