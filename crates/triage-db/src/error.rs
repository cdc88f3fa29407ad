//! Database error types for triage-db.

use thiserror::Error;
use triage_core::canonical::SerializationError;
use triage_core::errors::CoreError;
use triage_core::integrity::IntegrityError;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Domain rule rejected the operation (not found, illegal transition).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The audit payload could not be canonicalized.
    #[error("Audit payload serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    /// Signing or verification could not run.
    #[error("Integrity digest failed: {0}")]
    Integrity(#[from] IntegrityError),

    /// The stored digest does not match the one recomputed from current state.
    #[error("Integrity violation on incident {incident_id}: stored digest {stored} does not match computed {computed}")]
    IntegrityViolation {
        incident_id: String,
        stored: String,
        computed: String,
    },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Shorthand for a missing incident.
    #[must_use]
    pub fn incident_not_found(id: &str) -> Self {
        Self::Core(CoreError::NotFound {
            entity_type: "incident".to_string(),
            id: id.to_string(),
        })
    }

    /// Whether the failure is a store-level condition expected to clear on
    /// its own (busy or locked database, dropped connection).
    ///
    /// Everything else (bad row data, serialization, key problems) points at
    /// a bug or a schema mismatch.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::LibSql(e) => {
                let msg = e.to_string().to_lowercase();
                msg.contains("database is locked")
                    || msg.contains("database table is locked")
                    || msg.contains("busy")
                    || msg.contains("unable to acquire shared lock")
                    || msg.contains("connection")
            }
            _ => false,
        }
    }

    /// Whether this is a caller-side validation failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        match self {
            Self::Core(e) => e.is_validation(),
            _ => false,
        }
    }

    /// Whether this is a verify-time digest mismatch.
    #[must_use]
    pub const fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::IntegrityViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_validation() {
        let err = DatabaseError::incident_not_found("inc-1");
        assert!(err.is_validation());
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "Entity not found: incident inc-1");
    }

    #[test]
    fn integrity_violation_is_distinct() {
        let err = DatabaseError::IntegrityViolation {
            incident_id: "inc-1".into(),
            stored: "aa".into(),
            computed: "bb".into(),
        };
        assert!(err.is_integrity_violation());
        assert!(!err.is_validation());
        assert!(!err.is_transient());
    }

    #[test]
    fn serialization_is_not_transient() {
        let err = DatabaseError::Serialization(SerializationError::Circular {
            path: "$.a".into(),
        });
        assert!(!err.is_transient());
    }

    #[test]
    fn invalid_state_is_not_transient() {
        assert!(!DatabaseError::InvalidState("bad row".into()).is_transient());
        assert!(!DatabaseError::Query("bad enum".into()).is_transient());
    }
}
