//! Shared test utilities for triage-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use triage_core::integrity::AuditSecret;

    use crate::TriageDb;
    use crate::service::IncidentService;

    pub const TEST_SECRET: &str = "test-audit-secret";

    /// In-memory service with auditing enabled.
    pub async fn test_service() -> IncidentService {
        let db = TriageDb::open_local(":memory:").await.unwrap();
        IncidentService::from_db(db, AuditSecret::new(TEST_SECRET))
    }

    /// In-memory service with auditing disabled.
    pub async fn test_service_without_audit() -> IncidentService {
        let db = TriageDb::open_local(":memory:").await.unwrap();
        IncidentService::from_db(db, None)
    }

    /// Rewrite an incident's title behind the service's back.
    pub async fn tamper_title(svc: &IncidentService, incident_id: &str, title: &str) {
        svc.db()
            .conn()
            .execute(
                "UPDATE incidents SET title = ?1 WHERE id = ?2",
                libsql::params![title, incident_id],
            )
            .await
            .unwrap();
    }

    /// Run one out-of-band statement with `?1` bound to the incident ID.
    pub async fn tamper(svc: &IncidentService, sql: &str, incident_id: &str) {
        svc.db().conn().execute(sql, [incident_id]).await.unwrap();
    }

    /// Number of `tamper_alert` entries on the incident's timeline.
    pub async fn tamper_alerts(svc: &IncidentService, incident_id: &str) -> usize {
        svc.list_timeline(incident_id)
            .await
            .unwrap()
            .iter()
            .filter(|e| e.entry_type == triage_core::enums::TimelineEntryType::TamperAlert)
            .count()
    }
}
