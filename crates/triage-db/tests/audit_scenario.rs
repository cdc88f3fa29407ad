//! End-to-end walk through the audit layer: create, comment, rejected and
//! accepted transitions, out-of-band tampering across every audited table,
//! and the disabled mode.

use pretty_assertions::assert_eq;
use rstest::rstest;
use triage_core::enums::{IncidentStatus, Severity, TimelineEntryType};
use triage_core::integrity::AuditSecret;
use triage_db::audit::VerifyOutcome;
use triage_db::error::DatabaseError;
use triage_db::repos::capa::NewCapa;
use triage_db::repos::incident::NewIncident;
use triage_db::service::IncidentService;

async fn service(secret: Option<&str>) -> IncidentService {
    IncidentService::new_local(":memory:", secret.and_then(AuditSecret::new))
        .await
        .unwrap()
}

async fn stored_hash(svc: &IncidentService, id: &str) -> Option<String> {
    svc.get_incident(id).await.unwrap().audit_hash
}

#[tokio::test]
async fn full_scenario() {
    let svc = service(Some("scenario-secret")).await;

    // 1. Create: NEW, stamped, verifies.
    let inc = svc
        .create_incident(Some("usr-1"), &NewIncident::new("DB down", Severity::Sev1))
        .await
        .unwrap();
    assert_eq!(inc.status, IncidentStatus::New);
    let h0 = inc.audit_hash.clone().expect("H0 stored on create");
    assert!(matches!(
        svc.audit().verify_or_fail(&inc.id).await.unwrap(),
        VerifyOutcome::Verified(ref s) if s.hash == h0
    ));

    // 2. Comment: digest moves.
    svc.add_comment(Some("usr-1"), &inc.id, "fixed").await.unwrap();
    let h1 = stored_hash(&svc, &inc.id).await.unwrap();
    assert_ne!(h1, h0);

    // 3. NEW -> CLOSED is rejected and nothing moves.
    let err = svc
        .transition_incident(Some("usr-1"), &inc.id, IncidentStatus::Closed, None)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(stored_hash(&svc, &inc.id).await.unwrap(), h1);
    assert_eq!(
        svc.get_incident(&inc.id).await.unwrap().status,
        IncidentStatus::New
    );

    // 4. Lifecycle with first-write-only milestones.
    let triaged = svc
        .transition_incident(Some("usr-1"), &inc.id, IncidentStatus::Triaged, None)
        .await
        .unwrap();
    let t1 = triaged.triaged_at.expect("triaged_at stamped");
    let working = svc
        .transition_incident(Some("usr-1"), &inc.id, IncidentStatus::InProgress, None)
        .await
        .unwrap();
    let t2 = working.in_progress_at.expect("in_progress_at stamped");
    svc.transition_incident(Some("usr-1"), &inc.id, IncidentStatus::OnHold, None)
        .await
        .unwrap();
    let resumed = svc
        .transition_incident(Some("usr-1"), &inc.id, IncidentStatus::InProgress, Some("vendor replied"))
        .await
        .unwrap();
    assert_eq!(resumed.in_progress_at, Some(t2));
    assert_eq!(resumed.triaged_at, Some(t1));
    assert!(matches!(
        svc.audit().verify_or_fail(&inc.id).await.unwrap(),
        VerifyOutcome::Verified(_)
    ));

    // 5. Out-of-band edit: fail closed, alert appended.
    svc.db()
        .conn()
        .execute(
            "UPDATE incidents SET title = 'All good' WHERE id = ?1",
            [inc.id.as_str()],
        )
        .await
        .unwrap();
    let err = svc.audit().verify_or_fail(&inc.id).await.unwrap_err();
    assert!(matches!(err, DatabaseError::IntegrityViolation { .. }));
    let alerts = svc
        .list_timeline(&inc.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.entry_type == TimelineEntryType::TamperAlert)
        .count();
    assert_eq!(alerts, 1);
    assert!(svc.export_incident(&inc.id).await.unwrap_err().is_integrity_violation());
}

#[tokio::test]
async fn disabled_mode_never_stamps_or_raises() {
    let svc = service(None).await;
    let inc = svc
        .create_incident(None, &NewIncident::new("DB down", Severity::Sev1))
        .await
        .unwrap();
    svc.add_comment(None, &inc.id, "fixed").await.unwrap();

    assert_eq!(svc.audit().refresh_hash(&inc.id).await.unwrap(), None);
    assert_eq!(stored_hash(&svc, &inc.id).await, None);

    svc.db()
        .conn()
        .execute(
            "UPDATE incidents SET title = 'edited' WHERE id = ?1",
            [inc.id.as_str()],
        )
        .await
        .unwrap();
    assert_eq!(
        svc.audit().verify_or_fail(&inc.id).await.unwrap(),
        VerifyOutcome::Disabled
    );
    let export = svc.export_incident(&inc.id).await.unwrap();
    assert_eq!(export.audit, None);
}

#[tokio::test]
async fn enabling_later_backfills_on_first_verify() {
    let mut svc = service(None).await;
    let inc = svc
        .create_incident(None, &NewIncident::new("Queue backlog", Severity::Sev3))
        .await
        .unwrap();
    assert_eq!(inc.audit_hash, None);

    svc.set_audit_secret(AuditSecret::new("late-secret"));
    let outcome = svc.audit().verify_or_fail(&inc.id).await.unwrap();
    let VerifyOutcome::Backfilled(stamp) = outcome else {
        panic!("expected Backfilled, got {outcome:?}");
    };
    assert_eq!(stored_hash(&svc, &inc.id).await, Some(stamp.hash));
}

#[tokio::test]
async fn file_backed_database_persists_digest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triage.db");
    let path = path.to_str().unwrap();

    let id = {
        let svc = IncidentService::new_local(path, AuditSecret::new("disk-secret"))
            .await
            .unwrap();
        svc.create_incident(None, &NewIncident::new("Disk full", Severity::Sev2))
            .await
            .unwrap()
            .id
    };

    let reopened = IncidentService::new_local(path, AuditSecret::new("disk-secret"))
        .await
        .unwrap();
    assert!(matches!(
        reopened.audit().verify_or_fail(&id).await.unwrap(),
        VerifyOutcome::Verified(_)
    ));
}

async fn tamper_alerts(svc: &IncidentService, id: &str) -> usize {
    svc.list_timeline(id)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.entry_type == TimelineEntryType::TamperAlert)
        .count()
}

/// An incident with one row in every audited collection, verified clean.
async fn fully_populated(svc: &IncidentService) -> String {
    let id = svc
        .create_incident(Some("usr-1"), &NewIncident::new("DB down", Severity::Sev1))
        .await
        .unwrap()
        .id;
    svc.add_comment(Some("usr-1"), &id, "failover started").await.unwrap();
    svc.add_capa(
        Some("usr-1"),
        &id,
        &NewCapa {
            title: "Add replica health check".into(),
            ..NewCapa::default()
        },
    )
    .await
    .unwrap();
    svc.add_tag(Some("usr-1"), &id, "database").await.unwrap();
    svc.add_category(Some("usr-1"), &id, "availability").await.unwrap();
    svc.link_source(
        Some("usr-1"),
        &id,
        "pagerduty",
        "PD-123",
        Some("https://example.pagerduty.com/incidents/PD-123"),
    )
    .await
    .unwrap();
    svc.transition_incident(Some("usr-1"), &id, IncidentStatus::Triaged, None)
        .await
        .unwrap();
    assert!(matches!(
        svc.audit().verify_or_fail(&id).await.unwrap(),
        VerifyOutcome::Verified(_)
    ));
    id
}

#[rstest]
#[case::incident_title("UPDATE incidents SET title = 'All good' WHERE id = ?1")]
#[case::incident_severity("UPDATE incidents SET severity = 'sev4' WHERE id = ?1")]
#[case::incident_status("UPDATE incidents SET status = 'closed' WHERE id = ?1")]
#[case::incident_description_null_to_empty("UPDATE incidents SET description = '' WHERE id = ?1")]
#[case::incident_assignee("UPDATE incidents SET assignee_id = 'usr-9' WHERE id = ?1")]
#[case::incident_milestone_garbage("UPDATE incidents SET triaged_at = 'garbage' WHERE id = ?1")]
#[case::incident_milestone_cleared("UPDATE incidents SET triaged_at = NULL WHERE id = ?1")]
#[case::incident_created_at("UPDATE incidents SET created_at = '2020-01-01T00:00:00.000Z' WHERE id = ?1")]
#[case::comment_body("UPDATE comments SET body = 'nothing to see' WHERE incident_id = ?1")]
#[case::comment_author("UPDATE comments SET author_id = NULL WHERE incident_id = ?1")]
#[case::comment_created_at_garbage("UPDATE comments SET created_at = 'garbage' WHERE incident_id = ?1")]
#[case::comment_deleted("DELETE FROM comments WHERE incident_id = ?1")]
#[case::capa_title("UPDATE capas SET title = 'Nothing to do' WHERE incident_id = ?1")]
#[case::capa_status("UPDATE capas SET status = 'done' WHERE incident_id = ?1")]
#[case::capa_owner_empty("UPDATE capas SET owner_id = '' WHERE incident_id = ?1")]
#[case::capa_due_at("UPDATE capas SET due_at = '2031-01-01T00:00:00.000Z' WHERE incident_id = ?1")]
#[case::tag_renamed("UPDATE incident_tags SET tag = 'benign' WHERE incident_id = ?1")]
#[case::tag_deleted("DELETE FROM incident_tags WHERE incident_id = ?1")]
#[case::category_renamed("UPDATE incident_categories SET category = 'other' WHERE incident_id = ?1")]
#[case::category_created_at_garbage(
    "UPDATE incident_categories SET created_at = 'garbage' WHERE incident_id = ?1"
)]
#[case::source_external_id("UPDATE source_links SET external_id = 'PD-999' WHERE incident_id = ?1")]
#[case::source_url_cleared("UPDATE source_links SET url = NULL WHERE incident_id = ?1")]
#[case::timeline_message(
    "UPDATE timeline_entries SET message = 'nothing happened' WHERE incident_id = ?1 AND entry_type = 'comment'"
)]
#[case::timeline_actor(
    "UPDATE timeline_entries SET actor_id = 'usr-9' WHERE incident_id = ?1 AND entry_type = 'created'"
)]
#[case::timeline_deleted(
    "DELETE FROM timeline_entries WHERE incident_id = ?1 AND entry_type = 'status_change'"
)]
#[tokio::test]
async fn out_of_band_edit_fails_closed(#[case] sql: &str) {
    let svc = service(Some("scenario-secret")).await;
    let id = fully_populated(&svc).await;
    assert_eq!(tamper_alerts(&svc, &id).await, 0);

    svc.db().conn().execute(sql, [id.as_str()]).await.unwrap();

    let err = svc.audit().verify_or_fail(&id).await.unwrap_err();
    assert!(err.is_integrity_violation(), "{sql}: got {err:?}");
    assert_eq!(tamper_alerts(&svc, &id).await, 1, "{sql}");
}
