//! Incident status lifecycle.
//!
//! Validates a requested transition against
//! [`IncidentStatus::allowed_next_states`] and computes its side effects
//! without touching storage: the new status, at most one first-write-only
//! milestone stamp, and the timeline message. The database layer persists a
//! [`TransitionPlan`]; [`TransitionPlan::apply`] mirrors it in memory.

use chrono::{DateTime, Utc};

use crate::entities::Incident;
use crate::enums::{IncidentStatus, Milestone};
use crate::errors::CoreError;

/// Result of validating a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: IncidentStatus,
    pub to: IncidentStatus,
    /// Milestone to stamp. `None` when the target state has no milestone or
    /// the milestone was already captured by an earlier transition.
    pub stamp: Option<Milestone>,
    pub at: DateTime<Utc>,
}

/// Validate `incident.status → to` and plan its side effects.
///
/// # Errors
///
/// Returns [`CoreError::InvalidTransition`] naming both states when the
/// transition is not in the table. Nothing is planned in that case.
pub fn plan_transition(
    incident: &Incident,
    to: IncidentStatus,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, CoreError> {
    let from = incident.status;
    if !from.can_transition_to(to) {
        return Err(CoreError::InvalidTransition {
            entity_type: "incident".to_string(),
            id: incident.id.clone(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    let stamp = Milestone::for_status(to).filter(|m| incident.milestone(*m).is_none());

    Ok(TransitionPlan {
        from,
        to,
        stamp,
        at: now,
    })
}

impl TransitionPlan {
    /// Apply the plan to an in-memory incident.
    pub fn apply(&self, incident: &mut Incident) {
        incident.status = self.to;
        if let Some(milestone) = self.stamp {
            incident.stamp_milestone(milestone, self.at);
        }
    }

    /// Timeline message for the accepted transition.
    #[must_use]
    pub fn timeline_message(&self, note: Option<&str>) -> String {
        let base = format!("Status changed from {} to {}", self.from, self.to);
        match note.map(str::trim).filter(|n| !n.is_empty()) {
            Some(note) => format!("{base}: {note}"),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Severity;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn incident(status: IncidentStatus) -> Incident {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Incident {
            id: "inc-00000001".into(),
            title: "DB down".into(),
            description: None,
            status,
            severity: Severity::Sev1,
            reporter_id: None,
            assignee_id: None,
            team_id: None,
            service_id: None,
            triaged_at: None,
            in_progress_at: None,
            resolved_at: None,
            closed_at: None,
            created_at: created,
            updated_at: created,
            audit_hash: None,
            audit_hash_updated_at: None,
        }
    }

    fn step(inc: &mut Incident, to: IncidentStatus, at: DateTime<Utc>) {
        plan_transition(inc, to, at).unwrap().apply(inc);
    }

    #[test]
    fn new_to_triaged_stamps_triaged_at() {
        let mut inc = incident(IncidentStatus::New);
        let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap();
        let plan = plan_transition(&inc, IncidentStatus::Triaged, t1).unwrap();
        assert_eq!(plan.stamp, Some(Milestone::Triaged));
        plan.apply(&mut inc);
        assert_eq!(inc.status, IncidentStatus::Triaged);
        assert_eq!(inc.triaged_at, Some(t1));
    }

    #[test]
    fn new_to_closed_is_rejected_and_leaves_incident_unchanged() {
        let inc = incident(IncidentStatus::New);
        let before = inc.clone();
        let err = plan_transition(&inc, IncidentStatus::Closed, Utc::now()).unwrap_err();
        match err {
            CoreError::InvalidTransition { from, to, .. } => {
                assert_eq!(from, "new");
                assert_eq!(to, "closed");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
        assert_eq!(inc, before);
    }

    #[test]
    fn reentering_in_progress_keeps_first_stamp() {
        let mut inc = incident(IncidentStatus::New);
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap();
        step(&mut inc, IncidentStatus::Triaged, t0);
        step(&mut inc, IncidentStatus::InProgress, t0 + Duration::minutes(1));
        let t2 = inc.in_progress_at;
        step(&mut inc, IncidentStatus::OnHold, t0 + Duration::minutes(2));

        let plan = plan_transition(&inc, IncidentStatus::InProgress, t0 + Duration::minutes(3)).unwrap();
        assert_eq!(plan.stamp, None);
        plan.apply(&mut inc);

        assert_eq!(inc.status, IncidentStatus::InProgress);
        assert_eq!(inc.in_progress_at, t2);
    }

    #[test]
    fn on_hold_and_reopened_stamp_nothing() {
        let inc = incident(IncidentStatus::InProgress);
        let plan = plan_transition(&inc, IncidentStatus::OnHold, Utc::now()).unwrap();
        assert_eq!(plan.stamp, None);

        let inc = incident(IncidentStatus::Closed);
        let plan = plan_transition(&inc, IncidentStatus::Reopened, Utc::now()).unwrap();
        assert_eq!(plan.stamp, None);
    }

    #[test]
    fn full_lifecycle_through_reopen() {
        let mut inc = incident(IncidentStatus::New);
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap();
        step(&mut inc, IncidentStatus::InProgress, t);
        step(&mut inc, IncidentStatus::Resolved, t + Duration::minutes(1));
        step(&mut inc, IncidentStatus::Closed, t + Duration::minutes(2));
        step(&mut inc, IncidentStatus::Reopened, t + Duration::minutes(3));
        step(&mut inc, IncidentStatus::Resolved, t + Duration::minutes(4));

        assert_eq!(inc.triaged_at, None);
        assert_eq!(inc.in_progress_at, Some(t));
        assert_eq!(inc.resolved_at, Some(t + Duration::minutes(1)));
        assert_eq!(inc.closed_at, Some(t + Duration::minutes(2)));
    }

    #[test]
    fn timeline_message_with_and_without_note() {
        let plan = TransitionPlan {
            from: IncidentStatus::New,
            to: IncidentStatus::Triaged,
            stamp: Some(Milestone::Triaged),
            at: Utc::now(),
        };
        assert_eq!(plan.timeline_message(None), "Status changed from new to triaged");
        assert_eq!(plan.timeline_message(Some("   ")), "Status changed from new to triaged");
        assert_eq!(
            plan.timeline_message(Some("paged db on-call")),
            "Status changed from new to triaged: paged db on-call"
        );
    }
}
