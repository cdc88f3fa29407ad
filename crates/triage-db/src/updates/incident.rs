//! Incident update builder.

use serde::Serialize;
use triage_core::enums::Severity;

/// Field edits for an incident. Status is not here: it only changes through
/// a validated transition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IncidentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<Option<String>>,
}

impl IncidentUpdate {
    /// Names of the fields this update sets, in column order.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.severity.is_some() {
            fields.push("severity");
        }
        if self.assignee_id.is_some() {
            fields.push("assignee_id");
        }
        if self.team_id.is_some() {
            fields.push("team_id");
        }
        if self.service_id.is_some() {
            fields.push("service_id");
        }
        fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }
}

#[derive(Default)]
pub struct IncidentUpdateBuilder(IncidentUpdate);

impl IncidentUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(IncidentUpdate::default())
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.0.description = Some(description);
        self
    }

    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.0.severity = Some(severity);
        self
    }

    #[must_use]
    pub fn assignee_id(mut self, assignee_id: Option<String>) -> Self {
        self.0.assignee_id = Some(assignee_id);
        self
    }

    #[must_use]
    pub fn team_id(mut self, team_id: Option<String>) -> Self {
        self.0.team_id = Some(team_id);
        self
    }

    #[must_use]
    pub fn service_id(mut self, service_id: Option<String>) -> Self {
        self.0.service_id = Some(service_id);
        self
    }

    #[must_use]
    pub fn build(self) -> IncidentUpdate {
        self.0
    }
}
