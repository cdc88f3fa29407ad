//! Status enums, severities, and timeline entry kinds for Triage.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! Status enums with state machines provide `allowed_next_states()` to enforce
//! valid transitions at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// IncidentStatus
// ---------------------------------------------------------------------------

/// Status of an incident through its response lifecycle.
///
/// ```text
/// new → triaged → in_progress ⇄ on_hold
///     ↘ in_progress           ↘ resolved → closed → reopened
/// triaged → on_hold | resolved
/// resolved → reopened → in_progress | on_hold | resolved
/// ```
///
/// No state is terminal: `closed` can always be reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    New,
    Triaged,
    InProgress,
    OnHold,
    Resolved,
    Closed,
    Reopened,
}

impl IncidentStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::New,
        Self::Triaged,
        Self::InProgress,
        Self::OnHold,
        Self::Resolved,
        Self::Closed,
        Self::Reopened,
    ];

    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::New => &[Self::Triaged, Self::InProgress],
            Self::Triaged => &[Self::InProgress, Self::OnHold, Self::Resolved],
            Self::InProgress => &[Self::OnHold, Self::Resolved],
            Self::OnHold => &[Self::InProgress, Self::Resolved],
            Self::Resolved => &[Self::Closed, Self::Reopened],
            Self::Closed => &[Self::Reopened],
            Self::Reopened => &[Self::InProgress, Self::OnHold, Self::Resolved],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Triaged => "triaged",
            Self::InProgress => "in_progress",
            Self::OnHold => "on_hold",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Reopened => "reopened",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Milestone
// ---------------------------------------------------------------------------

/// A write-once lifecycle timestamp on an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Triaged,
    InProgress,
    Resolved,
    Closed,
}

impl Milestone {
    /// The milestone stamped when an incident enters `status`, if any.
    #[must_use]
    pub const fn for_status(status: IncidentStatus) -> Option<Self> {
        match status {
            IncidentStatus::Triaged => Some(Self::Triaged),
            IncidentStatus::InProgress => Some(Self::InProgress),
            IncidentStatus::Resolved => Some(Self::Resolved),
            IncidentStatus::Closed => Some(Self::Closed),
            IncidentStatus::New | IncidentStatus::OnHold | IncidentStatus::Reopened => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Triaged => "triaged",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Incident field (and SQL column) holding this milestone.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Triaged => "triaged_at",
            Self::InProgress => "in_progress_at",
            Self::Resolved => "resolved_at",
            Self::Closed => "closed_at",
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Incident severity, `sev1` being the most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Sev1,
    Sev2,
    Sev3,
    Sev4,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sev1 => "sev1",
            Self::Sev2 => "sev2",
            Self::Sev3 => "sev3",
            Self::Sev4 => "sev4",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TimelineEntryType
// ---------------------------------------------------------------------------

/// Kind of entry recorded on an incident's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEntryType {
    Created,
    StatusChange,
    FieldUpdate,
    Comment,
    Capa,
    SourceLinked,
    Note,
    /// Appended when a verify-time digest mismatch is detected.
    TamperAlert,
}

impl TimelineEntryType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChange => "status_change",
            Self::FieldUpdate => "field_update",
            Self::Comment => "comment",
            Self::Capa => "capa",
            Self::SourceLinked => "source_linked",
            Self::Note => "note",
            Self::TamperAlert => "tamper_alert",
        }
    }
}

impl fmt::Display for TimelineEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CapaStatus
// ---------------------------------------------------------------------------

/// Status of a corrective/preventive action.
///
/// ```text
/// open → in_progress → done
///      ↘ cancelled   ↘ cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CapaStatus {
    Open,
    InProgress,
    Done,
    Cancelled,
}

impl CapaStatus {
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Open => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Done, Self::Cancelled],
            Self::Done => &[],
            Self::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CapaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
