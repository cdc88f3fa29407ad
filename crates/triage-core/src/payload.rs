//! Projection of an incident into its audited payload.
//!
//! The payload covers the incident's business fields and every related
//! collection on the audited surface. Storage bookkeeping is excluded:
//! `updated_at` changes on every row write (including the audit stamp
//! itself), and the stored digest cannot cover itself.
//!
//! The canonicalizer preserves sequence order, so every collection is sorted
//! here by `created_at` with an explicit tie-break (`id`, or the label name
//! for categories and tags).
//!
//! A stored timestamp that does not parse is listed in
//! [`AuditSnapshot::unreadable`] and projected through [`Value::parse_date`],
//! so it canonicalizes as `null` instead of aborting the read.

use schemars::JsonSchema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::canonical::{self, Record, SerializationError, Value};
use crate::entities::{
    Capa, Comment, Incident, IncidentCategory, IncidentTag, SourceLink, TimelineEntry,
};

/// Schema version of the payload layout. Bump when fields are added or
/// removed so old digests are recognisably produced by an older layout.
pub const PAYLOAD_VERSION: i64 = 1;

/// Collection names used to address rows in [`UnreadableTimestamp`].
pub const COLLECTION_INCIDENT: &str = "incident";
pub const COLLECTION_CATEGORIES: &str = "categories";
pub const COLLECTION_TAGS: &str = "tags";
pub const COLLECTION_TIMELINE: &str = "timeline";
pub const COLLECTION_COMMENTS: &str = "comments";
pub const COLLECTION_CAPAS: &str = "capas";
pub const COLLECTION_SOURCE_LINKS: &str = "source_links";

/// A stored timestamp column whose text could not be parsed.
///
/// The entity field read alongside it holds a placeholder (`None`, or the
/// Unix epoch for required columns); the payload uses `raw` instead.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnreadableTimestamp {
    pub collection: String,
    /// Row id, or the label name for categories and tags.
    pub key: String,
    pub field: String,
    pub raw: String,
}

/// An incident together with its audited collections, as read at one point
/// in time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditSnapshot {
    pub incident: Incident,
    pub categories: Vec<IncidentCategory>,
    pub tags: Vec<IncidentTag>,
    pub timeline: Vec<TimelineEntry>,
    pub comments: Vec<Comment>,
    pub capas: Vec<Capa>,
    pub source_links: Vec<SourceLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreadable: Vec<UnreadableTimestamp>,
}

impl AuditSnapshot {
    /// A snapshot with no related rows.
    #[must_use]
    pub const fn bare(incident: Incident) -> Self {
        Self {
            incident,
            categories: Vec::new(),
            tags: Vec::new(),
            timeline: Vec::new(),
            comments: Vec::new(),
            capas: Vec::new(),
            source_links: Vec::new(),
            unreadable: Vec::new(),
        }
    }

    /// Payload value of one timestamp column: the parsed value, or the raw
    /// text re-read with [`Value::parse_date`] when it was unreadable.
    fn timestamp(&self, collection: &str, key: &str, field: &str, parsed: Option<DateTime<Utc>>) -> Value {
        self.unreadable
            .iter()
            .find(|u| u.collection == collection && u.key == key && u.field == field)
            .map_or(Value::Date(parsed), |u| Value::parse_date(&u.raw))
    }
}

/// Build the payload value for `snapshot`.
#[must_use]
pub fn build_payload(snapshot: &AuditSnapshot) -> Value {
    let mut categories: Vec<&IncidentCategory> = snapshot.categories.iter().collect();
    categories.sort_by(|a, b| (a.created_at, &a.category).cmp(&(b.created_at, &b.category)));

    let mut tags: Vec<&IncidentTag> = snapshot.tags.iter().collect();
    tags.sort_by(|a, b| (a.created_at, &a.tag).cmp(&(b.created_at, &b.tag)));

    let mut timeline: Vec<&TimelineEntry> = snapshot.timeline.iter().collect();
    timeline.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

    let mut comments: Vec<&Comment> = snapshot.comments.iter().collect();
    comments.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

    let mut capas: Vec<&Capa> = snapshot.capas.iter().collect();
    capas.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

    let mut source_links: Vec<&SourceLink> = snapshot.source_links.iter().collect();
    source_links.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

    Value::record(
        Record::new()
            .with("v", PAYLOAD_VERSION)
            .with("incident", incident_record(snapshot))
            .with(
                "categories",
                Value::list(categories.into_iter().map(|c| {
                    Value::record(
                        Record::new()
                            .with("category", c.category.as_str())
                            .with(
                                "created_at",
                                snapshot.timestamp(COLLECTION_CATEGORIES, &c.category, "created_at", Some(c.created_at)),
                            ),
                    )
                })),
            )
            .with(
                "tags",
                Value::list(tags.into_iter().map(|t| {
                    Value::record(
                        Record::new()
                            .with("tag", t.tag.as_str())
                            .with(
                                "created_at",
                                snapshot.timestamp(COLLECTION_TAGS, &t.tag, "created_at", Some(t.created_at)),
                            ),
                    )
                })),
            )
            .with(
                "timeline",
                Value::list(timeline.into_iter().map(|e| {
                    Value::record(
                        Record::new()
                            .with("id", e.id.as_str())
                            .with("entry_type", e.entry_type.as_str())
                            .with("message", e.message.as_str())
                            .with("actor_id", e.actor_id.as_deref())
                            .with(
                                "created_at",
                                snapshot.timestamp(COLLECTION_TIMELINE, &e.id, "created_at", Some(e.created_at)),
                            ),
                    )
                })),
            )
            .with(
                "comments",
                Value::list(comments.into_iter().map(|c| {
                    Value::record(
                        Record::new()
                            .with("id", c.id.as_str())
                            .with("author_id", c.author_id.as_deref())
                            .with("body", c.body.as_str())
                            .with(
                                "created_at",
                                snapshot.timestamp(COLLECTION_COMMENTS, &c.id, "created_at", Some(c.created_at)),
                            ),
                    )
                })),
            )
            .with(
                "capas",
                Value::list(capas.into_iter().map(|c| {
                    Value::record(
                        Record::new()
                            .with("id", c.id.as_str())
                            .with("title", c.title.as_str())
                            .with("description", c.description.as_deref())
                            .with("owner_id", c.owner_id.as_deref())
                            .with("status", c.status.as_str())
                            .with("due_at", snapshot.timestamp(COLLECTION_CAPAS, &c.id, "due_at", c.due_at))
                            .with(
                                "created_at",
                                snapshot.timestamp(COLLECTION_CAPAS, &c.id, "created_at", Some(c.created_at)),
                            ),
                    )
                })),
            )
            .with(
                "source_links",
                Value::list(source_links.into_iter().map(|l| {
                    Value::record(
                        Record::new()
                            .with("id", l.id.as_str())
                            .with("source", l.source.as_str())
                            .with("external_id", l.external_id.as_str())
                            .with("url", l.url.as_deref())
                            .with(
                                "created_at",
                                snapshot.timestamp(COLLECTION_SOURCE_LINKS, &l.id, "created_at", Some(l.created_at)),
                            ),
                    )
                })),
            ),
    )
}

fn incident_record(snapshot: &AuditSnapshot) -> Record {
    let incident = &snapshot.incident;
    let at = |field: &str, parsed: Option<DateTime<Utc>>| {
        snapshot.timestamp(COLLECTION_INCIDENT, &incident.id, field, parsed)
    };
    Record::new()
        .with("id", incident.id.as_str())
        .with("title", incident.title.as_str())
        .with("description", incident.description.as_deref())
        .with("status", incident.status.as_str())
        .with("severity", incident.severity.as_str())
        .with("reporter_id", incident.reporter_id.as_deref())
        .with("assignee_id", incident.assignee_id.as_deref())
        .with("team_id", incident.team_id.as_deref())
        .with("service_id", incident.service_id.as_deref())
        .with("triaged_at", at("triaged_at", incident.triaged_at))
        .with("in_progress_at", at("in_progress_at", incident.in_progress_at))
        .with("resolved_at", at("resolved_at", incident.resolved_at))
        .with("closed_at", at("closed_at", incident.closed_at))
        .with("created_at", at("created_at", Some(incident.created_at)))
}

/// Canonical text of the payload for `snapshot`.
///
/// # Errors
///
/// Propagates [`SerializationError`] from the canonicalizer. The payload
/// shape built here is acyclic, so this only fails on encoder errors.
pub fn canonical_payload(snapshot: &AuditSnapshot) -> Result<String, SerializationError> {
    canonical::canonicalize(&build_payload(snapshot))
}
