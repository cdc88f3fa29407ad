//! Entity structs for the Triage domain.
//!
//! Each entity maps to a table in the libSQL database. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip and schema
//! validation.

mod capa;
mod comment;
mod incident;
mod label;
mod source_link;
mod timeline;

pub use capa::Capa;
pub use comment::Comment;
pub use incident::Incident;
pub use label::{IncidentCategory, IncidentTag};
pub use source_link::SourceLink;
pub use timeline::TimelineEntry;
