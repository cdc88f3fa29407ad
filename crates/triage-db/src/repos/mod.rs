//! Repository modules implementing operations for incidents and their
//! audited collections.
//!
//! Each module adds methods to `IncidentService` via `impl IncidentService` blocks.

pub mod capa;
pub mod comment;
pub mod export;
pub mod incident;
pub mod label;
pub mod snapshot;
pub mod source_link;
pub mod timeline;
