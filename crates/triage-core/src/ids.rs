//! ID prefix constants.
//!
//! IDs are generated by the database layer as `{prefix}-{8 hex chars}`,
//! e.g. `inc-a3f8b2c1`.

pub const PREFIX_INCIDENT: &str = "inc";
pub const PREFIX_TIMELINE: &str = "tle";
pub const PREFIX_COMMENT: &str = "cmt";
pub const PREFIX_CAPA: &str = "cap";
pub const PREFIX_SOURCE_LINK: &str = "src";

/// Every prefix in use, for exhaustive ID tests.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_INCIDENT,
    PREFIX_TIMELINE,
    PREFIX_COMMENT,
    PREFIX_CAPA,
    PREFIX_SOURCE_LINK,
];
