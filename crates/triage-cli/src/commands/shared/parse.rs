use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().to_lowercase().replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Parse an RFC 3339 timestamp argument.
pub fn parse_timestamp(raw: &str, field: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use triage_core::enums::{CapaStatus, IncidentStatus, Severity};

    use super::{parse_enum, parse_timestamp};

    #[test]
    fn parses_snake_case_enum() {
        let status: IncidentStatus = parse_enum("triaged", "status").expect("status should parse");
        assert_eq!(status, IncidentStatus::Triaged);
    }

    #[test]
    fn parses_hyphenated_alias() {
        let status: IncidentStatus =
            parse_enum("in-progress", "status").expect("status should parse");
        assert_eq!(status, IncidentStatus::InProgress);
        let capa: CapaStatus = parse_enum("In-Progress", "status").expect("capa status should parse");
        assert_eq!(capa, CapaStatus::InProgress);
    }

    #[test]
    fn errors_on_invalid_enum() {
        let err = parse_enum::<Severity>("sev9", "severity").expect_err("should fail");
        assert!(err.to_string().contains("invalid severity 'sev9'"));
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let at = parse_timestamp("2026-03-01T14:00:00+02:00", "due").expect("should parse");
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        assert!(parse_timestamp("next tuesday", "due").is_err());
    }
}
