use chrono::{DateTime, Utc};
use serde::Serialize;
use triage_config::ConfigError;
use triage_db::audit::VerifyOutcome;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuditCommands;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct VerifyReport<'a> {
    incident_id: &'a str,
    outcome: &'static str,
    hash: Option<&'a str>,
    hash_updated_at: Option<DateTime<Utc>>,
}

impl<'a> VerifyReport<'a> {
    fn new(incident_id: &'a str, outcome: &'a VerifyOutcome) -> Self {
        let label = match outcome {
            VerifyOutcome::Disabled => "disabled",
            VerifyOutcome::Backfilled(_) => "backfilled",
            VerifyOutcome::Verified(_) => "verified",
        };
        let stamp = outcome.stamp();
        Self {
            incident_id,
            outcome: label,
            hash: stamp.map(|s| s.hash.as_str()),
            hash_updated_at: stamp.map(|s| s.updated_at),
        }
    }
}

/// Handle `triage audit`.
pub async fn handle(action: &AuditCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let audit = ctx.service.audit();
    match action {
        AuditCommands::Refresh { id } => {
            let Some(stamp) = audit.refresh_hash(id).await? else {
                return Err(ConfigError::NotConfigured {
                    section: "audit".to_string(),
                }
                .into());
            };
            output(&stamp, flags.format)
        }
        AuditCommands::Verify { id } => {
            let outcome = audit.verify_or_fail(id).await?;
            output(&VerifyReport::new(id, &outcome), flags.format)
        }
        AuditCommands::Status { id } => {
            let status = audit.audit_status(id).await?;
            output(&status, flags.format)
        }
    }
}
