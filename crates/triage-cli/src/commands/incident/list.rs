use triage_core::enums::{IncidentStatus, Severity};
use triage_db::repos::incident::IncidentFilter;

use crate::cli::GlobalFlags;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    status: Option<&str>,
    severity: Option<&str>,
    limit: Option<u32>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let filter = IncidentFilter {
        status: status
            .map(|value| parse_enum::<IncidentStatus>(value, "status"))
            .transpose()?,
        severity: severity
            .map(|value| parse_enum::<Severity>(value, "severity"))
            .transpose()?,
        limit: Some(effective_limit(
            limit,
            flags.limit,
            ctx.config.general.default_limit,
        )),
    };

    let incidents = ctx.service.list_incidents(&filter).await?;
    output(&incidents, flags.format)
}
