use triage_core::enums::IncidentStatus;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    id: &str,
    status: &str,
    message: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let to = parse_enum::<IncidentStatus>(status, "status")?;
    let incident = ctx
        .service
        .transition_incident(ctx.actor(flags.actor.as_deref()), id, to, message)
        .await?;
    output(&incident, flags.format)
}
