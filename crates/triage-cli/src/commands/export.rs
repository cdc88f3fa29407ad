use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExportArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `triage export`: verify the incident, then emit exactly what was verified.
pub async fn handle(args: &ExportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let export = ctx.service.export_incident(&args.id).await?;
    output(&export, flags.format)
}
