use crate::cli::GlobalFlags;
use crate::cli::subcommands::TimelineCommands;
use crate::commands::shared::limit::effective_limit;
use crate::context::AppContext;
use crate::output::output;

/// Handle `triage timeline`.
pub async fn handle(
    action: &TimelineCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        TimelineCommands::List { incident, limit } => {
            let mut entries = ctx.service.list_timeline(incident).await?;
            // Only an explicit limit trims; the full timeline is the default view.
            if limit.is_some() || flags.limit.is_some() {
                let limit = effective_limit(*limit, flags.limit, u32::MAX);
                entries.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            }
            output(&entries, flags.format)
        }
        TimelineCommands::Note { incident, message } => {
            let entry = ctx
                .service
                .add_note(ctx.actor(flags.actor.as_deref()), incident, message)
                .await?;
            output(&entry, flags.format)
        }
    }
}
