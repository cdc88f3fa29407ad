use crate::cli::GlobalFlags;
use crate::cli::subcommands::SourceCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `triage source`.
pub async fn handle(
    action: &SourceCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        SourceCommands::Link {
            incident,
            source,
            external_id,
            url,
        } => {
            let link = ctx
                .service
                .link_source(
                    ctx.actor(flags.actor.as_deref()),
                    incident,
                    source,
                    external_id,
                    url.as_deref(),
                )
                .await?;
            output(&link, flags.format)
        }
        SourceCommands::List { incident } => {
            let links = ctx.service.list_source_links(incident).await?;
            output(&links, flags.format)
        }
    }
}
