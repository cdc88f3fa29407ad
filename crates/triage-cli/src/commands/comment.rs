use crate::cli::GlobalFlags;
use crate::cli::subcommands::CommentCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `triage comment`.
pub async fn handle(
    action: &CommentCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        CommentCommands::Add { incident, body } => {
            let comment = ctx
                .service
                .add_comment(ctx.actor(flags.actor.as_deref()), incident, body)
                .await?;
            output(&comment, flags.format)
        }
        CommentCommands::List { incident } => {
            let comments = ctx.service.list_comments(incident).await?;
            output(&comments, flags.format)
        }
    }
}
