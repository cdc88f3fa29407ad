use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::commands::label::LabelKind;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Incident { action } => commands::incident::handle(&action, ctx, flags).await,
        Commands::Comment { action } => commands::comment::handle(&action, ctx, flags).await,
        Commands::Category { action } => {
            commands::label::handle(LabelKind::Category, &action, ctx, flags).await
        }
        Commands::Tag { action } => commands::label::handle(LabelKind::Tag, &action, ctx, flags).await,
        Commands::Capa { action } => commands::capa::handle(&action, ctx, flags).await,
        Commands::Source { action } => commands::source::handle(&action, ctx, flags).await,
        Commands::Timeline { action } => commands::timeline::handle(&action, ctx, flags).await,
        Commands::Audit { action } => commands::audit::handle(&action, ctx, flags).await,
        Commands::Export(args) => commands::export::handle(&args, ctx, flags).await,
        Commands::Init(_) => unreachable!("init is pre-dispatched in main"),
    }
}
