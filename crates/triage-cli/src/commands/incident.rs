pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod transition;
pub mod update;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::IncidentCommands;
use crate::context::AppContext;

/// Handle `triage incident`.
pub async fn handle(
    action: &IncidentCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        IncidentCommands::Create {
            title,
            severity,
            description,
            reporter,
            assignee,
            team,
            service,
        } => {
            create::run(
                create::CreateArgs {
                    title,
                    severity,
                    description: description.as_deref(),
                    reporter: reporter.as_deref(),
                    assignee: assignee.as_deref(),
                    team: team.as_deref(),
                    service: service.as_deref(),
                },
                ctx,
                flags,
            )
            .await
        }
        IncidentCommands::Update {
            id,
            title,
            description,
            clear_description,
            severity,
            assignee,
            team,
            service,
        } => {
            update::run(
                id,
                update::UpdateArgs {
                    title: title.as_deref(),
                    description: description.as_deref(),
                    clear_description: *clear_description,
                    severity: severity.as_deref(),
                    assignee: assignee.as_deref(),
                    team: team.as_deref(),
                    service: service.as_deref(),
                },
                ctx,
                flags,
            )
            .await
        }
        IncidentCommands::Transition {
            id,
            status,
            message,
        } => transition::run(id, status, message.as_deref(), ctx, flags).await,
        IncidentCommands::List {
            status,
            severity,
            limit,
        } => list::run(status.as_deref(), severity.as_deref(), *limit, ctx, flags).await,
        IncidentCommands::Get { id } => get::run(id, ctx, flags).await,
        IncidentCommands::Delete { id } => delete::run(id, ctx, flags).await,
    }
}
