use triage_core::enums::CapaStatus;
use triage_db::repos::capa::NewCapa;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::CapaCommands;
use crate::commands::shared::parse::{parse_enum, parse_timestamp};
use crate::context::AppContext;
use crate::output::output;

/// Handle `triage capa`.
pub async fn handle(action: &CapaCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let actor = ctx.actor(flags.actor.as_deref());
    match action {
        CapaCommands::Add {
            incident,
            title,
            description,
            owner,
            due,
        } => {
            let new = NewCapa {
                title: title.clone(),
                description: description.clone(),
                owner_id: owner.clone(),
                due_at: due
                    .as_deref()
                    .map(|raw| parse_timestamp(raw, "due"))
                    .transpose()?,
            };
            let capa = ctx.service.add_capa(actor, incident, &new).await?;
            output(&capa, flags.format)
        }
        CapaCommands::Status { id, status } => {
            let status = parse_enum::<CapaStatus>(status, "status")?;
            let capa = ctx.service.update_capa_status(actor, id, status).await?;
            output(&capa, flags.format)
        }
        CapaCommands::List { incident } => {
            let capas = ctx.service.list_capas(incident).await?;
            output(&capas, flags.format)
        }
    }
}
