use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::LabelCommands;
use crate::context::AppContext;
use crate::output::output;

/// Which label collection a `category`/`tag` command targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Category,
    Tag,
}

#[derive(Debug, Serialize)]
struct LabelChange<'a> {
    incident_id: &'a str,
    kind: LabelKind,
    name: &'a str,
    changed: bool,
}

/// Handle `triage category` and `triage tag`.
pub async fn handle(
    kind: LabelKind,
    action: &LabelCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let actor = ctx.actor(flags.actor.as_deref());
    match action {
        LabelCommands::Add { incident, name } => {
            let changed = match kind {
                LabelKind::Category => ctx.service.add_category(actor, incident, name).await?,
                LabelKind::Tag => ctx.service.add_tag(actor, incident, name).await?,
            };
            output(&LabelChange { incident_id: incident, kind, name, changed }, flags.format)
        }
        LabelCommands::Remove { incident, name } => {
            let changed = match kind {
                LabelKind::Category => ctx.service.remove_category(actor, incident, name).await?,
                LabelKind::Tag => ctx.service.remove_tag(actor, incident, name).await?,
            };
            output(&LabelChange { incident_id: incident, kind, name, changed }, flags.format)
        }
        LabelCommands::List { incident } => match kind {
            LabelKind::Category => output(&ctx.service.list_categories(incident).await?, flags.format),
            LabelKind::Tag => output(&ctx.service.list_tags(incident).await?, flags.format),
        },
    }
}
