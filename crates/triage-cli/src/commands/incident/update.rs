use triage_core::enums::Severity;
use triage_db::updates::incident::IncidentUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

pub struct UpdateArgs<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub clear_description: bool,
    pub severity: Option<&'a str>,
    pub assignee: Option<&'a str>,
    pub team: Option<&'a str>,
    pub service: Option<&'a str>,
}

pub async fn run(
    id: &str,
    args: UpdateArgs<'_>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let mut builder = IncidentUpdateBuilder::new();
    if let Some(title) = args.title {
        builder = builder.title(title);
    }
    if args.clear_description {
        builder = builder.description(None);
    } else if let Some(description) = args.description {
        builder = builder.description(Some(description.to_string()));
    }
    if let Some(severity) = args.severity {
        builder = builder.severity(parse_enum::<Severity>(severity, "severity")?);
    }
    if let Some(assignee) = args.assignee {
        builder = builder.assignee_id(non_empty(assignee));
    }
    if let Some(team) = args.team {
        builder = builder.team_id(non_empty(team));
    }
    if let Some(service) = args.service {
        builder = builder.service_id(non_empty(service));
    }

    let update = builder.build();
    if update.is_empty() {
        anyhow::bail!("nothing to update: pass at least one field flag");
    }

    let incident = ctx
        .service
        .update_incident(ctx.actor(flags.actor.as_deref()), id, update)
        .await?;
    output(&incident, flags.format)
}

/// An empty value clears the field.
fn non_empty(value: &str) -> Option<String> {
    Some(value.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}
