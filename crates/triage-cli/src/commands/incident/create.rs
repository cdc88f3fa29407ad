use triage_core::enums::Severity;
use triage_db::repos::incident::NewIncident;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

pub struct CreateArgs<'a> {
    pub title: &'a str,
    pub severity: &'a str,
    pub description: Option<&'a str>,
    pub reporter: Option<&'a str>,
    pub assignee: Option<&'a str>,
    pub team: Option<&'a str>,
    pub service: Option<&'a str>,
}

pub async fn run(args: CreateArgs<'_>, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let severity = parse_enum::<Severity>(args.severity, "severity")?;
    let actor = ctx.actor(flags.actor.as_deref());

    let mut new = NewIncident::new(args.title, severity);
    new.description = args.description.map(str::to_string);
    new.reporter_id = args.reporter.or(actor).map(str::to_string);
    new.assignee_id = args.assignee.map(str::to_string);
    new.team_id = args.team.map(str::to_string);
    new.service_id = args.service.map(str::to_string);

    let incident = ctx.service.create_incident(actor, &new).await?;
    output(&incident, flags.format)
}
