use clap::Subcommand;

/// Incident commands.
#[derive(Clone, Debug, Subcommand)]
pub enum IncidentCommands {
    /// Open a new incident in status `new`.
    Create {
        #[arg(long)]
        title: String,
        /// sev1, sev2, sev3, sev4
        #[arg(long, default_value = "sev3")]
        severity: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        reporter: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        service: Option<String>,
    },
    /// Update incident fields. Status goes through `transition`.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Clear the description.
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
        #[arg(long)]
        severity: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        service: Option<String>,
    },
    /// Move an incident through the status lifecycle.
    Transition {
        id: String,
        /// Target status (new, triaged, in_progress, on_hold, resolved, closed, reopened)
        status: String,
        #[arg(long)]
        message: Option<String>,
    },
    /// List incidents, newest first.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        severity: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Get one incident.
    Get { id: String },
    /// Delete an incident and everything attached to it.
    Delete { id: String },
}
