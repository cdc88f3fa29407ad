use clap::Subcommand;

/// CAPA commands.
#[derive(Clone, Debug, Subcommand)]
pub enum CapaCommands {
    /// Raise a CAPA against an incident.
    Add {
        incident: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        /// Due date (RFC 3339)
        #[arg(long)]
        due: Option<String>,
    },
    /// Move a CAPA to a new status (open, in_progress, done, cancelled).
    Status { id: String, status: String },
    /// List CAPAs on an incident.
    List { incident: String },
}
