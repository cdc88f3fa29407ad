use clap::Subcommand;

/// External source link commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SourceCommands {
    /// Link an external record (pager alert, ticket, chat thread).
    Link {
        incident: String,
        #[arg(long)]
        source: String,
        #[arg(long)]
        external_id: String,
        #[arg(long)]
        url: Option<String>,
    },
    /// List source links on an incident.
    List { incident: String },
}
