use clap::Subcommand;

/// Timeline commands.
#[derive(Clone, Debug, Subcommand)]
pub enum TimelineCommands {
    /// Show the timeline in chronological order.
    List {
        incident: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Append a free-form note.
    Note { incident: String, message: String },
}
