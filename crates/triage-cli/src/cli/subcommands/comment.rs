use clap::Subcommand;

/// Comment commands.
#[derive(Clone, Debug, Subcommand)]
pub enum CommentCommands {
    /// Add a comment to an incident.
    Add { incident: String, body: String },
    /// List comments in creation order.
    List { incident: String },
}
