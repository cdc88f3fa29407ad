use clap::Subcommand;

/// Category and tag commands share one shape.
#[derive(Clone, Debug, Subcommand)]
pub enum LabelCommands {
    /// Attach a label. Already attached labels are left alone.
    Add { incident: String, name: String },
    /// Detach a label.
    Remove { incident: String, name: String },
    /// List labels on an incident.
    List { incident: String },
}
