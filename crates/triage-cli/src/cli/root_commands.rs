use clap::{Args, Subcommand};

use crate::cli::subcommands::{
    AuditCommands, CapaCommands, CommentCommands, IncidentCommands, LabelCommands,
    SourceCommands, TimelineCommands,
};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Initialize triage for a project.
    Init(InitArgs),
    /// Incidents.
    Incident {
        #[command(subcommand)]
        action: IncidentCommands,
    },
    /// Comments on an incident.
    Comment {
        #[command(subcommand)]
        action: CommentCommands,
    },
    /// Incident categories.
    Category {
        #[command(subcommand)]
        action: LabelCommands,
    },
    /// Incident tags.
    Tag {
        #[command(subcommand)]
        action: LabelCommands,
    },
    /// Corrective and preventive actions.
    Capa {
        #[command(subcommand)]
        action: CapaCommands,
    },
    /// External source links.
    Source {
        #[command(subcommand)]
        action: SourceCommands,
    },
    /// Incident timeline.
    Timeline {
        #[command(subcommand)]
        action: TimelineCommands,
    },
    /// Audit digest maintenance and verification.
    Audit {
        #[command(subcommand)]
        action: AuditCommands,
    },
    /// Verify and export a single incident.
    Export(ExportArgs),
}

#[derive(Clone, Debug, Args)]
pub struct InitArgs {
    /// Succeed when the project is already initialized.
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    /// Incident ID.
    pub id: String,
}
