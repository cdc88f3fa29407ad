use clap::Subcommand;

/// Audit digest commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuditCommands {
    /// Recompute and store the digest for current state.
    Refresh { id: String },
    /// Check the stored digest, backfilling it when absent.
    Verify { id: String },
    /// Show stored and computed digests without writing anything.
    Status { id: String },
}
