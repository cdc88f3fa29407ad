use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use triage_config::PROJECT_DIR;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::InitArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitReport {
    project_root: PathBuf,
    database: String,
    audit_enabled: bool,
    already_initialized: bool,
}

/// Handle `triage init`: create `.triage/` and the database schema.
pub async fn handle(args: &InitArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let root = match flags.project.as_deref() {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let project_dir = root.join(PROJECT_DIR);
    let already_initialized = project_dir.is_dir();

    if already_initialized && !args.force {
        anyhow::bail!(
            "{} is already a triage project (use --force to re-run init)",
            root.display()
        );
    }

    create_project_dir(&project_dir)?;
    let config = bootstrap::load_config(&root)?;
    let ctx = AppContext::init(root, config).await?;
    tracing::info!(project_root = %ctx.project_root.display(), "initialized triage project");

    output(
        &InitReport {
            project_root: ctx.project_root.clone(),
            database: ctx.config.database.path.clone(),
            audit_enabled: ctx.service.audit().is_enabled(),
            already_initialized,
        },
        flags.format,
    )
}

fn create_project_dir(project_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(project_dir)
        .with_context(|| format!("failed to create {}", project_dir.display()))
}
