use std::path::Path;

use anyhow::Context;
use triage_config::TriageConfig;

/// Load `.env` from the project root (or the working directory), then the
/// layered configuration anchored at `project_root`.
pub fn load_config(project_root: &Path) -> anyhow::Result<TriageConfig> {
    load_project_dotenv(project_root)?;
    TriageConfig::load_from(project_root).context("failed to load triage configuration")
}

fn load_project_dotenv(project_root: &Path) -> anyhow::Result<()> {
    let env_path = project_root.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
        return Ok(());
    }

    dotenvy::dotenv().ok();
    Ok(())
}
