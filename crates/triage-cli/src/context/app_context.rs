use std::path::{Path, PathBuf};

use anyhow::Context;
use triage_config::TriageConfig;
use triage_db::service::IncidentService;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: IncidentService,
    pub config: TriageConfig,
    pub project_root: PathBuf,
}

impl AppContext {
    /// Open the incident store named by `config` under `project_root`.
    pub async fn init(project_root: PathBuf, config: TriageConfig) -> anyhow::Result<Self> {
        if !config.database.is_in_memory() {
            ensure_parent_dir(Path::new(&config.database.path))?;
        }

        let service = IncidentService::new_local(&config.database.path, config.audit.secret())
            .await
            .context("failed to initialize triage-db service")?;

        if !config.audit.is_configured() {
            tracing::warn!(
                "audit secret not configured (set TRIAGE_AUDIT__SECRET); incidents will not be stamped"
            );
        }

        Ok(Self {
            service,
            config,
            project_root,
        })
    }

    /// Actor for timeline entries: the `--actor` flag, then `general.default_actor`.
    #[must_use]
    pub fn actor<'a>(&'a self, flag: Option<&'a str>) -> Option<&'a str> {
        resolve_actor(flag, &self.config.general.default_actor)
    }
}

fn resolve_actor<'a>(flag: Option<&'a str>, configured: &'a str) -> Option<&'a str> {
    flag.map(str::trim)
        .filter(|actor| !actor.is_empty())
        .or_else(|| Some(configured.trim()).filter(|actor| !actor.is_empty()))
}

fn ensure_parent_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create database directory {}", parent.display()))?;
    }
    Ok(())
}
