use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use triage_config::PROJECT_DIR;
use triage_db::error::DatabaseError;

mod bootstrap;
mod cli;
mod commands;
mod context;
mod output;
mod ui;

/// Usage or input errors: bad arguments, unknown ids, rejected transitions.
const EXIT_INVALID: i32 = 2;
/// Stored audit digest does not match current state.
const EXIT_TAMPERED: i32 = 3;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("triage error: {error:#}");
        std::process::exit(exit_code(&error));
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    ui::init(&flags);

    if let cli::Commands::Init(args) = &cli.command {
        return commands::init::handle(args, &flags).await;
    }

    let project_root = resolve_project_root(flags.project.as_deref())?;
    let config = bootstrap::load_config(&project_root)?;

    let ctx = context::AppContext::init(project_root, config)
        .await
        .context("failed to initialize triage application context")?;

    commands::dispatch::dispatch(cli.command, &ctx, &flags).await
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TRIAGE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(db_error) = error.downcast_ref::<DatabaseError>() {
        if db_error.is_integrity_violation() {
            return EXIT_TAMPERED;
        }
        if db_error.is_validation() {
            return EXIT_INVALID;
        }
    }
    if error
        .downcast_ref::<triage_core::errors::CoreError>()
        .is_some_and(triage_core::errors::CoreError::is_validation)
    {
        return EXIT_INVALID;
    }
    1
}

fn resolve_project_root(project_override: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(path) = project_override {
        let explicit = PathBuf::from(path);

        if explicit
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == PROJECT_DIR)
        {
            return explicit
                .parent()
                .map(std::path::Path::to_path_buf)
                .context("invalid --project path: '.triage' directory has no parent");
        }

        if explicit.is_dir() {
            return Ok(explicit);
        }

        anyhow::bail!(
            "invalid --project '{}': directory does not exist",
            explicit.display()
        );
    }

    let start = std::env::current_dir().context("failed to read current directory")?;
    context::find_project_root(&start)
        .context("not a triage project (no .triage directory found). Run 'triage init' first.")
}
