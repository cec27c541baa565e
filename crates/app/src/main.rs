mod cli;
mod config;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use services::{AppServices, Clock, ai_from_env};
use storage::mirror::RestoreReport;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, direction};
use crate::config::{Config, normalize_sqlite_url, prepare_sqlite_file};

fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn log_restore(report: RestoreReport) {
    if report.sessions_restored + report.completed_restored > 0 {
        info!(
            sessions = report.sessions_restored,
            completed = report.completed_restored,
            "restored records from mirror"
        );
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(db) = cli.db {
        config.db_url = normalize_sqlite_url(db);
    }
    if cli.no_mirror {
        config.mirror_path = None;
    } else if let Some(mirror) = cli.mirror {
        config.mirror_path = Some(mirror);
    }

    init_tracing(&config.log_filter);
    info!(
        db = %config.db_url,
        voice_input = config.transcription.is_some(),
        "starting interview v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Open + migrate SQLite at startup; services stay storage-agnostic.
    prepare_sqlite_file(&config.db_url)?;
    let services = AppServices::new_sqlite(
        &config.db_url,
        config.mirror_path.as_deref(),
        Clock::default_clock(),
        ai_from_env(),
    )
    .await
    .context("opening session storage")?;
    log_restore(services.restored());

    match cli.command {
        Commands::Interview { resume, fresh } => {
            terminal::run_interview(&services, resume, fresh).await
        }
        Commands::Dashboard {
            filter,
            sort,
            asc,
            in_progress,
            candidate,
        } => {
            let dashboard = services.dashboard();
            match candidate {
                Some(id) => terminal::show_candidate(&dashboard, id).await,
                None if in_progress => {
                    terminal::show_in_progress(&dashboard, &filter, sort.in_progress(), direction(asc))
                        .await
                }
                None => {
                    terminal::show_completed(&dashboard, &filter, sort.completed(), direction(asc))
                        .await
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}
