//! crmrelay CLI - relay calls and actionables to HubSpot
//!
//! Triggers syncs, retries failed ones with backoff and sweeps the failed
//! backlog, either once (for cron) or on an interval.

mod cli;
mod commands;
mod error;


use std::time::Duration;

use clap::Parser;
use crmrelay_core::config::RelayConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{ActionableCommands, CallCommands, Cli, Commands, IntegrationCommands};
use crate::commands::actionable::run_actionable_add;
use crate::commands::call::run_call_add;
use crate::commands::common::{open_service, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::integration::run_integration_set;
use crate::commands::retry::run_retry;
use crate::commands::status::run_status;
use crate::commands::sweep::{run_sweep, run_sweep_watch};
use crate::commands::sync::run_sync;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "warn,crmrelay=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let config = RelayConfig::from_env()?;
    let db_path = resolve_db_path(cli.db_path, &config);
    let service = open_service(&db_path, &config).await?;

    match cli.command {
        Commands::Sync {
            entity,
            id,
            user,
            json,
        } => run_sync(&service, entity, &id, &user, json).await?,
        Commands::Retry {
            sync_id,
            user,
            json,
        } => run_retry(&service, &sync_id, user.as_deref(), json).await?,
        Commands::Sweep {
            watch,
            interval,
            json,
        } => {
            if watch {
                let period = interval.map_or(config.sweep_interval, Duration::from_secs);
                run_sweep_watch(&service, period, json).await?;
            } else {
                run_sweep(&service, json).await?;
            }
        }
        Commands::Status {
            failed,
            user,
            limit,
            json,
        } => run_status(&service, failed, user.as_deref(), limit, json).await?,
        Commands::Integration {
            command:
                IntegrationCommands::Set {
                    user,
                    api_key,
                    disabled,
                },
        } => run_integration_set(&service, &user, &api_key, disabled).await?,
        Commands::Call {
            command:
                CallCommands::Add {
                    user,
                    title,
                    transcription,
                },
        } => {
            run_call_add(&service, &user, &title, transcription).await?;
        }
        Commands::Actionable {
            command: ActionableCommands::Add(args),
        } => {
            run_actionable_add(&service, args).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
