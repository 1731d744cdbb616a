use std::time::Duration;

use crmrelay_core::crm::CrmClient;
use crmrelay_core::models::SweepReport;
use crmrelay_core::services::RelayService;
use tokio::time::{interval, MissedTickBehavior};

use crate::commands::common::format_report_line;
use crate::error::CliError;

/// Run one sweep over failed records and print the tally.
pub async fn run_sweep<C: CrmClient>(
    service: &RelayService<C>,
    as_json: bool,
) -> Result<SweepReport, CliError> {
    let report = service.retry_all_failed().await?;
    if as_json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", format_report_line(&report));
    }
    Ok(report)
}

/// Sweep on a fixed period until Ctrl-C.
///
/// A failed pass is logged and the next tick runs as usual.
pub async fn run_sweep_watch<C: CrmClient>(
    service: &RelayService<C>,
    period: Duration,
    as_json: bool,
) -> Result<(), CliError> {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!(interval_secs = period.as_secs(), "Watching for failed syncs");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(error) = run_sweep(service, as_json).await {
                    tracing::error!(%error, "Sweep failed");
                }
            }
            result = &mut shutdown => {
                result?;
                tracing::info!("Stopping sweep watch");
                return Ok(());
            }
        }
    }
}
