use std::path::{Path, PathBuf};

use crmrelay_core::config::RelayConfig;
use crmrelay_core::crm::HubSpotClient;
use crmrelay_core::models::{SweepReport, SyncRecord};
use crmrelay_core::services::RelayService;
use crmrelay_core::{EntityId, SyncId, SyncOutcome, UserId};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SyncRecordItem {
    pub id: String,
    pub user_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub crm_entity_type: String,
    pub crm_entity_id: Option<String>,
    pub sync_status: String,
    pub retry_count: u32,
    pub last_attempt: Option<i64>,
    pub last_attempt_iso: Option<String>,
    pub error_message: Option<String>,
}

pub fn record_to_item(record: &SyncRecord) -> SyncRecordItem {
    SyncRecordItem {
        id: record.id.to_string(),
        user_id: record.user_id.to_string(),
        entity_type: record.entity_type.to_string(),
        entity_id: record.entity_id.to_string(),
        crm_entity_type: record.crm_entity_type.to_string(),
        crm_entity_id: record.crm_entity_id.clone(),
        sync_status: record.sync_status.to_string(),
        retry_count: record.retry_count,
        last_attempt: record.last_attempt,
        last_attempt_iso: record.last_attempt.map(format_timestamp),
        error_message: record.error_message.clone(),
    }
}

pub fn format_record_lines(records: &[SyncRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let last_attempt = record
                .last_attempt
                .map_or_else(|| "never".to_string(), format_timestamp);
            let detail = match (&record.crm_entity_id, &record.error_message) {
                (Some(crm_id), _) if !record.is_failed() => {
                    format!("{}={crm_id}", record.crm_entity_type)
                }
                (_, Some(error)) => format!("error: {error}"),
                _ => String::new(),
            };
            format!(
                "{}  {:<9}  {}={}  retries={}  last={}  {}",
                record.id,
                record.sync_status.as_str(),
                record.entity_type,
                record.entity_id,
                record.retry_count,
                last_attempt,
                detail
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

pub fn format_outcome_line(outcome: &SyncOutcome) -> String {
    match (&outcome.crm_entity_id, &outcome.error) {
        (Some(crm_id), _) if outcome.success => format!("Synced to HubSpot: {crm_id}"),
        (_, Some(error)) => format!("Sync failed: {error}"),
        _ => "Sync failed".to_string(),
    }
}

pub fn format_report_line(report: &SweepReport) -> String {
    format!(
        "Retried {} failed record(s): {} succeeded, {} failed, {} at retry limit",
        report.processed_count, report.succeeded_count, report.failed_count, report.skipped_count
    )
}

/// Print an operation outcome; unsuccessful outcomes become the command error.
pub fn emit_outcome(outcome: &SyncOutcome, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else if outcome.success {
        println!("{}", format_outcome_line(outcome));
    }

    if outcome.success {
        Ok(())
    } else {
        Err(CliError::SyncFailed(
            outcome.error.clone().unwrap_or_default(),
        ))
    }
}

/// Print a failed outcome for an operation that returned an error.
pub fn emit_error(error: crmrelay_core::Error, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&SyncOutcome::failed(&error))?
        );
    }
    Err(CliError::Core(error))
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn parse_user(value: &str) -> Result<UserId, CliError> {
    UserId::new(value).ok_or(CliError::EmptyUserId)
}

pub fn parse_entity_id(value: &str, kind: &'static str) -> Result<EntityId, CliError> {
    value.parse().map_err(|_| CliError::InvalidId {
        kind,
        value: value.to_string(),
    })
}

pub fn parse_sync_id(value: &str) -> Result<SyncId, CliError> {
    value.parse().map_err(|_| CliError::InvalidId {
        kind: "sync record",
        value: value.to_string(),
    })
}

/// Parse an RFC 3339 date into Unix milliseconds.
pub fn parse_due_date(value: &str) -> Result<i64, CliError> {
    chrono::DateTime::parse_from_rfc3339(value.trim())
        .map(|date_time| date_time.timestamp_millis())
        .map_err(|_| CliError::InvalidDueDate(value.to_string()))
}

pub fn normalize_title(title: &str) -> Result<String, CliError> {
    let title = title.trim();
    if title.is_empty() {
        Err(CliError::EmptyTitle)
    } else {
        Ok(title.to_string())
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &RelayConfig) -> PathBuf {
    cli_db_path
        .or_else(|| config.db_path.clone())
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("crmrelay")
        .join("crmrelay.db")
}

pub async fn open_service(
    db_path: &Path,
    config: &RelayConfig,
) -> Result<RelayService<HubSpotClient>, CliError> {
    Ok(RelayService::open(db_path, config).await?)
}
