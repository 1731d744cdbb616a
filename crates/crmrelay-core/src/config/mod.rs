//! Runtime configuration for the relay.
//!
//! Values come from the process environment (the CLI loads `.env` first).
//! Parsing runs over a lookup closure so tests never touch the real
//! environment.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::crm::{DealDefaults, DEFAULT_BASE_URL};
use crate::error::{Error, Result};
use crate::sync::{BackoffPolicy, DEFAULT_MAX_RETRIES};
use crate::util::is_http_url;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_BACKOFF: &str = "5,15,45";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Explicit database path; callers pick a platform default when unset
    pub db_path: Option<PathBuf>,
    pub hubspot_base_url: String,
    pub http_timeout: Duration,
    pub backoff: BackoffPolicy,
    pub sweep_interval: Duration,
    pub deals: DealDefaults,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            hubspot_base_url: DEFAULT_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            backoff: BackoffPolicy::default(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            deals: DealDefaults::default(),
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = optional_trimmed(&lookup, "CRMRELAY_DB_PATH").map(PathBuf::from);

        let hubspot_base_url = value_or_default(&lookup, "HUBSPOT_API_BASE_URL", DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        if !is_http_url(&hubspot_base_url) {
            return Err(Error::Configuration(
                "HUBSPOT_API_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let http_timeout_secs = parse_u64(
            &lookup,
            "CRMRELAY_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        if !(1..=600).contains(&http_timeout_secs) {
            return Err(Error::Configuration(
                "CRMRELAY_HTTP_TIMEOUT_SECS must be in [1, 600]".to_string(),
            ));
        }

        let table = parse_backoff_minutes(&value_or_default(
            &lookup,
            "CRMRELAY_BACKOFF_MINUTES",
            DEFAULT_BACKOFF,
        ))?;

        let max_retries = value_or_default(
            &lookup,
            "CRMRELAY_MAX_RETRIES",
            &DEFAULT_MAX_RETRIES.to_string(),
        )
        .parse::<u32>()
        .map_err(|_| {
            Error::Configuration("CRMRELAY_MAX_RETRIES must be a non-negative integer".to_string())
        })?;

        let sweep_interval_secs = parse_u64(
            &lookup,
            "CRMRELAY_SWEEP_INTERVAL_SECS",
            DEFAULT_SWEEP_INTERVAL_SECS,
        )?;
        if sweep_interval_secs == 0 {
            return Err(Error::Configuration(
                "CRMRELAY_SWEEP_INTERVAL_SECS must be greater than 0".to_string(),
            ));
        }

        let defaults = DealDefaults::default();
        let deals = DealDefaults {
            stage: value_or_default(&lookup, "HUBSPOT_DEAL_STAGE", &defaults.stage),
            pipeline: value_or_default(&lookup, "HUBSPOT_DEAL_PIPELINE", &defaults.pipeline),
        };

        Ok(Self {
            db_path,
            hubspot_base_url,
            http_timeout: Duration::from_secs(http_timeout_secs),
            backoff: BackoffPolicy::new(table, max_retries)?,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            deals,
        })
    }
}

/// Parse a comma-separated list of positive minute counts
fn parse_backoff_minutes(raw: &str) -> Result<Vec<Duration>> {
    let invalid = || {
        Error::Configuration(
            "CRMRELAY_BACKOFF_MINUTES must be a comma-separated list of positive integers"
                .to_string(),
        )
    };

    raw.split(',')
        .map(|part| {
            let minutes = part.trim().parse::<u64>().map_err(|_| invalid())?;
            if minutes == 0 {
                return Err(invalid());
            }
            minutes
                .checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(invalid)
        })
        .collect()
}

fn parse_u64(lookup: impl Fn(&str) -> Option<String>, name: &str, default: u64) -> Result<u64> {
    optional_trimmed(lookup, name).map_or(Ok(default), |value| {
        value
            .parse::<u64>()
            .map_err(|_| Error::Configuration(format!("{name} must be a non-negative integer")))
    })
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
