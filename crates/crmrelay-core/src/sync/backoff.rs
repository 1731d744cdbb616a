//! Fixed-table retry backoff

use std::time::Duration;

use crate::error::{Error, Result};

/// Default wait before each retry tier: 5, 15, 45 minutes
pub const DEFAULT_BACKOFF_MINUTES: [u64; 3] = [5, 15, 45];

/// Default retry ceiling
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Backoff table indexed by the current retry count, plus a retry ceiling.
///
/// Counts beyond the table reuse its last entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    table: Vec<Duration>,
    max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            table: DEFAULT_BACKOFF_MINUTES
                .iter()
                .map(|minutes| Duration::from_secs(minutes * 60))
                .collect(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl BackoffPolicy {
    pub fn new(table: Vec<Duration>, max_retries: u32) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::InvalidInput(
                "backoff table must have at least one entry".into(),
            ));
        }
        Ok(Self { table, max_retries })
    }

    pub fn table(&self) -> &[Duration] {
        &self.table
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait required before the retry following `retry_count` attempts
    pub fn required_wait(&self, retry_count: u32) -> Duration {
        let index = usize::try_from(retry_count).unwrap_or(usize::MAX);
        self.table
            .get(index)
            .or_else(|| self.table.last())
            .copied()
            .unwrap_or_default()
    }

    /// Decide whether a failed record may be retried at `now_ms`.
    ///
    /// The ceiling is checked before the backoff window. A retry exactly at
    /// the window boundary is eligible. Records that were never attempted are
    /// immediately eligible.
    pub fn check(&self, retry_count: u32, last_attempt: Option<i64>, now_ms: i64) -> Result<()> {
        if retry_count >= self.max_retries {
            return Err(Error::RetryExhausted {
                retry_count,
                max_retries: self.max_retries,
            });
        }

        let Some(last_attempt) = last_attempt else {
            return Ok(());
        };

        let required = self.required_wait(retry_count);
        let elapsed_ms = u64::try_from(now_ms.saturating_sub(last_attempt)).unwrap_or(0);
        let elapsed = Duration::from_millis(elapsed_ms);

        if elapsed < required {
            return Err(Error::BackoffNotElapsed { required, elapsed });
        }
        Ok(())
    }
}
