//! Integration settings repository implementation

use crate::error::{Error, Result};
use crate::models::{IntegrationSettings, UserId};
use libsql::Connection;

/// Trait for per-user integration settings storage (async)
#[allow(async_fn_in_trait)]
pub trait IntegrationRepository {
    /// Load settings for a user, if any were saved
    async fn get(&self, user_id: &UserId) -> Result<Option<IntegrationSettings>>;

    /// Insert or replace settings for a user
    async fn save(&self, settings: &IntegrationSettings) -> Result<()>;
}

/// libSQL implementation of `IntegrationRepository`
pub struct LibSqlIntegrationRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlIntegrationRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl IntegrationRepository for LibSqlIntegrationRepository<'_> {
    async fn get(&self, user_id: &UserId) -> Result<Option<IntegrationSettings>> {
        let mut rows = self
            .conn
            .query(
                "SELECT api_key, enabled, updated_at FROM integration_settings WHERE user_id = ?",
                [user_id.as_str()],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        Ok(Some(IntegrationSettings {
            user_id: user_id.clone(),
            api_key: row.get(0)?,
            enabled: row.get::<i32>(1)? != 0,
            updated_at: row.get(2)?,
        }))
    }

    async fn save(&self, settings: &IntegrationSettings) -> Result<()> {
        if settings.api_key.trim().is_empty() {
            return Err(Error::InvalidInput("API key must not be empty".into()));
        }

        self.conn
            .execute(
                "INSERT OR REPLACE INTO integration_settings (user_id, api_key, enabled, updated_at)
                 VALUES (?, ?, ?, ?)",
                libsql::params![
                    settings.user_id.as_str(),
                    settings.api_key.trim(),
                    i32::from(settings.enabled),
                    settings.updated_at
                ],
            )
            .await?;
        Ok(())
    }
}
