//! Per-user CRM integration settings

use serde::{Deserialize, Serialize};

use super::UserId;

/// HubSpot credential and switch for one user
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationSettings {
    pub user_id: UserId,
    /// HubSpot private-app token, sent as a bearer credential
    pub api_key: String,
    pub enabled: bool,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl IntegrationSettings {
    #[must_use]
    pub fn new(user_id: UserId, api_key: impl Into<String>) -> Self {
        Self {
            user_id,
            api_key: api_key.into(),
            enabled: true,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Returns the credential when the integration can be used.
    pub fn usable_api_key(&self) -> crate::Result<&str> {
        if !self.enabled {
            return Err(crate::Error::Configuration(format!(
                "HubSpot integration is disabled for user {}",
                self.user_id
            )));
        }
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(crate::Error::Configuration(format!(
                "HubSpot API key is missing for user {}",
                self.user_id
            )));
        }
        Ok(key)
    }
}

impl std::fmt::Debug for IntegrationSettings {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("IntegrationSettings")
            .field("user_id", &self.user_id)
            .field("api_key", &"[REDACTED]")
            .field("enabled", &self.enabled)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
