use crmrelay_core::crm::CrmClient;
use crmrelay_core::models::IntegrationSettings;
use crmrelay_core::services::RelayService;

use crate::commands::common::parse_user;
use crate::error::CliError;

pub async fn run_integration_set<C: CrmClient>(
    service: &RelayService<C>,
    user: &str,
    api_key: &str,
    disabled: bool,
) -> Result<(), CliError> {
    let user = parse_user(user)?;
    let mut settings = IntegrationSettings::new(user, api_key.trim());
    settings.enabled = !disabled;
    service.save_integration(&settings).await?;

    let state = if settings.enabled { "enabled" } else { "disabled" };
    println!(
        "Saved HubSpot integration for {} ({state})",
        settings.user_id
    );
    Ok(())
}
