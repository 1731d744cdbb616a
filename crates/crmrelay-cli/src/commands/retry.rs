use crmrelay_core::crm::CrmClient;
use crmrelay_core::services::RelayService;

use crate::commands::common::{emit_error, emit_outcome, parse_sync_id, parse_user};
use crate::error::CliError;

/// Retry one record; with a requesting user the ownership check applies.
pub async fn run_retry<C: CrmClient>(
    service: &RelayService<C>,
    sync_id: &str,
    user: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let sync_id = parse_sync_id(sync_id)?;

    let outcome = match user {
        Some(user) => {
            let user = parse_user(user)?;
            match service.manual_retry(&sync_id, &user).await {
                Ok(outcome) => outcome,
                Err(error) => return emit_error(error, as_json),
            }
        }
        None => match service.try_retry(&sync_id).await {
            Ok(outcome) => outcome,
            Err(error) => return emit_error(error, as_json),
        },
    };

    emit_outcome(&outcome, as_json)
}
