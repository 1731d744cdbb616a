use crmrelay_core::crm::CrmClient;
use crmrelay_core::services::RelayService;

use crate::cli::EntityArg;
use crate::commands::common::{emit_error, emit_outcome, parse_entity_id, parse_user};
use crate::error::CliError;

pub async fn run_sync<C: CrmClient>(
    service: &RelayService<C>,
    entity: EntityArg,
    id: &str,
    user: &str,
    as_json: bool,
) -> Result<(), CliError> {
    let user = parse_user(user)?;
    let kind = match entity {
        EntityArg::Call => "call",
        EntityArg::Actionable => "actionable",
    };
    let entity_id = parse_entity_id(id, kind)?;

    match service.trigger_sync(&user, entity.into(), &entity_id).await {
        Ok(outcome) => emit_outcome(&outcome, as_json),
        Err(error) => emit_error(error, as_json),
    }
}
