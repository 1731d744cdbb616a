use crmrelay_core::crm::CrmClient;
use crmrelay_core::models::Actionable;
use crmrelay_core::services::RelayService;
use crmrelay_core::util::normalize_text_option;

use crate::cli::ActionableAddArgs;
use crate::commands::common::{normalize_title, parse_due_date, parse_entity_id, parse_user};
use crate::error::CliError;

pub async fn run_actionable_add<C: CrmClient>(
    service: &RelayService<C>,
    args: ActionableAddArgs,
) -> Result<Actionable, CliError> {
    let mut actionable = Actionable::new(
        parse_user(&args.user)?,
        args.kind.into(),
        normalize_title(&args.title)?,
    );
    actionable.priority = args.priority.into();
    actionable.description = normalize_text_option(args.description);
    actionable.amount = args.amount;
    actionable.due_date = args.due.as_deref().map(parse_due_date).transpose()?;
    actionable.call_id = args
        .call
        .as_deref()
        .map(|id| parse_entity_id(id, "call"))
        .transpose()?;

    service.add_actionable(&actionable).await?;

    println!("{}", actionable.id);
    Ok(actionable)
}
