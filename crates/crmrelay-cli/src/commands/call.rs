use crmrelay_core::crm::CrmClient;
use crmrelay_core::models::Call;
use crmrelay_core::services::RelayService;
use crmrelay_core::util::normalize_text_option;

use crate::commands::common::{normalize_title, parse_user};
use crate::error::CliError;

pub async fn run_call_add<C: CrmClient>(
    service: &RelayService<C>,
    user: &str,
    title: &str,
    transcription: Option<String>,
) -> Result<Call, CliError> {
    let mut call = Call::new(parse_user(user)?, normalize_title(title)?);
    call.transcription = normalize_text_option(transcription);
    service.add_call(&call).await?;

    println!("{}", call.id);
    Ok(call)
}
