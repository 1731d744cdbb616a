use crmrelay_core::crm::CrmClient;
use crmrelay_core::db::SyncRecordFilter;
use crmrelay_core::services::RelayService;
use crmrelay_core::SyncStatus;

use crate::commands::common::{format_record_lines, parse_user, record_to_item, SyncRecordItem};
use crate::error::CliError;

pub async fn run_status<C: CrmClient>(
    service: &RelayService<C>,
    failed_only: bool,
    user: Option<&str>,
    limit: Option<usize>,
    as_json: bool,
) -> Result<(), CliError> {
    let filter = SyncRecordFilter {
        status: failed_only.then_some(SyncStatus::Failed),
        user_id: user.map(parse_user).transpose()?,
        limit,
    };
    let records = service.list_records(&filter).await?;

    if as_json {
        let json_items = records
            .iter()
            .map(record_to_item)
            .collect::<Vec<SyncRecordItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No sync records found.");
        return Ok(());
    }

    for line in format_record_lines(&records) {
        println!("{line}");
    }
    Ok(())
}
