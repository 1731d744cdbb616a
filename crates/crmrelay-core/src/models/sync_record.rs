//! Sync-status record and operation result shapes

use serde::{Deserialize, Serialize};

use super::{ActionableKind, EntityId, SyncId, UserId};

/// Internal entity kind being relayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Call,
    Actionable,
}

/// CRM object type created for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrmEntityType {
    Note,
    Task,
    Deal,
}

/// Outcome of the latest attempt in a sync lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Completed,
    Failed,
}

text_enum!(EntityType { Call => "call", Actionable => "actionable" });
text_enum!(CrmEntityType { Note => "note", Task => "task", Deal => "deal" });
text_enum!(SyncStatus { Completed => "completed", Failed => "failed" });

impl From<ActionableKind> for CrmEntityType {
    fn from(kind: ActionableKind) -> Self {
        match kind {
            ActionableKind::Task => Self::Task,
            ActionableKind::Deal => Self::Deal,
        }
    }
}

/// One record per `(entity_type, entity_id)`, mutated in place on each attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub id: SyncId,
    pub user_id: UserId,
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub crm_entity_type: CrmEntityType,
    pub crm_entity_id: Option<String>,
    pub sync_status: SyncStatus,
    pub retry_count: u32,
    /// Unix ms of the last dispatch or retry claim
    pub last_attempt: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SyncRecord {
    pub const fn is_failed(&self) -> bool {
        matches!(self.sync_status, SyncStatus::Failed)
    }
}

/// Uniform `{success, crmEntityId?, error?}` result of every operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm_entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    pub fn synced(crm_entity_id: impl Into<String>) -> Self {
        Self {
            success: true,
            crm_entity_id: Some(crm_entity_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            crm_entity_id: None,
            error: Some(error.to_string()),
        }
    }
}

/// Tally of one sweep over failed records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Retries attempted (`succeeded + failed`)
    pub processed_count: usize,
    pub succeeded_count: usize,
    pub failed_count: usize,
    /// Failed records skipped because the retry ceiling was reached
    pub skipped_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_in_camel_case_without_empty_fields() {
        let json = serde_json::to_string(&SyncOutcome::synced("1234")).unwrap();
        assert_eq!(json, r#"{"success":true,"crmEntityId":"1234"}"#);

        let json = serde_json::to_string(&SyncOutcome::failed("boom")).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"boom"}"#);
    }

    #[test]
    fn actionable_kind_maps_to_crm_type() {
        assert_eq!(CrmEntityType::from(ActionableKind::Deal), CrmEntityType::Deal);
        assert_eq!(CrmEntityType::from(ActionableKind::Task), CrmEntityType::Task);
    }
}
