//! CRM client abstraction and HubSpot implementation

mod hubspot;
mod mapping;

use serde::Serialize;

use crate::error::Result;
use crate::models::CrmEntityType;

pub use hubspot::{HubSpotClient, DEFAULT_BASE_URL};
pub use mapping::{note_for_call, request_for_actionable, DealDefaults};

/// `hs_note_body` engagement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteProperties {
    pub hs_timestamp: String,
    pub hs_note_body: String,
}

/// HubSpot task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    NotStarted,
    Completed,
}

/// HubSpot task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskProperties {
    pub hs_task_subject: String,
    pub hs_task_body: String,
    pub hs_task_status: TaskStatus,
    pub hs_task_priority: TaskPriority,
    pub hs_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DealProperties {
    pub dealname: String,
    pub amount: String,
    pub dealstage: String,
    pub pipeline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closedate: Option<String>,
}

/// One create call against the CRM
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrmRequest {
    Note(NoteProperties),
    Task(TaskProperties),
    Deal(DealProperties),
}

impl CrmRequest {
    pub const fn crm_entity_type(&self) -> CrmEntityType {
        match self {
            Self::Note(_) => CrmEntityType::Note,
            Self::Task(_) => CrmEntityType::Task,
            Self::Deal(_) => CrmEntityType::Deal,
        }
    }
}

/// Outbound CRM operations, authenticated per call with the user's credential.
///
/// Each method issues exactly one create request and returns the CRM object ID.
#[allow(async_fn_in_trait)]
pub trait CrmClient {
    async fn create_note(&self, api_key: &str, note: &NoteProperties) -> Result<String>;

    async fn create_task(&self, api_key: &str, task: &TaskProperties) -> Result<String>;

    async fn create_deal(&self, api_key: &str, deal: &DealProperties) -> Result<String>;

    /// Route a request to the matching create call
    async fn create(&self, api_key: &str, request: &CrmRequest) -> Result<String> {
        match request {
            CrmRequest::Note(note) => self.create_note(api_key, note).await,
            CrmRequest::Task(task) => self.create_task(api_key, task).await,
            CrmRequest::Deal(deal) => self.create_deal(api_key, deal).await,
        }
    }
}
