//! Actionable model (follow-up items extracted from calls)

use serde::{Deserialize, Serialize};

use super::{EntityId, UserId};

/// Which CRM object an actionable becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActionableKind {
    #[default]
    Task,
    Deal,
}

/// Actionable priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Actionable completion status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActionableStatus {
    #[default]
    Pending,
    Completed,
}

text_enum!(ActionableKind { Task => "task", Deal => "deal" });
text_enum!(Priority { Low => "low", Medium => "medium", High => "high" });
text_enum!(ActionableStatus { Pending => "pending", Completed => "completed" });

/// A follow-up item (task or deal) produced by the sales assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actionable {
    pub id: EntityId,
    pub user_id: UserId,
    /// Call this actionable was extracted from
    pub call_id: Option<EntityId>,
    pub kind: ActionableKind,
    pub title: String,
    pub description: Option<String>,
    /// Due date (Unix ms)
    pub due_date: Option<i64>,
    pub priority: Priority,
    pub status: ActionableStatus,
    /// Deal amount, only meaningful for deals
    pub amount: Option<f64>,
    /// CRM object ID written back after a successful sync
    pub crm_id: Option<String>,
    /// When the CRM ID was written back (Unix ms)
    pub synced_at: Option<i64>,
    pub created_at: i64,
}

impl Actionable {
    /// Create a new pending actionable
    #[must_use]
    pub fn new(user_id: UserId, kind: ActionableKind, title: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            user_id,
            call_id: None,
            kind,
            title: title.into(),
            description: None,
            due_date: None,
            priority: Priority::default(),
            status: ActionableStatus::default(),
            amount: None,
            crm_id: None,
            synced_at: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Whether a CRM ID has been written back
    pub const fn is_synced(&self) -> bool {
        self.crm_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" deal ".parse::<ActionableKind>().unwrap(), ActionableKind::Deal);
        assert_eq!(
            "completed".parse::<ActionableStatus>().unwrap(),
            ActionableStatus::Completed
        );
    }

    #[test]
    fn unknown_enum_value_is_invalid_input() {
        let error = "urgent".parse::<Priority>().unwrap_err();
        assert!(error.to_string().contains("unknown Priority 'urgent'"));
    }

    #[test]
    fn new_actionable_is_unsynced_task_defaults() {
        let item = Actionable::new(UserId::new("rep-1").unwrap(), ActionableKind::Task, "Send deck");
        assert!(!item.is_synced());
        assert_eq!(item.priority, Priority::Medium);
        assert_eq!(item.status, ActionableStatus::Pending);
    }
}
