//! Field mapping from internal entities to CRM request shapes

use crate::models::{Actionable, ActionableKind, ActionableStatus, Call, Priority};
use crate::util::millis_to_rfc3339;

use super::{CrmRequest, DealProperties, NoteProperties, TaskPriority, TaskProperties, TaskStatus};

/// Pipeline placement for newly created deals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealDefaults {
    pub stage: String,
    pub pipeline: String,
}

impl Default for DealDefaults {
    fn default() -> Self {
        Self {
            stage: "appointmentscheduled".to_string(),
            pipeline: "default".to_string(),
        }
    }
}

/// Map a call to a note engagement
pub fn note_for_call(call: &Call) -> NoteProperties {
    NoteProperties {
        hs_timestamp: millis_to_rfc3339(call.created_at),
        hs_note_body: call.note_body(),
    }
}

/// Map an actionable to a task or deal, selected by its kind.
///
/// `now_ms` stands in for the task timestamp when no due date is set.
pub fn request_for_actionable(
    actionable: &Actionable,
    deals: &DealDefaults,
    now_ms: i64,
) -> CrmRequest {
    match actionable.kind {
        ActionableKind::Task => CrmRequest::Task(TaskProperties {
            hs_task_subject: actionable.title.trim().to_string(),
            hs_task_body: actionable.description.clone().unwrap_or_default(),
            hs_task_status: match actionable.status {
                ActionableStatus::Pending => TaskStatus::NotStarted,
                ActionableStatus::Completed => TaskStatus::Completed,
            },
            hs_task_priority: match actionable.priority {
                Priority::Low => TaskPriority::Low,
                Priority::Medium => TaskPriority::Medium,
                Priority::High => TaskPriority::High,
            },
            hs_timestamp: millis_to_rfc3339(actionable.due_date.unwrap_or(now_ms)),
        }),
        ActionableKind::Deal => CrmRequest::Deal(DealProperties {
            dealname: actionable.title.trim().to_string(),
            amount: format_amount(actionable.amount.unwrap_or(0.0)),
            dealstage: deals.stage.clone(),
            pipeline: deals.pipeline.clone(),
            closedate: actionable.due_date.map(millis_to_rfc3339),
        }),
    }
}

fn format_amount(amount: f64) -> String {
    if amount.fract().abs() < f64::EPSILON {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use pretty_assertions::assert_eq;

    fn user() -> UserId {
        UserId::new("rep-1").unwrap()
    }

    #[test]
    fn call_maps_to_note_with_transcript() {
        let mut call = Call::new(user(), "Demo").with_transcription("Went well");
        call.created_at = 0;

        let note = note_for_call(&call);
        assert_eq!(
            note,
            NoteProperties {
                hs_timestamp: "1970-01-01T00:00:00.000Z".to_string(),
                hs_note_body: "Demo\n\nWent well".to_string(),
            }
        );
    }

    #[test]
    fn task_maps_priority_status_and_due_date() {
        let mut task = Actionable::new(user(), ActionableKind::Task, "Send pricing");
        task.priority = Priority::High;
        task.status = ActionableStatus::Completed;
        task.due_date = Some(86_400_000);

        let CrmRequest::Task(props) = request_for_actionable(&task, &DealDefaults::default(), 5)
        else {
            panic!("expected task request");
        };
        assert_eq!(props.hs_task_priority, TaskPriority::High);
        assert_eq!(props.hs_task_status, TaskStatus::Completed);
        assert_eq!(props.hs_timestamp, "1970-01-02T00:00:00.000Z");
        assert_eq!(props.hs_task_body, "");
    }

    #[test]
    fn task_without_due_date_uses_now() {
        let task = Actionable::new(user(), ActionableKind::Task, "Call back");
        let CrmRequest::Task(props) = request_for_actionable(&task, &DealDefaults::default(), 0)
        else {
            panic!("expected task request");
        };
        assert_eq!(props.hs_timestamp, "1970-01-01T00:00:00.000Z");
        assert_eq!(props.hs_task_status, TaskStatus::NotStarted);
        assert_eq!(props.hs_task_priority, TaskPriority::Medium);
    }

    #[test]
    fn deal_uses_pipeline_defaults() {
        let mut deal = Actionable::new(user(), ActionableKind::Deal, "Renewal");
        deal.amount = Some(1500.5);

        let request = request_for_actionable(&deal, &DealDefaults::default(), 0);
        assert_eq!(request.crm_entity_type(), crate::models::CrmEntityType::Deal);
        let json = match request {
            CrmRequest::Deal(props) => serde_json::to_value(props).unwrap(),
            other => panic!("expected deal, got {other:?}"),
        };
        assert_eq!(
            json,
            serde_json::json!({
                "dealname": "Renewal",
                "amount": "1500.50",
                "dealstage": "appointmentscheduled",
                "pipeline": "default"
            })
        );
    }

    #[test]
    fn whole_amounts_have_no_decimals() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(2500.0), "2500");
    }
}
