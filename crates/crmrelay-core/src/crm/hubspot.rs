//! HubSpot CRM v3 objects client.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{compact_text, is_http_url, normalize_text_option};

use super::{CrmClient, DealProperties, NoteProperties, TaskProperties};

pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";

#[derive(Debug, Clone)]
pub struct HubSpotClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CreateObjectRequest<'a, P> {
    properties: &'a P,
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HubSpotErrorBody {
    message: Option<String>,
    category: Option<String>,
}

impl HubSpotClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                Error::Configuration(format!("failed to build HubSpot HTTP client: {error}"))
            })?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn create_object<P: Serialize + Sync>(
        &self,
        api_key: &str,
        object_type: &str,
        properties: &P,
    ) -> Result<String> {
        let url = format!("{}/crm/v3/objects/{object_type}", self.base_url);
        tracing::debug!(object_type, "Creating HubSpot object");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&CreateObjectRequest { properties })
            .send()
            .await
            .map_err(|error| {
                Error::ExternalService(format!("HubSpot request failed: {}", sanitize(&error)))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ExternalService(parse_api_error(status, &body)));
        }

        let payload = response.json::<CreatedObject>().await.map_err(|error| {
            Error::ExternalService(format!(
                "HubSpot response parse failed: {}",
                sanitize(&error)
            ))
        })?;

        normalize_text_option(payload.id).ok_or_else(|| {
            Error::ExternalService(format!("HubSpot did not return an id for {object_type}"))
        })
    }
}

impl CrmClient for HubSpotClient {
    async fn create_note(&self, api_key: &str, note: &NoteProperties) -> Result<String> {
        self.create_object(api_key, "notes", note).await
    }

    async fn create_task(&self, api_key: &str, task: &TaskProperties) -> Result<String> {
        self.create_object(api_key, "tasks", task).await
    }

    async fn create_deal(&self, api_key: &str, deal: &DealProperties) -> Result<String> {
        self.create_object(api_key, "deals", deal).await
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<HubSpotErrorBody>(body) {
        if let Some(message) = normalize_text_option(payload.message) {
            return match payload.category {
                Some(category) => format!("{category}: {message} (HTTP {})", status.as_u16()),
                None => format!("{message} (HTTP {})", status.as_u16()),
            };
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{trimmed} (HTTP {})", status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        Error::Configuration("HubSpot base URL must not be empty".to_string())
    })?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(Error::Configuration(
            "HubSpot base URL must include http:// or https://".to_string(),
        ))
    }
}

fn sanitize(error: &impl std::fmt::Display) -> String {
    error.to_string().replace('\n', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::{TaskPriority, TaskStatus};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HubSpotClient {
        HubSpotClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn note() -> NoteProperties {
        NoteProperties {
            hs_timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            hs_note_body: "Call notes".to_string(),
        }
    }

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url(String::new()).is_err());
        assert!(normalize_base_url("api.hubapi.com".to_string()).is_err());
        assert_eq!(
            normalize_base_url(" https://api.hubapi.com/ ".to_string()).unwrap(),
            "https://api.hubapi.com"
        );
    }

    #[test]
    fn parse_api_error_prefers_hubspot_message() {
        let body = r#"{"status":"error","message":"Property values were not valid","category":"VALIDATION_ERROR"}"#;
        assert_eq!(
            parse_api_error(StatusCode::BAD_REQUEST, body),
            "VALIDATION_ERROR: Property values were not valid (HTTP 400)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down (HTTP 502)"
        );
    }

    #[tokio::test]
    async fn create_note_posts_properties_with_bearer_token() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/crm/v3/objects/notes"))
            .and(header("authorization", "Bearer pat-na1-token"))
            .and(body_json(json!({
                "properties": {
                    "hs_timestamp": "2024-01-01T00:00:00.000Z",
                    "hs_note_body": "Call notes"
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "5150" })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let id = client(&mock_server)
            .create_note("pat-na1-token", &note())
            .await
            .unwrap();
        assert_eq!(id, "5150");
    }

    #[tokio::test]
    async fn create_task_serializes_hubspot_enums() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/crm/v3/objects/tasks"))
            .and(body_json(json!({
                "properties": {
                    "hs_task_subject": "Send deck",
                    "hs_task_body": "",
                    "hs_task_status": "NOT_STARTED",
                    "hs_task_priority": "HIGH",
                    "hs_timestamp": "2024-01-01T00:00:00.000Z"
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "77" })))
            .mount(&mock_server)
            .await;

        let task = TaskProperties {
            hs_task_subject: "Send deck".to_string(),
            hs_task_body: String::new(),
            hs_task_status: TaskStatus::NotStarted,
            hs_task_priority: TaskPriority::High,
            hs_timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        };
        let id = client(&mock_server).create_task("key", &task).await.unwrap();
        assert_eq!(id, "77");
    }

    #[tokio::test]
    async fn unauthorized_response_is_external_service_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/crm/v3/objects/notes"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": "error",
                "message": "Authentication credentials not found",
                "category": "INVALID_AUTHENTICATION"
            })))
            .mount(&mock_server)
            .await;

        let error = client(&mock_server)
            .create_note("bad", &note())
            .await
            .unwrap_err();
        match error {
            Error::ExternalService(message) => {
                assert!(message.contains("INVALID_AUTHENTICATION"));
                assert!(message.contains("HTTP 401"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_id_in_response_is_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/crm/v3/objects/deals"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": " " })))
            .mount(&mock_server)
            .await;

        let deal = DealProperties {
            dealname: "Renewal".to_string(),
            amount: "0".to_string(),
            dealstage: "appointmentscheduled".to_string(),
            pipeline: "default".to_string(),
            closedate: None,
        };
        let error = client(&mock_server)
            .create_deal("key", &deal)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("did not return an id"));
    }
}
