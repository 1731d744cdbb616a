//! Call model

use serde::{Deserialize, Serialize};

use super::{EntityId, UserId};

/// A recorded sales call, owned by the sales-assistant side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Unique identifier
    pub id: EntityId,
    /// Owning user
    pub user_id: UserId,
    /// Call title
    pub title: String,
    /// Transcript text, if the call was transcribed
    pub transcription: Option<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Call {
    /// Create a new call with the given title
    #[must_use]
    pub fn new(user_id: UserId, title: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            user_id,
            title: title.into(),
            transcription: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn with_transcription(mut self, transcription: impl Into<String>) -> Self {
        self.transcription = Some(transcription.into());
        self
    }

    /// Note body sent to the CRM: title, blank line, transcript.
    pub fn note_body(&self) -> String {
        match self
            .transcription
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
        {
            Some(transcript) => format!("{}\n\n{}", self.title.trim(), transcript),
            None => self.title.trim().to_string(),
        }
    }
}
