use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::assessment::RiskAssessment;
use super::risk::LifestyleInput;
use crate::ai_provider::ChatMessage;

/// Per-username record kept in the profile file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Last submitted form; `{}` in older files means none yet.
    #[serde(default, deserialize_with = "empty_object_as_none")]
    pub last_inputs: Option<LifestyleInput>,

    /// Local total of the last analysis
    #[serde(default)]
    pub last_score: Option<i32>,

    /// Score the model declared in its last reply, if it declared one
    #[serde(default)]
    pub last_model_score: Option<u32>,

    /// Narrative of the last analysis, empty until the first one
    #[serde(default)]
    pub last_result: String,

    /// Full transcript; only a window of it is sent to the model
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for UserProfile {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            last_inputs: None,
            last_score: None,
            last_model_score: None,
            last_result: String::new(),
            chat_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inputs to pre-fill the form with.
    pub fn inputs_or_default(&self) -> LifestyleInput {
        self.last_inputs.unwrap_or_default()
    }

    pub fn has_result(&self) -> bool {
        !self.last_result.is_empty()
    }

    pub fn record_analysis(&mut self, input: LifestyleInput, assessment: &RiskAssessment) {
        self.last_inputs = Some(input);
        self.last_score = Some(assessment.total_score);
        self.last_model_score = assessment.model_score;
        self.last_result = assessment.narrative_text.clone().unwrap_or_default();
        self.touch();
    }

    /// Append a completed exchange. Both turns land together or not at all.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.chat_history.push(ChatMessage::user(user));
        self.chat_history.push(ChatMessage::assistant(assistant));
        self.touch();
    }

    /// The most recent `window` turns, oldest first.
    pub fn recent_history(&self, window: usize) -> &[ChatMessage] {
        let start = self.chat_history.len().saturating_sub(window);
        &self.chat_history[start..]
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn empty_object_as_none<'de, D>(deserializer: D) -> Result<Option<LifestyleInput>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) if map.is_empty() => Ok(None),
        _ => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
