//! Analysis and chat flows shared by the web dashboard and the CLI.
//!
//! Each flow makes at most one model call and persists only after that
//! call succeeds, so a failed turn leaves the stored profile untouched.
//! Profile file I/O runs on the blocking pool.

use serde::Serialize;
use std::sync::Arc;

use crate::ai_provider::{ChatCompletion, ChatMessage};
use crate::config::Config;
use crate::core::store::normalize_username;
use crate::core::{HealthError, LifestyleInput, ProfileStore, Result, RiskAssessment, UserProfile};
use crate::prompt;

#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    pub history_window: usize,
    pub analysis_temperature: f32,
    pub chat_temperature: f32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            history_window: 10,
            analysis_temperature: 0.3,
            chat_temperature: 0.5,
        }
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            history_window: config.history_window,
            analysis_temperature: config.analysis_temperature,
            chat_temperature: config.chat_temperature,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub reply: String,
    pub history: Vec<ChatMessage>,
}

pub struct HealthService {
    store: Arc<ProfileStore>,
    provider: Arc<dyn ChatCompletion>,
    settings: ServiceSettings,
}

impl HealthService {
    pub fn new(store: ProfileStore, provider: Arc<dyn ChatCompletion>, settings: ServiceSettings) -> Self {
        Self {
            store: Arc::new(store),
            provider,
            settings,
        }
    }

    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&ProfileStore) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store)).await?
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Sidebar login: returns the profile, creating it on first visit.
    pub async fn login(&self, username: &str) -> Result<UserProfile> {
        let username = normalize_username(username)?;
        self.with_store(move |store| store.get_or_create(&username)).await
    }

    pub async fn profile(&self, username: &str) -> Result<UserProfile> {
        let username = normalize_username(username)?;
        self.with_store(move |store| {
            store.get(&username)?.ok_or(HealthError::NotFound(username))
        })
        .await
    }

    /// Local breakdown plus the model's narrative, saved to the profile.
    pub async fn analyze(&self, username: &str, input: LifestyleInput) -> Result<RiskAssessment> {
        let username = normalize_username(username)?;
        let input = input.clamped();
        let local = RiskAssessment::local(&input);

        tracing::info!(user = %username, local_score = local.total_score, "analyzing health risk");

        let reply = self
            .provider
            .complete(&prompt::analysis_messages(&input), self.settings.analysis_temperature)
            .await
            .inspect_err(|e| tracing::warn!(user = %username, error = %e, "analysis request failed"))?;

        let assessment = local.with_narrative(reply);
        if assessment.model_score.is_none() {
            tracing::debug!(user = %username, "model reply carried no Risk Score label");
        }

        let record = assessment.clone();
        self.with_store(move |store| {
            store.update(&username, |profile| profile.record_analysis(input, &record))
        })
        .await?;

        Ok(assessment)
    }

    /// One health-assistant exchange. Only the newest turns are sent; the
    /// full transcript is kept.
    pub async fn chat(&self, username: &str, message: &str) -> Result<ChatTurn> {
        let username = normalize_username(username)?;
        let message = message.trim();
        if message.is_empty() {
            return Err(HealthError::EmptyMessage);
        }

        let owner = username.clone();
        let profile = self.with_store(move |store| store.get_or_create(&owner)).await?;
        let mut history = profile.chat_history;
        history.push(ChatMessage::user(message));

        let messages = prompt::chat_messages(&history, self.settings.history_window);
        tracing::info!(user = %username, turns = messages.len() - 1, "sending chat turn");

        let reply = self
            .provider
            .complete(&messages, self.settings.chat_temperature)
            .await
            .inspect_err(|e| tracing::warn!(user = %username, error = %e, "chat request failed"))?;

        let (message, answer) = (message.to_string(), reply.clone());
        let updated = self
            .with_store(move |store| {
                store.update(&username, |profile| profile.push_exchange(&message, answer))
            })
            .await?;

        Ok(ChatTurn {
            reply,
            history: updated.chat_history,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ai_provider::{AIProvider, ProviderError, Role};
    use crate::core::StressLevel;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Canned replies; records every request it receives.
    pub(crate) struct MockCompletion {
        reply: Option<String>,
        pub(crate) requests: Mutex<Vec<(Vec<ChatMessage>, f32)>>,
    }

    impl MockCompletion {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatCompletion for MockCompletion {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            temperature: f32,
        ) -> std::result::Result<String, ProviderError> {
            self.requests
                .lock()
                .unwrap()
                .push((messages.to_vec(), temperature));
            self.reply.clone().ok_or(ProviderError::Api {
                provider: AIProvider::Groq,
                status: 503,
                body: "unavailable".to_string(),
            })
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    pub(crate) fn create_test_service(mock: Arc<MockCompletion>) -> (TempDir, HealthService) {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::new(dir.path().join("profiles.json")).unwrap();
        let service = HealthService::new(store, mock, ServiceSettings::default());
        (dir, service)
    }

    #[tokio::test]
    async fn test_analyze_persists_result() {
        let mock = Arc::new(MockCompletion::replying("Risk Score: 42\nRisk Level: Moderate"));
        let (_dir, service) = create_test_service(mock.clone());
        let input = LifestyleInput::new(7, 3, 6, 6, StressLevel::Medium);

        let assessment = service.analyze("alice", input).await.unwrap();
        assert_eq!(assessment.total_score, 35);
        assert_eq!(assessment.component_scores.exercise, 12);
        assert_eq!(assessment.model_score, Some(42));

        let profile = service.profile("alice").await.unwrap();
        assert_eq!(profile.last_inputs, Some(input));
        assert_eq!(profile.last_score, Some(35));
        assert!(profile.last_result.starts_with("Risk Score: 42"));

        let requests = mock.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, 0.3);
        assert!(requests[0].0[0].content.contains("Stress: Medium"));
    }

    #[tokio::test]
    async fn test_analyze_clamps_out_of_range_input() {
        let mock = Arc::new(MockCompletion::replying("fine"));
        let (_dir, service) = create_test_service(mock);
        let input = LifestyleInput::new(20, 10, 30, 30, StressLevel::Low);

        let assessment = service.analyze("alice", input).await.unwrap();
        assert!(assessment.component_scores.iter().all(|(_, v)| v >= 0));
        assert_eq!(assessment.model_score, None);
    }

    #[tokio::test]
    async fn test_failed_analysis_leaves_profile_unchanged() {
        let mock = Arc::new(MockCompletion::failing());
        let (_dir, service) = create_test_service(mock);
        service.login("alice").await.unwrap();

        let result = service.analyze("alice", LifestyleInput::default()).await;
        assert!(matches!(result, Err(HealthError::Provider(_))));

        let profile = service.profile("alice").await.unwrap();
        assert!(profile.last_inputs.is_none());
        assert!(!profile.has_result());
    }

    #[tokio::test]
    async fn test_chat_appends_exchange() {
        let mock = Arc::new(MockCompletion::replying("Drink water."));
        let (_dir, service) = create_test_service(mock.clone());

        let turn = service.chat("bob", "How do I sleep better?").await.unwrap();
        assert_eq!(turn.reply, "Drink water.");
        assert_eq!(turn.history.len(), 2);
        assert_eq!(turn.history[0].role, Role::User);
        assert_eq!(turn.history[1].role, Role::Assistant);

        let requests = mock.requests.lock().unwrap();
        let (messages, temperature) = &requests[0];
        assert_eq!(*temperature, 0.5);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "How do I sleep better?");
    }

    #[tokio::test]
    async fn test_chat_sends_only_recent_window() {
        let mock = Arc::new(MockCompletion::replying("ok"));
        let (_dir, service) = create_test_service(mock.clone());

        for i in 0..7 {
            service.chat("bob", &format!("question {}", i)).await.unwrap();
        }

        let profile = service.profile("bob").await.unwrap();
        assert_eq!(profile.chat_history.len(), 14);

        let requests = mock.requests.lock().unwrap();
        let (last, _) = requests.last().unwrap();
        // system + 10 turns of history
        assert_eq!(last.len(), 11);
        assert_eq!(last.last().unwrap().content, "question 6");
    }

    #[tokio::test]
    async fn test_failed_chat_keeps_history() {
        let mock = Arc::new(MockCompletion::failing());
        let (_dir, service) = create_test_service(mock);

        assert!(service.chat("bob", "hello").await.is_err());
        assert!(service.profile("bob").await.unwrap().chat_history.is_empty());
    }

    #[tokio::test]
    async fn test_chat_rejects_blank_input() {
        let mock = Arc::new(MockCompletion::replying("ok"));
        let (_dir, service) = create_test_service(mock.clone());

        assert!(matches!(service.chat("bob", "  ").await, Err(HealthError::EmptyMessage)));
        assert!(matches!(service.chat(" ", "hi").await, Err(HealthError::InvalidUsername(_))));
        assert!(mock.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_profile() {
        let mock = Arc::new(MockCompletion::replying("ok"));
        let (_dir, service) = create_test_service(mock);
        assert!(matches!(service.profile("ghost").await, Err(HealthError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_logins_share_one_store() {
        let mock = Arc::new(MockCompletion::replying("ok"));
        let (_dir, service) = create_test_service(mock);
        let service = Arc::new(service);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.login(&format!("user{}", i)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.store.usernames().unwrap().len(), 8);
    }
}
