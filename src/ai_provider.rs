use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIProvider {
    Groq,
    OpenAI,
    Ollama,
}

impl AIProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            AIProvider::Groq => GROQ_BASE_URL,
            AIProvider::OpenAI => OPENAI_BASE_URL,
            AIProvider::Ollama => OLLAMA_BASE_URL,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, AIProvider::Ollama)
    }
}

impl std::fmt::Display for AIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AIProvider::Groq => write!(f, "groq"),
            AIProvider::OpenAI => write!(f, "openai"),
            AIProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for AIProvider {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(AIProvider::Groq),
            "openai" | "gpt" => Ok(AIProvider::OpenAI),
            "ollama" => Ok(AIProvider::Ollama),
            _ => Err(ProviderError::UnknownProvider(s.to_string())),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unknown AI provider: {0}")]
    UnknownProvider(String),

    #[error("{0} API key required")]
    MissingApiKey(AIProvider),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: AIProvider,
        status: u16,
        body: String,
    },

    #[error("Invalid {0} response format")]
    InvalidResponse(AIProvider),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Anything that turns a conversation into one assistant reply.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32)
        -> Result<String, ProviderError>;

    fn model(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct AIConfig {
    pub provider: AIProvider,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Reply length cap; provider default when unset
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl Default for AIConfig {
    fn default() -> Self {
        AIConfig {
            provider: AIProvider::Groq,
            model: "openai/gpt-oss-120b".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: None,
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct AIProviderClient {
    config: AIConfig,
    http_client: reqwest::Client,
}

impl AIProviderClient {
    pub fn new(config: AIConfig) -> Result<Self, ProviderError> {
        if config.provider.requires_api_key()
            && config.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(ProviderError::MissingApiKey(config.provider));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(AIProviderClient {
            config,
            http_client,
        })
    }

    pub fn get_provider(&self) -> AIProvider {
        self.config.provider
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.config.provider.default_base_url())
            .trim_end_matches('/')
    }

    async fn chat_openai_compatible(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let provider = self.config.provider;
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(ProviderError::MissingApiKey(provider))?;

        let request_body = openai_request_body(&self.config, messages, temperature);
        let url = format!("{}/chat/completions", self.base_url());

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider,
                status: status.as_u16(),
                body,
            });
        }

        let response_json: Value = response.json().await?;
        if let Some(tokens) = response_json["usage"]["total_tokens"].as_u64() {
            tracing::debug!(%provider, model = %self.config.model, tokens, "chat completion usage");
        }

        openai_reply_content(&response_json).ok_or(ProviderError::InvalidResponse(provider))
    }

    async fn chat_ollama(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let request_body = ollama_request_body(&self.config, messages, temperature);
        let url = format!("{}/api/chat", self.base_url());
        let response = self
            .http_client
            .post(&url)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: AIProvider::Ollama,
                status: status.as_u16(),
                body,
            });
        }

        let response_json: Value = response.json().await?;
        response_json["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(ProviderError::InvalidResponse(AIProvider::Ollama))
    }
}

#[async_trait]
impl ChatCompletion for AIProviderClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, ProviderError> {
        match self.config.provider {
            AIProvider::Groq | AIProvider::OpenAI => {
                self.chat_openai_compatible(messages, temperature).await
            }
            AIProvider::Ollama => self.chat_ollama(messages, temperature).await,
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

fn openai_request_body(config: &AIConfig, messages: &[ChatMessage], temperature: f32) -> Value {
    let mut body = json!({
        "model": config.model,
        "messages": messages,
        "temperature": temperature
    });
    if let Some(max_tokens) = config.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    body
}

fn ollama_request_body(config: &AIConfig, messages: &[ChatMessage], temperature: f32) -> Value {
    let mut body = json!({
        "model": config.model,
        "messages": messages,
        "stream": false,
        "options": { "temperature": temperature }
    });
    if let Some(max_tokens) = config.max_tokens {
        body["options"]["num_predict"] = json!(max_tokens);
    }
    body
}

fn openai_reply_content(response: &Value) -> Option<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
}
