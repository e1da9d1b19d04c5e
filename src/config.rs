use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};

use crate::ai_provider::{AIConfig, AIProvider};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_providers")]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default = "default_profile_file")]
    pub profile_file: String,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Chat turns sent to the model per request
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_analysis_temperature")]
    pub analysis_temperature: f32,
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Reply length cap passed to the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub default_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl ProviderConfig {
    /// Fill an empty key from the configured environment variable.
    fn resolve_api_key(&mut self) {
        if self.api_key.as_ref().map_or(true, |key| key.is_empty()) {
            if let Some(var) = &self.api_key_env {
                self.api_key = std::env::var(var).ok().filter(|key| !key.is_empty());
            }
        }
    }
}

fn default_provider() -> String {
    "groq".to_string()
}

fn default_providers() -> HashMap<String, ProviderConfig> {
    let mut providers = HashMap::new();

    providers.insert("groq".to_string(), ProviderConfig {
        default_model: "openai/gpt-oss-120b".to_string(),
        host: None,
        api_key: None,
        api_key_env: Some("GROQ_API_KEY".to_string()),
    });

    providers.insert("openai".to_string(), ProviderConfig {
        default_model: "gpt-4o-mini".to_string(),
        host: None,
        api_key: None,
        api_key_env: Some("OPENAI_API_KEY".to_string()),
    });

    providers.insert("ollama".to_string(), ProviderConfig {
        default_model: "llama3".to_string(),
        host: Some("http://localhost:11434".to_string()),
        api_key: None,
        api_key_env: None,
    });

    providers
}

fn default_profile_file() -> String {
    "profiles.json".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

fn default_history_window() -> usize {
    10
}

fn default_analysis_temperature() -> f32 {
    0.3
}

fn default_chat_temperature() -> f32 {
    0.5
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("healthgpt")
        });

        // Ensure data directory exists
        std::fs::create_dir_all(&data_dir)
            .context("Failed to create data directory")?;

        let config_path = data_dir.join("config.json");

        let mut config = if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .context("Failed to read config.json")?;

            if config_str.trim().is_empty() {
                tracing::warn!(path = %config_path.display(), "config file is empty, recreating defaults");
                Self::write_default(data_dir.clone())?
            } else {
                serde_json::from_str::<Config>(&config_str)
                    .with_context(|| format!("Failed to parse {}", config_path.display()))?
            }
        } else {
            Self::write_default(data_dir.clone())?
        };

        config.data_dir = data_dir;
        for provider in config.providers.values_mut() {
            provider.resolve_api_key();
        }

        Ok(config)
    }

    fn write_default(data_dir: PathBuf) -> Result<Self> {
        let config = Self::default_config(data_dir);
        config.save()?;
        tracing::info!(path = %config.data_dir.join("config.json").display(), "wrote default config");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = self.data_dir.join("config.json");
        let json_str = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(&config_path, json_str)
            .context("Failed to write config.json")?;
        Ok(())
    }

    pub fn default_config(data_dir: PathBuf) -> Self {
        Config {
            data_dir,
            default_provider: default_provider(),
            providers: default_providers(),
            profile_file: default_profile_file(),
            bind: default_bind(),
            history_window: default_history_window(),
            analysis_temperature: default_analysis_temperature(),
            chat_temperature: default_chat_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            max_tokens: None,
        }
    }

    pub fn get_provider(&self, provider_name: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider_name)
    }

    pub fn get_ai_config(&self, provider: Option<String>, model: Option<String>) -> Result<AIConfig> {
        let provider_name = provider.as_deref().unwrap_or(&self.default_provider);
        let provider_config = self.get_provider(provider_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown provider: {}", provider_name))?;

        let ai_provider: AIProvider = provider_name.parse()?;
        let model_name = model.unwrap_or_else(|| provider_config.default_model.clone());

        if ai_provider.requires_api_key() && provider_config.api_key.is_none() {
            let hint = provider_config
                .api_key_env
                .as_deref()
                .map(|var| format!("set {} or add api_key to config.json", var))
                .unwrap_or_else(|| "add api_key to config.json".to_string());
            anyhow::bail!("{} API key not found: {}", ai_provider, hint);
        }

        Ok(AIConfig {
            provider: ai_provider,
            model: model_name,
            api_key: provider_config.api_key.clone(),
            base_url: provider_config.host.clone(),
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }

    pub fn profile_path(&self) -> PathBuf {
        self.data_dir.join(&self.profile_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_default_config() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();

        assert!(dir.path().join("config.json").exists());
        assert_eq!(config.default_provider, "groq");
        assert_eq!(config.history_window, 10);
        assert_eq!(config.profile_path(), dir.path().join("profiles.json"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"default_provider": "ollama", "bind": "0.0.0.0:9000"}"#,
        )
        .unwrap();

        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(config.default_provider, "ollama");
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.chat_temperature, 0.5);
        assert!(config.get_provider("groq").is_some());
    }

    #[test]
    fn test_ai_config_from_file_key() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"providers": {"groq": {"default_model": "llama3-70b-8192", "api_key": "gsk_test"}}}"#,
        )
        .unwrap();

        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();
        let ai = config.get_ai_config(None, None).unwrap();
        assert_eq!(ai.provider, AIProvider::Groq);
        assert_eq!(ai.model, "llama3-70b-8192");
        assert_eq!(ai.api_key.as_deref(), Some("gsk_test"));

        let ai = config.get_ai_config(None, Some("other".into())).unwrap();
        assert_eq!(ai.model, "other");
    }

    #[test]
    fn test_max_tokens_reaches_ai_config() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(config.max_tokens, None);
        let ai = config.get_ai_config(Some("ollama".into()), None).unwrap();
        assert_eq!(ai.max_tokens, None);

        std::fs::write(
            dir.path().join("config.json"),
            r#"{"default_provider": "ollama", "max_tokens": 800}"#,
        )
        .unwrap();
        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();
        let ai = config.get_ai_config(None, None).unwrap();
        assert_eq!(ai.max_tokens, Some(800));
    }

    #[test]
    fn test_missing_key_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"providers": {"groq": {"default_model": "m", "api_key_env": "HEALTHGPT_TEST_UNSET_KEY"}}}"#,
        )
        .unwrap();

        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();
        let err = config.get_ai_config(None, None).unwrap_err();
        assert!(err.to_string().contains("HEALTHGPT_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_unknown_provider() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();
        assert!(config.get_ai_config(Some("claude".into()), None).is_err());
    }

    #[test]
    fn test_ollama_without_key() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();
        let ai = config.get_ai_config(Some("ollama".into()), None).unwrap();
        assert_eq!(ai.provider, AIProvider::Ollama);
        assert!(ai.api_key.is_none());
    }
}
