use thiserror::Error;

use crate::ai_provider::ProviderError;

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Chat message is empty")]
    EmptyMessage,

    #[error("Chat completion failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, HealthError>;
