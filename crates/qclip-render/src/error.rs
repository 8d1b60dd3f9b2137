//! Render client error types.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to configure render client: {0}")]
    ConfigError(String),

    #[error("Composition not found: {0}")]
    CompositionNotFound(String),

    #[error("Audio URL unreachable: {0}")]
    UnreachableAudio(String),

    #[error("Render request failed: {0}")]
    RequestFailed(String),

    #[error("Renderer produced no output")]
    EmptyOutput,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }
}
