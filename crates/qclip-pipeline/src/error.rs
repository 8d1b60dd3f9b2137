//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Staging server not ready: {0}")]
    NotReady(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] qclip_speech::SpeechError),

    #[error("Render failed: {0}")]
    Render(#[from] qclip_render::RenderError),

    #[error("Upload failed: {0}")]
    Upload(#[from] qclip_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Name of the pipeline stage this error belongs to, for status
    /// messages and logs.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::ConfigError(_) => "configuration",
            PipelineError::NotReady(_) => "staging",
            PipelineError::Resource(_) => "resources",
            PipelineError::Synthesis(_) => "synthesis",
            PipelineError::Render(_) => "render",
            PipelineError::Upload(_) => "upload",
            PipelineError::Io(_) => "io",
        }
    }
}
