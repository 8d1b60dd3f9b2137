//! Speech provider configuration.

use std::time::Duration;

use crate::error::{SpeechError, SpeechResult};

/// Configuration for the speech provider client.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Provider endpoint base URL
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// Deployment name for the TTS model
    pub deployment: String,
    /// API version query parameter
    pub api_version: String,
    /// Voice used when the request carries no override
    pub default_voice: String,
    /// Locale used when the request carries no override
    pub default_locale: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl SpeechConfig {
    /// Create config from environment variables.
    ///
    /// Endpoint and key are required; everything else has a default.
    pub fn from_env() -> SpeechResult<Self> {
        Ok(Self {
            endpoint: std::env::var("SPEECH_ENDPOINT")
                .map_err(|_| SpeechError::config_error("SPEECH_ENDPOINT not set"))?,
            api_key: std::env::var("SPEECH_API_KEY")
                .map_err(|_| SpeechError::config_error("SPEECH_API_KEY not set"))?,
            deployment: std::env::var("SPEECH_DEPLOYMENT").unwrap_or_else(|_| "tts".to_string()),
            api_version: std::env::var("SPEECH_API_VERSION")
                .unwrap_or_else(|_| "2025-03-01-preview".to_string()),
            default_voice: std::env::var("SPEECH_DEFAULT_VOICE")
                .unwrap_or_else(|_| "alloy".to_string()),
            default_locale: std::env::var("SPEECH_DEFAULT_LOCALE")
                .unwrap_or_else(|_| "en-US".to_string()),
            timeout: Duration::from_secs(
                std::env::var("SPEECH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        })
    }
}
