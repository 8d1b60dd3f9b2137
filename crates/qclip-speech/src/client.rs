//! Speech provider HTTP client.

use std::path::Path;

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use qclip_models::VoiceSpec;

use crate::config::SpeechConfig;
use crate::error::{SpeechError, SpeechResult};
use crate::synthesis::is_valid_voice_name;

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    input: &'a str,
    voice: String,
}

/// Client for the voice synthesis provider.
pub struct SpeechClient {
    http: Client,
    config: SpeechConfig,
}

impl SpeechClient {
    /// Create a new speech client.
    pub fn new(config: SpeechConfig) -> SpeechResult<Self> {
        if config.endpoint.is_empty() || config.api_key.is_empty() {
            return Err(SpeechError::config_error(
                "speech endpoint and API key are required",
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(SpeechError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> SpeechResult<Self> {
        Self::new(SpeechConfig::from_env()?)
    }

    /// Configured default locale (fallback when requests carry no voice).
    pub fn default_locale(&self) -> &str {
        &self.config.default_locale
    }

    fn speech_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/audio/speech",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment
        )
    }

    /// Synthesize `text` into an mp3 file at `output_path`.
    ///
    /// Creates the parent directory if needed. Any non-success provider
    /// status becomes a `SpeechError::RequestFailed` carrying the response
    /// body for diagnosis.
    pub async fn synthesize(
        &self,
        text: &str,
        output_path: &Path,
        voice: Option<&VoiceSpec>,
    ) -> SpeechResult<()> {
        let voice_name = voice
            .map(|v| v.name.as_str())
            .unwrap_or(&self.config.default_voice);

        if !is_valid_voice_name(voice_name) {
            return Err(SpeechError::InvalidVoice(voice_name.to_string()));
        }

        debug!(
            voice = voice_name,
            output = %output_path.display(),
            "Synthesizing {} chars",
            text.len()
        );

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = SynthesisRequest {
            input: text,
            voice: voice_name.to_lowercase(),
        };

        let response = self
            .http
            .post(self.speech_url())
            .query(&[("api-version", self.config.api_version.as_str())])
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SpeechError::request_failed(format!(
                "provider returned {}: {}",
                status, detail
            )));
        }

        let audio = response.bytes().await?;
        tokio::fs::write(output_path, &audio).await?;

        debug!(
            output = %output_path.display(),
            bytes = audio.len(),
            "Synthesis complete"
        );
        Ok(())
    }
}
