//! Render service HTTP client.

use std::path::Path;

use reqwest::Client;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use qclip_models::{AudioUrls, JobId, QuizQuestion, StyleSpec};

use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::types::{CompositionInfo, CompositionProps, RenderRequest};

/// Client for the render service.
///
/// Composition metadata is an expensive, cacheable lookup: it is resolved
/// once per process, not per job.
pub struct RenderClient {
    http: Client,
    config: RenderConfig,
    composition: OnceCell<CompositionInfo>,
}

impl RenderClient {
    /// Create a new render client.
    pub fn new(config: RenderConfig) -> RenderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(RenderError::Network)?;

        Ok(Self {
            http,
            config,
            composition: OnceCell::new(),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> RenderResult<Self> {
        Self::new(RenderConfig::from_env())
    }

    /// Resolve composition metadata, fetching it at most once per process.
    pub async fn ensure_composition(&self) -> RenderResult<&CompositionInfo> {
        self.composition
            .get_or_try_init(|| async {
                let url = format!(
                    "{}/compositions/{}",
                    self.config.base_url.trim_end_matches('/'),
                    self.config.composition
                );
                debug!("Resolving composition metadata from {}", url);

                let response = self.http.get(&url).send().await?;
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Err(RenderError::CompositionNotFound(
                        self.config.composition.clone(),
                    ));
                }
                if !response.status().is_success() {
                    return Err(RenderError::request_failed(format!(
                        "composition lookup returned {}",
                        response.status()
                    )));
                }

                let info: CompositionInfo = response
                    .json()
                    .await
                    .map_err(RenderError::Network)?;
                info!(composition = %info.id, "Resolved composition metadata");
                Ok(info)
            })
            .await
    }

    /// Check that every audio URL answers with a success status.
    ///
    /// The renderer hangs on unreachable media instead of failing, so this
    /// must run before every render.
    pub async fn validate_audio(&self, audio: &AudioUrls) -> RenderResult<()> {
        let checks = audio.all().map(|url| async move {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|_| RenderError::UnreachableAudio(url.to_string()))?;
            if !response.status().is_success() {
                return Err(RenderError::UnreachableAudio(url.to_string()));
            }
            Ok(())
        });

        futures::future::try_join_all(checks).await?;
        Ok(())
    }

    /// Render one question into `output_path`.
    ///
    /// Validates audio reachability, resolves the composition, invokes the
    /// renderer and writes the produced video file.
    pub async fn render(
        &self,
        job_id: &JobId,
        question: &QuizQuestion,
        style: &StyleSpec,
        audio: &AudioUrls,
        output_path: &Path,
    ) -> RenderResult<()> {
        self.validate_audio(audio).await?;
        let composition = self.ensure_composition().await?;

        let props = CompositionProps::new(
            question,
            style,
            audio,
            self.config.duration_in_frames(),
        );
        let request = RenderRequest {
            composition_id: &composition.id,
            input_props: &props,
        };

        info!(
            job_id = %job_id,
            composition = %composition.id,
            "Invoking renderer"
        );

        let url = format!("{}/render", self.config.base_url.trim_end_matches('/'));
        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(RenderError::request_failed(format!(
                "renderer returned {}: {}",
                status, detail
            )));
        }

        let video = response.bytes().await?;
        if video.is_empty() {
            return Err(RenderError::EmptyOutput);
        }

        tokio::fs::write(output_path, &video).await?;

        info!(
            job_id = %job_id,
            output = %output_path.display(),
            bytes = video.len(),
            "Render complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qclip_models::BackgroundStyle;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> RenderClient {
        RenderClient::new(RenderConfig {
            base_url: base_url.to_string(),
            composition: "QuizScene".to_string(),
            fps: 30,
            duration_seconds: 10,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn sample_question() -> QuizQuestion {
        QuizQuestion {
            text: "Q?".into(),
            options: vec!["a".into(), "b".into()],
            correct_answer_index: 0,
        }
    }

    fn sample_style() -> StyleSpec {
        StyleSpec {
            background_style: BackgroundStyle::Gradient,
            primary_color: Some("#ff0000".into()),
            secondary_color: None,
            font_family: None,
        }
    }

    fn composition_mock() -> Mock {
        Mock::given(method("GET"))
            .and(path("/compositions/QuizScene"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "QuizScene",
                "width": 1080,
                "height": 1920,
                "fps": 30
            })))
    }

    fn staged_audio(server: &MockServer) -> AudioUrls {
        AudioUrls {
            question_audio: format!("{}/audio/q.mp3", server.uri()),
            option_audios: vec![
                format!("{}/audio/o0.mp3", server.uri()),
                format!("{}/audio/o1.mp3", server.uri()),
            ],
        }
    }

    async fn mount_audio(server: &MockServer) {
        for p in ["/audio/q.mp3", "/audio/o0.mp3", "/audio/o1.mp3"] {
            Mock::given(method("GET"))
                .and(path(p))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3".to_vec()))
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn test_composition_resolved_once() {
        let server = MockServer::start().await;
        composition_mock().expect(1).mount(&server).await;
        mount_audio(&server).await;
        Mock::given(method("POST"))
            .and(path("/render"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4data".to_vec()))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output.mp4");

        // Two renders, but the composition mock expects exactly one hit.
        for _ in 0..2 {
            client
                .render(
                    &JobId::from_string("job-1"),
                    &sample_question(),
                    &sample_style(),
                    &staged_audio(&server),
                    &out,
                )
                .await
                .unwrap();
        }
        assert!(out.exists());
    }

    #[tokio::test]
    async fn test_unreachable_audio_blocks_render() {
        let server = MockServer::start().await;
        composition_mock().mount(&server).await;
        // Audio mocks intentionally absent: wiremock answers 404.

        let client = test_client(&server.uri());
        let dir = tempfile::tempdir().unwrap();

        let result = client
            .render(
                &JobId::from_string("job-1"),
                &sample_question(),
                &sample_style(),
                &staged_audio(&server),
                &dir.path().join("output.mp4"),
            )
            .await;

        assert!(matches!(result, Err(RenderError::UnreachableAudio(_))));
        // The renderer must never have been invoked.
        assert!(server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .all(|r| r.url.path() != "/render"));
    }

    #[tokio::test]
    async fn test_empty_output_is_an_error() {
        let server = MockServer::start().await;
        composition_mock().mount(&server).await;
        mount_audio(&server).await;
        Mock::given(method("POST"))
            .and(path("/render"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(Vec::new()))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let dir = tempfile::tempdir().unwrap();

        let result = client
            .render(
                &JobId::from_string("job-1"),
                &sample_question(),
                &sample_style(),
                &staged_audio(&server),
                &dir.path().join("output.mp4"),
            )
            .await;

        assert!(matches!(result, Err(RenderError::EmptyOutput)));
    }

    #[tokio::test]
    async fn test_unknown_composition() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/compositions/QuizScene"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.ensure_composition().await;
        assert!(matches!(result, Err(RenderError::CompositionNotFound(_))));
    }
}
