//! Collaborator seams for the pipeline.
//!
//! The orchestrator talks to synthesis, rendering and storage through
//! these traits so tests can substitute in-process fakes for the real
//! network clients.

use std::path::Path;

use async_trait::async_trait;

use qclip_models::{AudioAsset, AudioUrls, JobId, QuizQuestion, StyleSpec, VoiceSpec};
use qclip_render::RenderClient;
use qclip_speech::SpeechClient;
use qclip_storage::StorageClient;

use crate::error::PipelineResult;

/// Text-to-speech synthesis for a whole quiz.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Write audio for every question and option under `job_dir`, one
    /// asset per question.
    async fn synthesize_quiz(
        &self,
        job_dir: &Path,
        questions: &[QuizQuestion],
        voice: Option<&VoiceSpec>,
    ) -> PipelineResult<Vec<AudioAsset>>;
}

/// Video rendering for a single question.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        job_id: &JobId,
        question: &QuizQuestion,
        style: &StyleSpec,
        audio: &AudioUrls,
        output_path: &Path,
    ) -> PipelineResult<()>;
}

/// Durable storage for finished videos.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Upload a video and return its time-limited download URL.
    async fn upload_video(&self, job_id: &JobId, video_path: &Path) -> PipelineResult<String>;

    /// Delete a stored video given its download URL.
    async fn delete_by_url(&self, url: &str) -> PipelineResult<()>;
}

#[async_trait]
impl Synthesizer for SpeechClient {
    async fn synthesize_quiz(
        &self,
        job_dir: &Path,
        questions: &[QuizQuestion],
        voice: Option<&VoiceSpec>,
    ) -> PipelineResult<Vec<AudioAsset>> {
        Ok(SpeechClient::synthesize_quiz(self, job_dir, questions, voice).await?)
    }
}

#[async_trait]
impl Renderer for RenderClient {
    async fn render(
        &self,
        job_id: &JobId,
        question: &QuizQuestion,
        style: &StyleSpec,
        audio: &AudioUrls,
        output_path: &Path,
    ) -> PipelineResult<()> {
        Ok(RenderClient::render(self, job_id, question, style, audio, output_path).await?)
    }
}

#[async_trait]
impl VideoStore for StorageClient {
    async fn upload_video(&self, job_id: &JobId, video_path: &Path) -> PipelineResult<String> {
        Ok(StorageClient::upload_video(self, job_id, video_path).await?)
    }

    async fn delete_by_url(&self, url: &str) -> PipelineResult<()> {
        Ok(StorageClient::delete_by_url(self, url).await?)
    }
}
