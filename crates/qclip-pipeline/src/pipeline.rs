//! The video generation orchestrator.
//!
//! Sequences synthesis, render and upload for one job and owns the
//! registry bookkeeping around it. The one contract every exit path must
//! honor: the job is unregistered from the active set before cleanup
//! runs, and cleanup failures never mask the job's real outcome.

use std::path::PathBuf;
use std::sync::Arc;

use qclip_models::{AudioAsset, AudioUrls, JobId, VideoRequest};

use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::registry::JobRegistry;
use crate::staging::StagingServer;
use crate::traits::{Renderer, Synthesizer, VideoStore};
use crate::workdir::WorkdirManager;

/// Name of the rendered video inside the job directory.
const OUTPUT_FILE: &str = "output.mp4";

/// Orchestrator wiring synthesis, staging, render, upload and cleanup.
pub struct VideoPipeline<S, R, U> {
    synthesizer: Arc<S>,
    renderer: Arc<R>,
    store: Arc<U>,
    workdir: Arc<WorkdirManager>,
    staging: Arc<StagingServer>,
    registry: Arc<JobRegistry>,
}

impl<S, R, U> VideoPipeline<S, R, U>
where
    S: Synthesizer,
    R: Renderer,
    U: VideoStore,
{
    pub fn new(
        synthesizer: Arc<S>,
        renderer: Arc<R>,
        store: Arc<U>,
        workdir: Arc<WorkdirManager>,
        staging: Arc<StagingServer>,
        registry: Arc<JobRegistry>,
    ) -> Self {
        Self {
            synthesizer,
            renderer,
            store,
            workdir,
            staging,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn workdir(&self) -> &Arc<WorkdirManager> {
        &self.workdir
    }

    pub fn staging(&self) -> &Arc<StagingServer> {
        &self.staging
    }

    pub fn store(&self) -> &Arc<U> {
        &self.store
    }

    /// Run one job end to end and record its outcome in the registry.
    ///
    /// The job is active for exactly the span of the stage run: registered
    /// before any filesystem work, unregistered before cleanup on every
    /// path, success or failure.
    pub async fn process(&self, job_id: &JobId, request: &VideoRequest) -> PipelineResult<String> {
        let logger = JobLogger::new(job_id, "generate_video");
        logger.log_start(&format!("{} questions", request.questions.len()));

        self.registry.create(job_id).await;
        self.workdir.register_active(job_id.as_str());

        let outcome = self.run_stages(job_id, request, &logger).await;

        self.workdir.unregister_active(job_id.as_str());
        if let Err(e) = self.workdir.cleanup(job_id.as_str()).await {
            logger.log_warning(&format!("cleanup failed: {}", e));
        }

        match outcome {
            Ok(url) => {
                self.registry.complete(job_id, &url).await;
                logger.log_completion(&url);
                Ok(url)
            }
            Err(e) => {
                let message = format!("{} failed: {}", e.stage(), e);
                self.registry.fail(job_id, &message).await;
                logger.log_error(&message);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        job_id: &JobId,
        request: &VideoRequest,
        logger: &JobLogger,
    ) -> PipelineResult<String> {
        if !self.staging.is_ready().await {
            return Err(PipelineError::not_ready(
                "audio staging server is not serving; refusing to render against dead URLs",
            ));
        }

        let job_dir = self.workdir.create_job_dir(job_id.as_str()).await?;

        let assets = self
            .synthesizer
            .synthesize_quiz(&job_dir, &request.questions, request.voice.as_ref())
            .await?;
        self.registry.set_progress(job_id, 40).await;
        logger.log_progress(&format!("synthesized audio for {} questions", assets.len()));

        // The composition renders a single question per video; only the
        // first question's audio is staged and rendered.
        let first_question = request
            .questions
            .first()
            .ok_or_else(|| PipelineError::resource("request has no questions"))?;
        let first_asset = assets
            .first()
            .ok_or_else(|| PipelineError::resource("synthesis produced no assets"))?;
        let audio_urls = self.stage_asset(first_asset).await?;

        let output_path: PathBuf = job_dir.join(OUTPUT_FILE);
        self.renderer
            .render(
                job_id,
                first_question,
                &request.style,
                &audio_urls,
                &output_path,
            )
            .await?;
        self.registry.set_progress(job_id, 80).await;
        logger.log_progress("video rendered");

        let url = self.store.upload_video(job_id, &output_path).await?;
        Ok(url)
    }

    /// Resolve staged URLs for one question's audio files.
    async fn stage_asset(&self, asset: &AudioAsset) -> PipelineResult<AudioUrls> {
        let question_audio = self.staging.resolve_url(&asset.question_audio).await?;
        let mut option_audios = Vec::with_capacity(asset.option_audios.len());
        for path in &asset.option_audios {
            option_audios.push(self.staging.resolve_url(path).await?);
        }
        Ok(AudioUrls {
            question_audio,
            option_audios,
        })
    }
}
