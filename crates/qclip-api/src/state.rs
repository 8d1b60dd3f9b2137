//! Application state.

use std::sync::Arc;

use qclip_pipeline::{
    JobRegistry, PipelineConfig, StagingServer, VideoPipeline, WorkdirManager,
};
use qclip_render::RenderClient;
use qclip_speech::SpeechClient;
use qclip_storage::StorageClient;

use crate::config::ApiConfig;

/// The pipeline wired with the production clients.
pub type AppPipeline = VideoPipeline<SpeechClient, RenderClient, StorageClient>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline_config: PipelineConfig,
    pub pipeline: Arc<AppPipeline>,
}

impl AppState {
    /// Create new application state, reading configuration once.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let pipeline_config = PipelineConfig::from_env();

        let speech = SpeechClient::from_env()?;
        let render = RenderClient::from_env()?;
        let storage = StorageClient::from_env().await?;

        let workdir = WorkdirManager::new(
            pipeline_config.work_root.clone(),
            pipeline_config.cleanup.clone(),
        );
        let staging = StagingServer::new(
            pipeline_config.staging_host.clone(),
            pipeline_config.staging_port,
            pipeline_config.work_root.clone(),
        );

        let pipeline = VideoPipeline::new(
            Arc::new(speech),
            Arc::new(render),
            Arc::new(storage),
            Arc::new(workdir),
            Arc::new(staging),
            Arc::new(JobRegistry::new()),
        );

        Ok(Self::from_parts(
            config,
            pipeline_config,
            Arc::new(pipeline),
        ))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        config: ApiConfig,
        pipeline_config: PipelineConfig,
        pipeline: Arc<AppPipeline>,
    ) -> Self {
        Self {
            config,
            pipeline_config,
            pipeline,
        }
    }
}
