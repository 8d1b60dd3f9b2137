//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::workdir::CleanupPolicy;

/// Configuration for the pipeline and its resource managers.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of the transient working-directory tree
    pub work_root: PathBuf,
    /// Host advertised in staged audio URLs
    pub staging_host: String,
    /// Port for the audio staging server
    pub staging_port: u16,
    /// Working-directory cleanup timings
    pub cleanup: CleanupPolicy,
    /// Interval between stale-directory sweeps
    pub sweep_interval: Duration,
    /// Age beyond which a working directory is force-deleted
    pub sweep_max_age: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_root: PathBuf::from("/tmp/qclip"),
            staging_host: "127.0.0.1".to_string(),
            staging_port: 3001,
            cleanup: CleanupPolicy::default(),
            sweep_interval: Duration::from_secs(6 * 3600),
            sweep_max_age: Duration::from_secs(24 * 3600),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            work_root: std::env::var("WORK_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/qclip")),
            staging_host: std::env::var("STAGING_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            staging_port: std::env::var("STAGING_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3001),
            cleanup: CleanupPolicy::default(),
            sweep_interval: Duration::from_secs(
                std::env::var("SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(6 * 3600),
            ),
            sweep_max_age: Duration::from_secs(
                std::env::var("SWEEP_MAX_AGE_HOURS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(24)
                    * 3600,
            ),
        }
    }
}
