//! Render service configuration.

use std::time::Duration;

/// Configuration for the render service client.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Base URL of the render service
    pub base_url: String,
    /// Logical composition identifier
    pub composition: String,
    /// Output frame rate
    pub fps: u32,
    /// Video duration in seconds
    pub duration_seconds: u32,
    /// Request timeout (renders are slow)
    pub timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3100".to_string(),
            composition: "QuizScene".to_string(),
            fps: 30,
            duration_seconds: 10,
            timeout: Duration::from_secs(300),
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("RENDERER_URL")
                .unwrap_or_else(|_| "http://localhost:3100".to_string()),
            composition: std::env::var("RENDERER_COMPOSITION")
                .unwrap_or_else(|_| "QuizScene".to_string()),
            fps: std::env::var("VIDEO_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            duration_seconds: std::env::var("VIDEO_DURATION_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            timeout: Duration::from_secs(
                std::env::var("RENDERER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }

    /// Fixed clip length in frames (fps x seconds).
    pub fn duration_in_frames(&self) -> u32 {
        self.fps * self.duration_seconds
    }
}
