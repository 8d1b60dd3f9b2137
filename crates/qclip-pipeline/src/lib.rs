//! Job pipeline orchestrator for QuizClip.
//!
//! Owns everything that spans a job's lifetime: the working-directory
//! lifecycle (create, guard, retry-delete, sweep), the audio staging
//! server and its readiness gate, the in-memory job registry, and the
//! orchestrator that sequences synthesis, render and upload while
//! enforcing the unregister-then-cleanup contract on every exit path.

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod retry;
pub mod staging;
pub mod traits;
pub mod workdir;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::JobLogger;
pub use pipeline::VideoPipeline;
pub use registry::JobRegistry;
pub use staging::{StagingServer, StagingState};
pub use traits::{Renderer, Synthesizer, VideoStore};
pub use workdir::{CleanupPolicy, WorkdirManager};
