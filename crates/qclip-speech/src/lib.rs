//! Voice synthesis client for the QuizClip pipeline.
//!
//! Wraps the provider's `/audio/speech` endpoint and implements the per-job
//! fan-out: one synthesis call per question text and one per option, all
//! issued concurrently, with deterministic output paths under the job
//! directory.

mod client;
mod config;
mod error;
mod synthesis;

pub use client::SpeechClient;
pub use config::SpeechConfig;
pub use error::{SpeechError, SpeechResult};
pub use synthesis::{is_valid_voice_name, option_label};
