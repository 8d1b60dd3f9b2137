//! Shared data models for the QuizClip backend.
//!
//! Request/response shapes, job identifiers and status records, and the
//! audio asset types that flow between the synthesis, staging and render
//! stages. Everything here is plain data: no I/O, no service handles.

pub mod audio;
pub mod job;
pub mod quiz;

pub use audio::{AudioAsset, AudioUrls};
pub use job::{JobId, JobStatus, JobStatusEntry};
pub use quiz::{BackgroundStyle, QuizQuestion, StyleSpec, VideoRequest, VoiceSpec};
