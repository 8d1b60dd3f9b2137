//! Render service wire types.

use serde::{Deserialize, Serialize};

use qclip_models::{AudioUrls, QuizQuestion, StyleSpec};

/// Composition metadata returned by the render service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionInfo {
    /// Logical composition identifier
    pub id: String,
    /// Composition width in pixels
    pub width: u32,
    /// Composition height in pixels
    pub height: u32,
    /// Composition frame rate
    pub fps: u32,
}

/// Input properties passed to the composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionProps {
    pub question: String,
    pub options: Vec<String>,
    pub background_style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    pub question_audio_url: String,
    pub option_audio_urls: Vec<String>,
    pub duration_in_frames: u32,
}

impl CompositionProps {
    /// Build composition props from one question, a style and its staged
    /// audio URLs.
    pub fn new(
        question: &QuizQuestion,
        style: &StyleSpec,
        audio: &AudioUrls,
        duration_in_frames: u32,
    ) -> Self {
        Self {
            question: question.text.clone(),
            options: question.options.clone(),
            background_style: style.background_style.to_string(),
            primary_color: style.primary_color.clone(),
            secondary_color: style.secondary_color.clone(),
            question_audio_url: audio.question_audio.clone(),
            option_audio_urls: audio.option_audios.clone(),
            duration_in_frames,
        }
    }
}

/// Body of a render request.
#[derive(Debug, Serialize)]
pub struct RenderRequest<'a> {
    pub composition_id: &'a str,
    pub input_props: &'a CompositionProps,
}
