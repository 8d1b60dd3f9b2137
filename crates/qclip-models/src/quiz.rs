//! Quiz request types and visual style definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

/// Available animated background styles for the composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundStyle {
    /// Animated color gradient
    Gradient,
    /// Floating particle field
    Particles,
    /// Layered sine waves
    Waves,
}

impl BackgroundStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackgroundStyle::Gradient => "gradient",
            BackgroundStyle::Particles => "particles",
            BackgroundStyle::Waves => "waves",
        }
    }
}

impl fmt::Display for BackgroundStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackgroundStyle {
    type Err = BackgroundStyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gradient" => Ok(BackgroundStyle::Gradient),
            "particles" => Ok(BackgroundStyle::Particles),
            "waves" => Ok(BackgroundStyle::Waves),
            _ => Err(BackgroundStyleParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown background style: {0}")]
pub struct BackgroundStyleParseError(String);

/// Visual style specification for the rendered video.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StyleSpec {
    /// Background animation style
    pub background_style: BackgroundStyle,
    /// Primary accent color (CSS color string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    /// Secondary accent color
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    /// Font family override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

/// Voice selection for speech synthesis.
///
/// Optional on requests; defaults come from the speech configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSpec {
    /// BCP-47 locale, e.g. "en-US"
    pub locale: String,
    /// Provider voice name
    pub name: String,
}

/// A single quiz question with its answer options.
///
/// Immutable once accepted; options keep request order and are addressed
/// by index throughout the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizQuestion {
    /// Question text
    #[validate(length(min = 1, message = "question text must not be empty"))]
    pub text: String,
    /// Answer options, 2 to 4 entries
    #[validate(length(min = 2, max = 4, message = "2 to 4 options required"))]
    pub options: Vec<String>,
    /// Index into `options` of the correct answer
    pub correct_answer_index: usize,
}

impl QuizQuestion {
    /// Check that the correct answer index points at an existing option.
    pub fn answer_index_valid(&self) -> bool {
        self.correct_answer_index < self.options.len()
    }
}

/// A validated video generation request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VideoRequest {
    /// Questions to voice and render
    #[validate(length(min = 1, message = "at least one question required"))]
    #[validate(nested)]
    pub questions: Vec<QuizQuestion>,
    /// Visual style
    #[validate(nested)]
    pub style: StyleSpec,
    /// Optional voice override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceSpec>,
}

impl VideoRequest {
    /// Validate the request beyond the derive-level bounds.
    ///
    /// Checks answer indexes and empty option strings, which the derive
    /// cannot express for nested vectors of strings.
    pub fn check(&self) -> Result<(), String> {
        for (i, q) in self.questions.iter().enumerate() {
            if !q.answer_index_valid() {
                return Err(format!(
                    "question {}: correct_answer_index {} out of range for {} options",
                    i,
                    q.correct_answer_index,
                    q.options.len()
                ));
            }
            if q.options.iter().any(|o| o.trim().is_empty()) {
                return Err(format!("question {}: options must not be empty", i));
            }
        }
        Ok(())
    }
}
