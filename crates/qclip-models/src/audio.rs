//! Audio asset types produced by synthesis and consumed by rendering.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Synthesized audio files for one question, on the local filesystem.
///
/// `option_audios` is index-aligned with the question's options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    /// Path to the question voice-over
    pub question_audio: PathBuf,
    /// Paths to the option voice-overs, one per option
    pub option_audios: Vec<PathBuf>,
}

/// The same asset after staging-URL resolution.
///
/// The renderer consumes audio by URL, not by local path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioUrls {
    /// URL of the question voice-over
    pub question_audio: String,
    /// URLs of the option voice-overs, index-aligned with options
    pub option_audios: Vec<String>,
}

impl AudioUrls {
    /// Iterate over every URL in this asset.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.question_audio.as_str())
            .chain(self.option_audios.iter().map(|s| s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_yields_question_first() {
        let urls = AudioUrls {
            question_audio: "http://h/q.mp3".into(),
            option_audios: vec!["http://h/o0.mp3".into(), "http://h/o1.mp3".into()],
        };
        let collected: Vec<_> = urls.all().collect();
        assert_eq!(collected, vec!["http://h/q.mp3", "http://h/o0.mp3", "http://h/o1.mp3"]);
    }
}
