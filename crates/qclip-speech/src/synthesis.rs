//! Per-job synthesis fan-out.
//!
//! Converts every question and every option of a quiz into audio files
//! under the job directory. All provider calls for the job are issued
//! concurrently and joined; a single failure fails the whole job, so a
//! partial set of audio files is never treated as usable.

use std::path::{Path, PathBuf};

use futures::future::{try_join, try_join_all};
use tracing::info;

use qclip_models::{AudioAsset, QuizQuestion, VoiceSpec};

use crate::client::SpeechClient;
use crate::error::SpeechResult;

/// Check a provider voice name: letters, digits and hyphens only.
pub fn is_valid_voice_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Voice-over label for an option: "Option A: <text>".
pub fn option_label(index: usize, text: &str) -> String {
    let letter = (b'A' + (index as u8).min(25)) as char;
    format!("Option {}: {}", letter, text)
}

/// Deterministic audio paths for one question under the job directory.
fn question_paths(job_dir: &Path, index: usize, option_count: usize) -> (PathBuf, Vec<PathBuf>) {
    let question_dir = job_dir.join(format!("question_{}", index));
    let question_audio = question_dir.join("question.mp3");
    let option_audios = (0..option_count)
        .map(|i| question_dir.join(format!("option_{}.mp3", i)))
        .collect();
    (question_audio, option_audios)
}

impl SpeechClient {
    /// Synthesize audio for every question and option of a quiz.
    ///
    /// Returns one `AudioAsset` per question, index-aligned with the
    /// input. Output paths are deterministic
    /// (`question_<n>/question.mp3`, `question_<n>/option_<i>.mp3`), so a
    /// retried run reproduces the same layout.
    pub async fn synthesize_quiz(
        &self,
        job_dir: &Path,
        questions: &[QuizQuestion],
        voice: Option<&VoiceSpec>,
    ) -> SpeechResult<Vec<AudioAsset>> {
        info!(
            questions = questions.len(),
            job_dir = %job_dir.display(),
            "Starting synthesis fan-out"
        );

        let assets = try_join_all(questions.iter().enumerate().map(|(index, question)| {
            let (question_audio, option_audios) =
                question_paths(job_dir, index, question.options.len());

            async move {
                let question_call = self.synthesize(&question.text, &question_audio, voice);

                let option_calls =
                    try_join_all(question.options.iter().enumerate().zip(&option_audios).map(
                        |((opt_index, option), path)| {
                            let label = option_label(opt_index, option);
                            async move { self.synthesize(&label, path, voice).await }
                        },
                    ));

                try_join(question_call, option_calls).await?;

                Ok::<AudioAsset, crate::error::SpeechError>(AudioAsset {
                    question_audio,
                    option_audios,
                })
            }
        }))
        .await?;

        info!(
            questions = assets.len(),
            "Synthesis fan-out complete"
        );
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeechConfig;
    use crate::error::SpeechError;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(endpoint: &str) -> SpeechClient {
        SpeechClient::new(SpeechConfig {
            endpoint: endpoint.to_string(),
            api_key: "test-key".to_string(),
            deployment: "tts".to_string(),
            api_version: "2025-03-01-preview".to_string(),
            default_voice: "alloy".to_string(),
            default_locale: "en-US".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn question(text: &str, options: &[&str]) -> QuizQuestion {
        QuizQuestion {
            text: text.to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer_index: 0,
        }
    }

    #[test]
    fn test_option_label() {
        assert_eq!(option_label(0, "Paris"), "Option A: Paris");
        assert_eq!(option_label(3, "Rome"), "Option D: Rome");
    }

    #[test]
    fn test_voice_name_validation() {
        assert!(is_valid_voice_name("en-US-JennyNeural"));
        assert!(is_valid_voice_name("alloy"));
        assert!(!is_valid_voice_name(""));
        assert!(!is_valid_voice_name("voice with spaces"));
        assert!(!is_valid_voice_name("../etc/passwd"));
    }

    #[tokio::test]
    async fn test_synthesize_quiz_writes_deterministic_paths() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/tts/audio/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3data".to_vec()))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let dir = tempfile::tempdir().unwrap();

        let questions = vec![
            question("First question?", &["a", "b"]),
            question("Second question?", &["c", "d", "e"]),
        ];

        let assets = client
            .synthesize_quiz(dir.path(), &questions, None)
            .await
            .unwrap();

        assert_eq!(assets.len(), 2);
        assert_eq!(
            assets[0].question_audio,
            dir.path().join("question_0/question.mp3")
        );
        assert_eq!(
            assets[1].option_audios[2],
            dir.path().join("question_1/option_2.mp3")
        );
        for asset in &assets {
            assert!(asset.question_audio.exists());
            for opt in &asset.option_audios {
                assert!(opt.exists());
            }
        }
    }

    #[tokio::test]
    async fn test_single_failure_fails_whole_fanout() {
        let server = MockServer::start().await;

        // One of six concurrent calls is engineered to fail.
        Mock::given(method("POST"))
            .and(path("/openai/deployments/tts/audio/speech"))
            .and(body_string_contains("Option B: bad"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/tts/audio/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3data".to_vec()))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let dir = tempfile::tempdir().unwrap();

        // 2 questions x (1 question + 2 options) = 6 synthesis calls.
        let questions = vec![
            question("First question?", &["good", "bad"]),
            question("Second question?", &["fine", "ok"]),
        ];

        let result = client.synthesize_quiz(dir.path(), &questions, None).await;
        assert!(matches!(result, Err(SpeechError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_invalid_voice_rejected_before_network() {
        // No mock server mounted: an invalid voice must fail locally.
        let client = test_client("http://127.0.0.1:1");
        let dir = tempfile::tempdir().unwrap();
        let voice = VoiceSpec {
            locale: "en-US".into(),
            name: "bad voice!".into(),
        };

        let result = client
            .synthesize_quiz(dir.path(), &[question("Q?", &["a", "b"])], Some(&voice))
            .await;
        assert!(matches!(result, Err(SpeechError::InvalidVoice(_))));
    }
}
