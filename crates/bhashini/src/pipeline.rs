//! Two-step speech pipeline
//!
//! Detection and transcription are deliberately separate upstream
//! calls: the ASR model is picked per detected language, which a
//! single combined pipeline cannot do (it cannot parametrize its own
//! ASR service by its own detection output before submission), and a
//! "language undetectable" outcome is surfaced before paying for a
//! full ASR + translation call.

use std::sync::Arc;

use siara_core::{DetectionResult, TranscriptionResult};

use crate::client::SpeechGateway;
use crate::BhashiniError;

/// Outcome of one pipeline invocation
///
/// `Undetected` and `NoSpeech` are expected, user-correctable
/// outcomes (re-record, speak up), not failures; the HTTP surface
/// reports them as 200 with `success: false`.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// The ALD step produced no language prediction
    Undetected,
    /// ASR ran but the transcript was blank
    NoSpeech { detection: DetectionResult },
    /// Full result
    Transcribed(TranscriptionResult),
}

/// Detect-then-transcribe orchestrator
pub struct SpeechPipeline<G: SpeechGateway> {
    gateway: Arc<G>,
}

impl<G: SpeechGateway> SpeechPipeline<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn transcribe(&self, audio_base64: &str) -> Result<PipelineOutcome, BhashiniError> {
        let detection = match self.gateway.detect_language(audio_base64).await? {
            Some(detection) => detection,
            None => return Ok(PipelineOutcome::Undetected),
        };

        let mut result = self
            .gateway
            .transcribe_and_translate(audio_base64, &detection.language_code)
            .await?;

        if result.original_text.is_empty() {
            return Ok(PipelineOutcome::NoSpeech { detection });
        }

        // Detection context is only known at this level, carry it through.
        result.detected_language = detection.language_code;
        result.detected_script = detection.script_code;
        result.confidence = detection.confidence;
        if result.translated_text.is_empty() {
            result.translated_text = result.original_text.clone();
        }

        Ok(PipelineOutcome::Transcribed(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use siara_core::VoiceGender;

    /// Scripted gateway that records which operations were called
    struct MockGateway {
        detection: Option<DetectionResult>,
        asr_text: String,
        translated: String,
        calls: Mutex<Vec<&'static str>>,
    }

    impl MockGateway {
        fn new(detection: Option<DetectionResult>, asr_text: &str, translated: &str) -> Self {
            Self {
                detection,
                asr_text: asr_text.to_string(),
                translated: translated.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl SpeechGateway for MockGateway {
        async fn detect_language(
            &self,
            _audio_base64: &str,
        ) -> Result<Option<DetectionResult>, BhashiniError> {
            self.calls.lock().push("detect");
            Ok(self.detection.clone())
        }

        async fn transcribe_and_translate(
            &self,
            _audio_base64: &str,
            language: &str,
        ) -> Result<TranscriptionResult, BhashiniError> {
            self.calls.lock().push("asr");
            let translated = if language == "en" {
                self.asr_text.clone()
            } else {
                self.translated.clone()
            };
            Ok(TranscriptionResult {
                original_text: self.asr_text.clone(),
                translated_text: translated,
                detected_language: language.to_string(),
                detected_script: String::new(),
                confidence: 0.0,
            })
        }

        async fn transcribe(
            &self,
            _audio_base64: &str,
            _language: &str,
        ) -> Result<String, BhashiniError> {
            self.calls.lock().push("asr_only");
            Ok(self.asr_text.clone())
        }

        async fn text_to_speech(
            &self,
            _text: &str,
            _language: &str,
            _gender: VoiceGender,
        ) -> Result<Option<String>, BhashiniError> {
            self.calls.lock().push("tts");
            Ok(None)
        }
    }

    fn telugu_detection() -> DetectionResult {
        DetectionResult {
            language_code: "te".to_string(),
            script_code: "Telu".to_string(),
            confidence: 0.95,
        }
    }

    #[tokio::test]
    async fn test_undetected_short_circuits_before_asr() {
        let gateway = Arc::new(MockGateway::new(None, "ignored", "ignored"));
        let pipeline = SpeechPipeline::new(gateway.clone());

        let outcome = pipeline.transcribe("QUJD").await.unwrap();
        assert_eq!(outcome, PipelineOutcome::Undetected);
        assert_eq!(gateway.calls(), vec!["detect"]);
    }

    #[tokio::test]
    async fn test_no_speech_keeps_detection() {
        let gateway = Arc::new(MockGateway::new(Some(telugu_detection()), "", ""));
        let pipeline = SpeechPipeline::new(gateway.clone());

        let outcome = pipeline.transcribe("QUJD").await.unwrap();
        match outcome {
            PipelineOutcome::NoSpeech { detection } => {
                assert_eq!(detection.language_code, "te");
            },
            other => panic!("expected NoSpeech, got {:?}", other),
        }
        assert_eq!(gateway.calls(), vec!["detect", "asr"]);
    }

    #[tokio::test]
    async fn test_transcribed_carries_detection_context() {
        let gateway = Arc::new(MockGateway::new(
            Some(telugu_detection()),
            "నమస్కారం",
            "Hello",
        ));
        let pipeline = SpeechPipeline::new(gateway);

        let outcome = pipeline.transcribe("QUJD").await.unwrap();
        match outcome {
            PipelineOutcome::Transcribed(result) => {
                assert_eq!(result.original_text, "నమస్కారం");
                assert_eq!(result.translated_text, "Hello");
                assert_eq!(result.detected_language, "te");
                assert_eq!(result.detected_script, "Telu");
                assert!((result.confidence - 0.95).abs() < f64::EPSILON);
            },
            other => panic!("expected Transcribed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_english_translation_equals_original() {
        let detection = DetectionResult {
            language_code: "en".to_string(),
            script_code: "Latn".to_string(),
            confidence: 0.99,
        };
        let gateway = Arc::new(MockGateway::new(Some(detection), "hello there", "ignored"));
        let pipeline = SpeechPipeline::new(gateway);

        match pipeline.transcribe("QUJD").await.unwrap() {
            PipelineOutcome::Transcribed(result) => {
                assert_eq!(result.translated_text, result.original_text);
            },
            other => panic!("expected Transcribed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_translation_falls_back_to_original() {
        let gateway = Arc::new(MockGateway::new(Some(telugu_detection()), "నమస్కారం", ""));
        let pipeline = SpeechPipeline::new(gateway);

        match pipeline.transcribe("QUJD").await.unwrap() {
            PipelineOutcome::Transcribed(result) => {
                assert_eq!(result.translated_text, "నమస్కారం");
            },
            other => panic!("expected Transcribed, got {:?}", other),
        }
    }
}
