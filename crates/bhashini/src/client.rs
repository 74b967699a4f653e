//! Bhashini inference client
//!
//! All four operations are a single HTTP POST to the one configured
//! inference endpoint, with the static API key sent raw in the
//! Authorization header (upstream convention, not Bearer-prefixed)
//! and a `{pipelineTasks, inputData}` JSON body. Responses are
//! awaited as one body, never streamed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use siara_config::BhashiniConfig;
use siara_core::{DetectionResult, TranscriptionResult, VoiceGender};

use crate::routing;
use crate::BhashiniError;

/// Sample rate the browser-side encoder is contracted to deliver
pub const SAMPLING_RATE: u32 = 16000;

const ALD_TIMEOUT: Duration = Duration::from_secs(20);
const ASR_TIMEOUT: Duration = Duration::from_secs(30);
const TTS_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const TASK_ALD: &str = "audio-lang-detection";
const TASK_ASR: &str = "asr";
const TASK_TRANSLATION: &str = "translation";
const TASK_TTS: &str = "tts";

// ---- Wire types ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PipelineRequest {
    pipeline_tasks: Vec<PipelineTask>,
    input_data: InputData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PipelineTask {
    pub(crate) task_type: &'static str,
    pub(crate) config: TaskConfig,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) language: Option<LanguageConfig>,
    pub(crate) service_id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) audio_format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) sampling_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) gender: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LanguageConfig {
    pub(crate) source_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) target_language: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct InputData {
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<Vec<AudioPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<Vec<TextPayload>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioPayload {
    audio_content: String,
}

#[derive(Debug, Serialize)]
struct TextPayload {
    source: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PipelineResponse {
    #[serde(default)]
    pub(crate) pipeline_response: Vec<TaskResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskResult {
    #[serde(default)]
    pub(crate) task_type: String,
    #[serde(default)]
    pub(crate) output: Option<Vec<TaskOutput>>,
    #[serde(default)]
    pub(crate) audio: Option<Vec<AudioOutput>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskOutput {
    #[serde(default)]
    pub(crate) source: Option<String>,
    #[serde(default)]
    pub(crate) target: Option<String>,
    #[serde(default)]
    pub(crate) lang_prediction: Option<Vec<LangPrediction>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LangPrediction {
    #[serde(default)]
    pub(crate) lang_code: Option<String>,
    #[serde(default)]
    pub(crate) script_code: Option<String>,
    #[serde(default)]
    pub(crate) lang_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AudioOutput {
    #[serde(default)]
    pub(crate) audio_content: Option<String>,
}

// ---- Task builders ----

fn detection_tasks() -> Vec<PipelineTask> {
    vec![PipelineTask {
        task_type: TASK_ALD,
        config: TaskConfig {
            service_id: routing::ALD_SERVICE,
            ..Default::default()
        },
    }]
}

fn asr_task(language: &str) -> PipelineTask {
    PipelineTask {
        task_type: TASK_ASR,
        config: TaskConfig {
            language: Some(LanguageConfig {
                source_language: language.to_string(),
                target_language: None,
            }),
            service_id: routing::asr_service_id(language),
            audio_format: Some("wav"),
            sampling_rate: Some(SAMPLING_RATE),
            gender: None,
        },
    }
}

fn translation_task(source: &str, target: &str) -> PipelineTask {
    PipelineTask {
        task_type: TASK_TRANSLATION,
        config: TaskConfig {
            language: Some(LanguageConfig {
                source_language: source.to_string(),
                target_language: Some(target.to_string()),
            }),
            service_id: routing::TRANSLATION_SERVICE,
            ..Default::default()
        },
    }
}

/// ASR, plus translation to English when the source isn't English
pub(crate) fn transcription_tasks(language: &str) -> Vec<PipelineTask> {
    let mut tasks = vec![asr_task(language)];
    if language != "en" {
        tasks.push(translation_task(language, "en"));
    }
    tasks
}

/// English-to-target translation (when needed), then TTS
pub(crate) fn tts_tasks(language: &str, gender: VoiceGender) -> Vec<PipelineTask> {
    let mut tasks = Vec::new();
    if language != "en" {
        tasks.push(translation_task("en", language));
    }
    tasks.push(PipelineTask {
        task_type: TASK_TTS,
        config: TaskConfig {
            language: Some(LanguageConfig {
                source_language: language.to_string(),
                target_language: None,
            }),
            service_id: routing::tts_service_id(language),
            gender: Some(gender.as_str()),
            ..Default::default()
        },
    });
    tasks
}

// ---- Response extraction ----

fn task_output<'a>(response: &'a PipelineResponse, task_type: &str) -> Option<&'a TaskOutput> {
    response
        .pipeline_response
        .iter()
        .find(|t| t.task_type == task_type)
        .and_then(|t| t.output.as_deref())
        .and_then(|o| o.first())
}

/// First language prediction of the first output of the first
/// detection task. A missing or empty prediction array means the
/// upstream could not tell, which is an outcome, not an error.
pub(crate) fn first_detection(response: &PipelineResponse) -> Option<DetectionResult> {
    let prediction = task_output(response, TASK_ALD)?
        .lang_prediction
        .as_deref()?
        .first()?;
    let language_code = prediction.lang_code.clone().unwrap_or_default();
    if language_code.is_empty() {
        return None;
    }
    Some(DetectionResult {
        language_code,
        script_code: prediction.script_code.clone().unwrap_or_default(),
        confidence: prediction.lang_score.unwrap_or(0.0),
    })
}

pub(crate) fn extract_asr_text(response: &PipelineResponse) -> String {
    task_output(response, TASK_ASR)
        .and_then(|o| o.source.clone())
        .unwrap_or_default()
        .trim()
        .to_string()
}

pub(crate) fn extract_translation(response: &PipelineResponse) -> Option<String> {
    task_output(response, TASK_TRANSLATION)
        .and_then(|o| o.target.clone())
        .filter(|t| !t.trim().is_empty())
}

pub(crate) fn extract_tts_audio(response: &PipelineResponse) -> Option<String> {
    response
        .pipeline_response
        .iter()
        .find(|t| t.task_type == TASK_TTS)
        .and_then(|t| t.audio.as_deref())
        .and_then(|a| a.first())
        .and_then(|a| a.audio_content.clone())
        .filter(|c| !c.is_empty())
}

// ---- Gateway ----

/// Seam over the Bhashini operations so the orchestrator can be
/// exercised against a mock.
#[async_trait]
pub trait SpeechGateway: Send + Sync {
    /// Audio language detection. `None` means no language detected.
    async fn detect_language(
        &self,
        audio_base64: &str,
    ) -> Result<Option<DetectionResult>, BhashiniError>;

    /// ASR plus translation to English. Empty `original_text` means
    /// no speech detected, distinct from a transport error.
    async fn transcribe_and_translate(
        &self,
        audio_base64: &str,
        language: &str,
    ) -> Result<TranscriptionResult, BhashiniError>;

    /// Single-task ASR without translation (legacy entry point).
    async fn transcribe(
        &self,
        audio_base64: &str,
        language: &str,
    ) -> Result<String, BhashiniError>;

    /// TTS, preceded by English-to-target translation when needed.
    /// `None` means the upstream produced no audio.
    async fn text_to_speech(
        &self,
        text: &str,
        language: &str,
        gender: VoiceGender,
    ) -> Result<Option<String>, BhashiniError>;
}

/// HTTP client for the Bhashini inference endpoint
pub struct BhashiniClient {
    config: BhashiniConfig,
    client: Client,
}

impl BhashiniClient {
    pub fn new(config: BhashiniConfig) -> Result<Self, BhashiniError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BhashiniError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Whether an API key is present (surfaced by /health)
    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn post_pipeline(
        &self,
        request: &PipelineRequest,
        timeout: Duration,
    ) -> Result<PipelineResponse, BhashiniError> {
        if self.config.api_key.is_empty() {
            return Err(BhashiniError::Configuration);
        }

        let response = self
            .client
            .post(&self.config.api_url)
            .timeout(timeout)
            .header("Accept", "*/*")
            .header("User-Agent", "Siara-Voice-Assistant")
            .header("Authorization", &self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "Bhashini request failed");
            return Err(BhashiniError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<PipelineResponse>()
            .await
            .map_err(|e| BhashiniError::InvalidResponse(e.to_string()))
    }

    fn audio_request(tasks: Vec<PipelineTask>, audio_base64: &str) -> PipelineRequest {
        PipelineRequest {
            pipeline_tasks: tasks,
            input_data: InputData {
                audio: Some(vec![AudioPayload {
                    audio_content: audio_base64.to_string(),
                }]),
                input: None,
            },
        }
    }

    fn text_request(tasks: Vec<PipelineTask>, text: &str) -> PipelineRequest {
        PipelineRequest {
            pipeline_tasks: tasks,
            input_data: InputData {
                audio: None,
                input: Some(vec![TextPayload {
                    source: text.to_string(),
                }]),
            },
        }
    }
}

#[async_trait]
impl SpeechGateway for BhashiniClient {
    async fn detect_language(
        &self,
        audio_base64: &str,
    ) -> Result<Option<DetectionResult>, BhashiniError> {
        let request = Self::audio_request(detection_tasks(), audio_base64);
        let response = self.post_pipeline(&request, ALD_TIMEOUT).await?;

        let detection = first_detection(&response);
        match &detection {
            Some(d) => tracing::debug!(
                language = %d.language_code,
                confidence = d.confidence,
                "Language detected"
            ),
            None => tracing::debug!("No language detected in audio"),
        }
        Ok(detection)
    }

    async fn transcribe_and_translate(
        &self,
        audio_base64: &str,
        language: &str,
    ) -> Result<TranscriptionResult, BhashiniError> {
        let request = Self::audio_request(transcription_tasks(language), audio_base64);
        let response = self.post_pipeline(&request, ASR_TIMEOUT).await?;

        let original_text = extract_asr_text(&response);
        let translated_text = if language == "en" {
            // No translation task was submitted; English is its own rendering.
            original_text.clone()
        } else {
            extract_translation(&response).unwrap_or_else(|| original_text.clone())
        };

        Ok(TranscriptionResult {
            original_text,
            translated_text,
            detected_language: language.to_string(),
            detected_script: String::new(),
            confidence: 0.0,
        })
    }

    async fn transcribe(
        &self,
        audio_base64: &str,
        language: &str,
    ) -> Result<String, BhashiniError> {
        let request = Self::audio_request(vec![asr_task(language)], audio_base64);
        let response = self.post_pipeline(&request, ASR_TIMEOUT).await?;
        Ok(extract_asr_text(&response))
    }

    async fn text_to_speech(
        &self,
        text: &str,
        language: &str,
        gender: VoiceGender,
    ) -> Result<Option<String>, BhashiniError> {
        let request = Self::text_request(tts_tasks(language, gender), text);
        let response = self.post_pipeline(&request, TTS_TIMEOUT).await?;
        Ok(extract_tts_audio(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transcription_tasks_english_is_asr_only() {
        let tasks = transcription_tasks("en");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_type, TASK_ASR);
        assert_eq!(tasks[0].config.service_id, routing::ASR_ENGLISH);
    }

    #[test]
    fn test_transcription_tasks_telugu_appends_translation() {
        let tasks = transcription_tasks("te");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].config.service_id, routing::ASR_DRAVIDIAN);
        assert_eq!(tasks[1].task_type, TASK_TRANSLATION);
        let lang = tasks[1].config.language.as_ref().unwrap();
        assert_eq!(lang.source_language, "te");
        assert_eq!(lang.target_language.as_deref(), Some("en"));
    }

    #[test]
    fn test_tts_tasks_non_english_prepends_translation() {
        let tasks = tts_tasks("hi", VoiceGender::Female);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task_type, TASK_TRANSLATION);
        assert_eq!(tasks[1].task_type, TASK_TTS);
        assert_eq!(tasks[1].config.gender, Some("female"));
    }

    #[test]
    fn test_tts_tasks_english_is_single_task() {
        let tasks = tts_tasks("en", VoiceGender::Male);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_type, TASK_TTS);
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = BhashiniClient::audio_request(transcription_tasks("te"), "QUJD");
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("pipelineTasks").is_some());
        assert_eq!(value["inputData"]["audio"][0]["audioContent"], "QUJD");
        assert_eq!(
            value["pipelineTasks"][0]["config"]["language"]["sourceLanguage"],
            "te"
        );
        assert_eq!(value["pipelineTasks"][0]["config"]["samplingRate"], 16000);
    }

    #[test]
    fn test_first_detection() {
        let response: PipelineResponse = serde_json::from_value(json!({
            "pipelineResponse": [{
                "taskType": "audio-lang-detection",
                "output": [{
                    "source": "",
                    "langPrediction": [
                        {"langCode": "te", "scriptCode": "Telu", "langScore": 0.97},
                        {"langCode": "kn", "scriptCode": "Knda", "langScore": 0.02}
                    ]
                }]
            }]
        }))
        .unwrap();

        let detection = first_detection(&response).unwrap();
        assert_eq!(detection.language_code, "te");
        assert_eq!(detection.script_code, "Telu");
        assert!((detection.confidence - 0.97).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_detection_empty_predictions() {
        let response: PipelineResponse = serde_json::from_value(json!({
            "pipelineResponse": [{
                "taskType": "audio-lang-detection",
                "output": [{"langPrediction": []}]
            }]
        }))
        .unwrap();
        assert!(first_detection(&response).is_none());

        let response: PipelineResponse =
            serde_json::from_value(json!({"pipelineResponse": []})).unwrap();
        assert!(first_detection(&response).is_none());
    }

    #[test]
    fn test_extract_asr_and_translation() {
        let response: PipelineResponse = serde_json::from_value(json!({
            "pipelineResponse": [
                {"taskType": "asr", "output": [{"source": "  నమస్కారం  "}]},
                {"taskType": "translation", "output": [{"source": "నమస్కారం", "target": "Hello"}]}
            ]
        }))
        .unwrap();

        assert_eq!(extract_asr_text(&response), "నమస్కారం");
        assert_eq!(extract_translation(&response).as_deref(), Some("Hello"));
    }

    #[test]
    fn test_extract_blank_asr_is_empty() {
        let response: PipelineResponse = serde_json::from_value(json!({
            "pipelineResponse": [{"taskType": "asr", "output": [{"source": "   "}]}]
        }))
        .unwrap();
        assert_eq!(extract_asr_text(&response), "");
        assert!(extract_translation(&response).is_none());
    }

    #[test]
    fn test_extract_tts_audio() {
        let response: PipelineResponse = serde_json::from_value(json!({
            "pipelineResponse": [{"taskType": "tts", "audio": [{"audioContent": "UklGRg=="}]}]
        }))
        .unwrap();
        assert_eq!(extract_tts_audio(&response).as_deref(), Some("UklGRg=="));

        let response: PipelineResponse = serde_json::from_value(json!({
            "pipelineResponse": [{"taskType": "tts", "audio": [{"audioContent": ""}]}]
        }))
        .unwrap();
        assert!(extract_tts_audio(&response).is_none());
    }
}
