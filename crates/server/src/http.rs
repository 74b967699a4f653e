//! HTTP endpoints
//!
//! REST relay consumed by the browser chat client. Semantic-empty
//! outcomes (no language, no speech, no audio) are 200 responses with
//! `success: false` since the caller can correct them; classified
//! errors map onto 4xx/5xx via [`ServerError`].

use std::time::Instant;

use axum::{
    extract::{Json, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use siara_bhashini::{PipelineOutcome, SpeechGateway};
use siara_core::VoiceGender;

use crate::state::AppState;
use crate::ServerError;

const MSG_NO_LANGUAGE: &str = "No language detected in audio";
const MSG_NO_SPEECH: &str = "No speech detected in audio";
const MSG_NO_AUDIO: &str = "No audio generated";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );

    Router::new()
        // Speech pipeline
        .route("/api/detect-language", post(detect_language))
        .route("/api/transcribe-with-language", post(transcribe_with_language))
        .route("/api/bhashini-pipeline", post(bhashini_pipeline))
        .route("/api/tts", post(tts))
        // Deprecated single-language entry point, kept for old clients
        .route("/api/transcribe", post(transcribe_legacy))
        // Agentforce session lifecycle
        .route("/api/salesforce/start-session", post(start_session))
        .route("/api/salesforce/send-message", post(send_message))
        .route("/api/salesforce/end-session", post(end_session))
        // Health check
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins
///
/// Empty configuration defaults to the localhost dev origins the
/// browser client is served from.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let configured: Vec<HeaderValue> = if origins.is_empty() {
        ["http://localhost:5173", "http://localhost:5174", "http://localhost:3000"]
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect()
    } else {
        origins
            .iter()
            .filter_map(|origin| {
                origin.parse::<HeaderValue>().ok().or_else(|| {
                    tracing::warn!("Invalid CORS origin: {}", origin);
                    None
                })
            })
            .collect()
    };

    CorsLayer::new()
        .allow_origin(configured)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn ok(body: serde_json::Value) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

fn error_response(err: ServerError, started: Instant) -> Response {
    let status = err.status_code();
    tracing::error!(status = status.as_u16(), error = %err, "Request failed");

    let mut body = json!({
        "success": false,
        "error": err.to_string(),
        "processingTime": elapsed_ms(started),
    });
    if let Some(details) = err.details() {
        body["details"] = json!(details);
    }
    (status, Json(body)).into_response()
}

// ---- Speech endpoints ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectLanguageRequest {
    audio_base64: Option<String>,
}

async fn detect_language(
    State(state): State<AppState>,
    Json(request): Json<DetectLanguageRequest>,
) -> Response {
    let started = Instant::now();
    let Some(audio) = request.audio_base64.filter(|a| !a.is_empty()) else {
        return error_response(
            ServerError::Validation("Missing audioBase64 in request body".to_string()),
            started,
        );
    };

    match state.bhashini.detect_language(&audio).await {
        Ok(Some(detection)) => ok(json!({
            "success": true,
            "detectedLanguage": detection.language_code,
            "detectedScript": detection.script_code,
            "confidence": detection.confidence,
            "processingTime": elapsed_ms(started),
        })),
        Ok(None) => ok(json!({
            "success": false,
            "message": MSG_NO_LANGUAGE,
            "detectedLanguage": "",
            "detectedScript": "",
            "confidence": 0.0,
            "processingTime": elapsed_ms(started),
        })),
        Err(e) => error_response(e.into(), started),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscribeWithLanguageRequest {
    audio_base64: Option<String>,
    detected_language: Option<String>,
}

async fn transcribe_with_language(
    State(state): State<AppState>,
    Json(request): Json<TranscribeWithLanguageRequest>,
) -> Response {
    let started = Instant::now();
    let Some(audio) = request.audio_base64.filter(|a| !a.is_empty()) else {
        return error_response(
            ServerError::Validation("Missing audioBase64 in request body".to_string()),
            started,
        );
    };
    let Some(language) = request.detected_language.filter(|l| !l.is_empty()) else {
        return error_response(
            ServerError::Validation("Missing detectedLanguage in request body".to_string()),
            started,
        );
    };

    match state.bhashini.transcribe_and_translate(&audio, &language).await {
        Ok(result) if result.original_text.is_empty() => ok(json!({
            "success": false,
            "message": MSG_NO_SPEECH,
            "detectedLanguage": language,
            "originalText": "",
            "translatedText": "",
            "processingTime": elapsed_ms(started),
        })),
        Ok(result) => ok(json!({
            "success": true,
            "detectedLanguage": language,
            "originalText": result.original_text,
            "translatedText": result.translated_text,
            "processingTime": elapsed_ms(started),
        })),
        Err(e) => error_response(e.into(), started),
    }
}

async fn bhashini_pipeline(
    State(state): State<AppState>,
    Json(request): Json<DetectLanguageRequest>,
) -> Response {
    let started = Instant::now();
    let Some(audio) = request.audio_base64.filter(|a| !a.is_empty()) else {
        return error_response(
            ServerError::Validation("Missing audioBase64 in request body".to_string()),
            started,
        );
    };

    match state.pipeline.transcribe(&audio).await {
        Ok(PipelineOutcome::Undetected) => ok(json!({
            "success": false,
            "message": MSG_NO_LANGUAGE,
            "processingTime": elapsed_ms(started),
        })),
        Ok(PipelineOutcome::NoSpeech { detection }) => ok(json!({
            "success": false,
            "message": MSG_NO_SPEECH,
            "detectedLanguage": detection.language_code,
            "detectedScript": detection.script_code,
            "confidence": detection.confidence,
            "processingTime": elapsed_ms(started),
        })),
        Ok(PipelineOutcome::Transcribed(result)) => ok(json!({
            "success": true,
            "detectedLanguage": result.detected_language,
            "detectedScript": result.detected_script,
            "confidence": result.confidence,
            "originalText": result.original_text,
            "translatedText": result.translated_text,
            "processingTime": elapsed_ms(started),
        })),
        Err(e) => error_response(e.into(), started),
    }
}

#[derive(Debug, Deserialize)]
struct TtsRequest {
    text: Option<String>,
    language: Option<String>,
    gender: Option<VoiceGender>,
}

async fn tts(State(state): State<AppState>, Json(request): Json<TtsRequest>) -> Response {
    let started = Instant::now();
    let Some(text) = request.text.filter(|t| !t.trim().is_empty()) else {
        return error_response(
            ServerError::Validation("Missing text in request body".to_string()),
            started,
        );
    };
    let language = request.language.unwrap_or_else(|| "en".to_string());
    let gender = request.gender.unwrap_or_default();

    match state.bhashini.text_to_speech(&text, &language, gender).await {
        Ok(Some(audio_content)) => ok(json!({
            "success": true,
            "audioContent": audio_content,
            "language": language,
            "gender": gender.as_str(),
            "processingTime": elapsed_ms(started),
        })),
        Ok(None) => ok(json!({
            "success": false,
            "message": MSG_NO_AUDIO,
            "language": language,
            "gender": gender.as_str(),
            "processingTime": elapsed_ms(started),
        })),
        Err(e) => error_response(e.into(), started),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTranscribeRequest {
    audio_base64: Option<String>,
    language: Option<String>,
}

/// Deprecated: single-language ASR without detection or translation
async fn transcribe_legacy(
    State(state): State<AppState>,
    Json(request): Json<LegacyTranscribeRequest>,
) -> Response {
    let started = Instant::now();
    let Some(audio) = request.audio_base64.filter(|a| !a.is_empty()) else {
        return error_response(
            ServerError::Validation("Missing audioBase64 in request body".to_string()),
            started,
        );
    };
    let language = request.language.unwrap_or_else(|| "te".to_string());

    match state.bhashini.transcribe(&audio, &language).await {
        Ok(text) if text.is_empty() => ok(json!({
            "success": true,
            "text": "",
            "message": MSG_NO_SPEECH,
            "language": language,
            "processingTime": elapsed_ms(started),
        })),
        Ok(text) => ok(json!({
            "success": true,
            "text": text,
            "language": language,
            "processingTime": elapsed_ms(started),
        })),
        Err(e) => error_response(e.into(), started),
    }
}

// ---- Agentforce endpoints ----

async fn start_session(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    match state.agent.start_session().await {
        Ok(session) => ok(json!({
            "success": true,
            "sessionId": session.session_id,
            "initialMessage": session.greeting,
        })),
        Err(e) => error_response(e.into(), started),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    session_id: Option<String>,
    message: Option<String>,
}

async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Response {
    let started = Instant::now();
    let Some(session_id) = request.session_id.filter(|s| !s.is_empty()) else {
        return error_response(
            ServerError::Validation("Missing sessionId in request body".to_string()),
            started,
        );
    };
    let Some(message) = request.message.filter(|m| !m.trim().is_empty()) else {
        return error_response(
            ServerError::Validation("Missing message in request body".to_string()),
            started,
        );
    };

    match state.agent.send_message(&session_id, &message).await {
        Ok(reply) => ok(json!({
            "success": true,
            "message": reply,
        })),
        Err(e) => error_response(e.into(), started),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndSessionRequest {
    session_id: Option<String>,
}

async fn end_session(
    State(state): State<AppState>,
    Json(request): Json<EndSessionRequest>,
) -> Response {
    let started = Instant::now();
    let Some(session_id) = request.session_id.filter(|s| !s.is_empty()) else {
        return error_response(
            ServerError::Validation("Missing sessionId in request body".to_string()),
            started,
        );
    };

    match state.agent.end_session(&session_id).await {
        Ok(()) => ok(json!({
            "success": true,
            "message": "Session ended",
        })),
        Err(e) => error_response(e.into(), started),
    }
}

// ---- Health ----

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Siara voice bridge is running",
        "apiKeyConfigured": state.bhashini.is_configured(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use siara_config::Settings;

    #[test]
    fn test_router_creation() {
        let state = AppState::new(Settings::default()).unwrap();
        let _ = create_router(state);
    }

    #[test]
    fn test_cors_layer_with_origins() {
        let _ = build_cors_layer(&["http://localhost:5173".to_string()], true);
        let _ = build_cors_layer(&[], true);
        let _ = build_cors_layer(&[], false);
    }
}
