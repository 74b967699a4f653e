//! Bhashini speech pipeline gateway
//!
//! Issues HTTP calls against the single Bhashini inference endpoint
//! for four task types: audio-language-detection, ASR, translation
//! and TTS. The two-step pipeline orchestration (detect first, then
//! transcribe with a language-specific ASR model) lives in
//! [`pipeline`]; per-language model selection lives in [`routing`].

pub mod client;
pub mod pipeline;
pub mod routing;

pub use client::{BhashiniClient, SpeechGateway};
pub use pipeline::{PipelineOutcome, SpeechPipeline};

use thiserror::Error;

/// Gateway errors
///
/// Transport failures are classified here, once, so nothing above the
/// gateway ever sees a raw reqwest error. Semantic-empty outcomes
/// (no language detected, no speech, no audio) are not errors and are
/// represented in the operation return types instead.
#[derive(Error, Debug)]
pub enum BhashiniError {
    #[error("Bhashini API key not configured")]
    Configuration,

    #[error("Request timeout - Bhashini API took too long to respond")]
    Timeout,

    #[error("Cannot connect to Bhashini API: {0}")]
    Transport(String),

    #[error("Bhashini API returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for BhashiniError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BhashiniError::Timeout
        } else {
            BhashiniError::Transport(err.to_string())
        }
    }
}
