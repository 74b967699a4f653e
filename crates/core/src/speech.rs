//! Speech pipeline result types
//!
//! Transient values produced by one pipeline invocation and returned
//! to the caller. Nothing here is persisted.

use serde::{Deserialize, Serialize};

/// Output of one audio-language-detection call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Detected language code (e.g. "te")
    pub language_code: String,
    /// Detected script code (e.g. "Telu"), when the upstream reports one
    pub script_code: String,
    /// Prediction confidence in [0, 1]
    pub confidence: f64,
}

/// Output of one ASR + translation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Transcript in the source language
    pub original_text: String,
    /// English rendering. Equals `original_text` when the source is
    /// already English (no translation call is made in that case).
    pub translated_text: String,
    /// Language code the transcript was produced for
    pub detected_language: String,
    /// Script code from detection, if any
    pub detected_script: String,
    /// Detection confidence carried through from the ALD step
    pub confidence: f64,
}

/// TTS voice gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    #[default]
    Female,
    Male,
}

impl VoiceGender {
    /// Wire value expected by the Bhashini TTS task config
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_default() {
        assert_eq!(VoiceGender::default(), VoiceGender::Female);
        assert_eq!(VoiceGender::default().as_str(), "female");
    }

    #[test]
    fn test_gender_deserialize() {
        let g: VoiceGender = serde_json::from_str("\"male\"").unwrap();
        assert_eq!(g, VoiceGender::Male);
    }
}
