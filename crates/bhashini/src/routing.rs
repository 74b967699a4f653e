//! Per-language service routing
//!
//! Pure mapping from a language code to the Bhashini service that
//! should handle it. The table is static; an unknown code is defined
//! to route to the Indo-Aryan multilingual model rather than being an
//! error, so a surprising ALD result degrades to a plausible model
//! instead of failing the request.
//!
//! Telugu routes to the Dravidian conformer with the rest of its
//! family; earlier revisions of this table had it under Indo-Aryan.

use siara_core::Language;

/// English-optimized ASR model
pub const ASR_ENGLISH: &str = "ai4bharat/whisper-medium-en--gpu--t4";
/// Multilingual conformer for Dravidian languages
pub const ASR_DRAVIDIAN: &str = "ai4bharat/conformer-multilingual-dravidian-gpu--t4";
/// Multilingual conformer for Indo-Aryan languages (also the fallback)
pub const ASR_INDO_ARYAN: &str = "ai4bharat/conformer-multilingual-indo_aryan-gpu--t4";

/// Audio language detection service
pub const ALD_SERVICE: &str = "bhashini/iitmandi/audio-lang-detection/gpu";
/// Multilingual translation service, used whenever source != target
pub const TRANSLATION_SERVICE: &str = "ai4bharat/indictrans-v2-all-gpu--t4";
/// TTS service (language-independent in the current design; the
/// language is still threaded through the task config so the upstream
/// can specialize the voice)
pub const TTS_SERVICE: &str = "ai4bharat/indic-tts-coqui-misc-gpu--t4";

/// Select the ASR model for a language code
pub fn asr_service_id(code: &str) -> &'static str {
    match Language::from_code(code) {
        Some(Language::English) => ASR_ENGLISH,
        Some(Language::Telugu)
        | Some(Language::Tamil)
        | Some(Language::Kannada)
        | Some(Language::Malayalam) => ASR_DRAVIDIAN,
        Some(_) | None => ASR_INDO_ARYAN,
    }
}

/// Select the TTS service for a language code
pub fn tts_service_id(_code: &str) -> &'static str {
    TTS_SERVICE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indo_aryan_routing() {
        for code in ["hi", "mr", "gu", "bn", "or", "pa"] {
            assert_eq!(asr_service_id(code), ASR_INDO_ARYAN, "code {code}");
        }
    }

    #[test]
    fn test_dravidian_routing() {
        for code in ["te", "ta", "kn", "ml"] {
            assert_eq!(asr_service_id(code), ASR_DRAVIDIAN, "code {code}");
        }
    }

    #[test]
    fn test_english_routing() {
        assert_eq!(asr_service_id("en"), ASR_ENGLISH);
    }

    #[test]
    fn test_unknown_falls_back_to_indo_aryan() {
        assert_eq!(asr_service_id("xx"), ASR_INDO_ARYAN);
        assert_eq!(asr_service_id(""), ASR_INDO_ARYAN);
    }

    #[test]
    fn test_tts_service_is_fixed() {
        assert_eq!(tts_service_id("te"), tts_service_id("en"));
    }
}
