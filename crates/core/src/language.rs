//! Language definitions
//!
//! The ten Indian languages supported by the Bhashini pipeline, plus
//! English. Language codes arrive from the audio-language-detection
//! service as short ISO tags; unknown codes are never an error here,
//! callers fall back to default routing instead.

use serde::{Deserialize, Serialize};

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Telugu,
    Tamil,
    Kannada,
    Malayalam,
    Bengali,
    Marathi,
    Gujarati,
    Odia,
    Punjabi,
}

impl Language {
    /// Get ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Telugu => "te",
            Self::Tamil => "ta",
            Self::Kannada => "kn",
            Self::Malayalam => "ml",
            Self::Bengali => "bn",
            Self::Marathi => "mr",
            Self::Gujarati => "gu",
            Self::Odia => "or",
            Self::Punjabi => "pa",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Telugu => "Telugu",
            Self::Tamil => "Tamil",
            Self::Kannada => "Kannada",
            Self::Malayalam => "Malayalam",
            Self::Bengali => "Bengali",
            Self::Marathi => "Marathi",
            Self::Gujarati => "Gujarati",
            Self::Odia => "Odia",
            Self::Punjabi => "Punjabi",
        }
    }

    /// Parse an ISO code. Returns `None` for codes outside the
    /// supported set (callers decide the fallback, not this type).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Self::English),
            "hi" => Some(Self::Hindi),
            "te" => Some(Self::Telugu),
            "ta" => Some(Self::Tamil),
            "kn" => Some(Self::Kannada),
            "ml" => Some(Self::Malayalam),
            "bn" => Some(Self::Bengali),
            "mr" => Some(Self::Marathi),
            "gu" => Some(Self::Gujarati),
            "or" => Some(Self::Odia),
            "pa" => Some(Self::Punjabi),
            _ => None,
        }
    }

    /// All supported languages
    pub fn all() -> &'static [Language] {
        &[
            Self::English,
            Self::Hindi,
            Self::Telugu,
            Self::Tamil,
            Self::Kannada,
            Self::Malayalam,
            Self::Bengali,
            Self::Marathi,
            Self::Gujarati,
            Self::Odia,
            Self::Punjabi,
        ]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for lang in Language::all() {
            assert_eq!(Language::from_code(lang.code()), Some(*lang));
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(Language::from_code("xx"), None);
        assert_eq!(Language::from_code(""), None);
    }

    #[test]
    fn test_default_is_english() {
        assert_eq!(Language::default(), Language::English);
    }
}
