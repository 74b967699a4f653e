//! Core types for the Siara voice bridge
//!
//! Foundational types shared across the other crates:
//! - Language definitions (the eleven languages the bridge supports)
//! - Speech pipeline result types (detection, transcription)
//! - TTS voice selection

pub mod language;
pub mod speech;

pub use language::Language;
pub use speech::{DetectionResult, TranscriptionResult, VoiceGender};
