//! Engine seam shared by the transcription backends

use chrono::{DateTime, Local};
use thiserror::Error;

/// One transcript hypothesis returned by the service
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    /// Transcript text of the best alternative
    pub text: String,
    /// Mean item confidence when the service reports any
    pub confidence: Option<f64>,
    /// Wall-clock time the segment was received
    pub received_at: DateTime<Local>,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            text: text.into(),
            confidence,
            received_at: Local::now(),
        }
    }
}

/// Events emitted by an STT engine
#[derive(Debug, Clone, PartialEq)]
pub enum SttEvent {
    /// Intermediate transcription, may still be rewritten
    Partial(TranscriptSegment),
    /// Confirmed transcription
    Final(TranscriptSegment),
}

impl SttEvent {
    pub fn segment(&self) -> &TranscriptSegment {
        match self {
            SttEvent::Partial(segment) | SttEvent::Final(segment) => segment,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, SttEvent::Final(_))
    }
}

/// Languages Transcribe accepts for streaming
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Language {
    /// US English
    EnUs,
    /// British English
    EnGb,
    /// French
    FrFr,
    /// US Spanish
    EsUs,
    /// German
    DeDe,
    /// Italian
    ItIt,
    /// Brazilian Portuguese
    PtBr,
    /// Any other service language code
    Other(String),
}

impl Language {
    /// Return the service language code
    pub fn code(&self) -> &str {
        match self {
            Language::EnUs => "en-US",
            Language::EnGb => "en-GB",
            Language::FrFr => "fr-FR",
            Language::EsUs => "es-US",
            Language::DeDe => "de-DE",
            Language::ItIt => "it-IT",
            Language::PtBr => "pt-BR",
            Language::Other(code) => code,
        }
    }

    /// Create a language from a service code
    pub fn from_code(code: &str) -> Self {
        match code.to_lowercase().as_str() {
            "en-us" | "en" => Language::EnUs,
            "en-gb" => Language::EnGb,
            "fr-fr" | "fr" => Language::FrFr,
            "es-us" | "es" => Language::EsUs,
            "de-de" | "de" => Language::DeDe,
            "it-it" | "it" => Language::ItIt,
            "pt-br" | "pt" => Language::PtBr,
            _ => Language::Other(code.to_string()),
        }
    }
}

/// STT engine errors
#[derive(Error, Debug)]
pub enum SttError {
    #[error("Session start error: {0}")]
    SessionStart(String),

    #[error("Audio send error: {0}")]
    AudioSend(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Engine not ready")]
    NotReady,
}

/// Seam between the pipeline and the transcription backends
///
/// Audio is pushed as PCM float32 mono at the configured sample rate;
/// events come back through `poll`.
#[cfg_attr(test, mockall::automock)]
pub trait SttEngine: Send {
    /// Push audio samples to the engine
    fn push_audio(&mut self, pcm: &[f32]);

    /// Retrieve the next transcription event, if any
    fn poll(&mut self) -> Option<SttEvent>;

    /// Close the audio input and wait for remaining results
    fn flush(&mut self);

    /// Drop buffered audio and pending events
    fn reset(&mut self);

    /// Engine name for logs and prompts
    fn name(&self) -> &str;

    /// Whether the engine can accept audio
    fn is_ready(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_round_trip() {
        for code in ["en-US", "en-GB", "fr-FR", "es-US", "de-DE", "it-IT", "pt-BR"] {
            assert_eq!(Language::from_code(code).code(), code);
        }
    }

    #[test]
    fn short_codes_map_to_regional_variants() {
        assert_eq!(Language::from_code("en"), Language::EnUs);
        assert_eq!(Language::from_code("fr"), Language::FrFr);
    }

    #[test]
    fn unknown_code_is_preserved() {
        let lang = Language::from_code("ja-JP");
        assert_eq!(lang, Language::Other("ja-JP".to_string()));
        assert_eq!(lang.code(), "ja-JP");
    }

    #[test]
    fn event_final_flag() {
        let segment = TranscriptSegment::new("hello", Some(0.9));
        assert!(SttEvent::Final(segment.clone()).is_final());
        assert!(!SttEvent::Partial(segment).is_final());
    }
}
