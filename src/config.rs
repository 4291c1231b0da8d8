//! Settings shared by the demo binaries
//!
//! Everything comes from the environment (a `.env` file is honored when
//! present), with defaults matching what the Transcribe streaming API
//! expects for speech: 16kHz mono PCM in 1024-sample chunks.

use crate::stt::Language;
use thiserror::Error;

/// Default AWS region when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Sample rate the engines expect (Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Samples per audio frame sent to the service
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Sample rate must be non-zero")]
    ZeroSampleRate,

    #[error("Chunk size must be non-zero")]
    ZeroChunkSize,
}

/// Runtime settings for capture and transcription
#[derive(Debug, Clone)]
pub struct Settings {
    /// AWS region for the Transcribe service
    pub region: String,
    /// Language submitted with transcription requests
    pub language: Language,
    /// Target capture sample rate (Hz)
    pub sample_rate: u32,
    /// Samples per frame pushed to the engine
    pub chunk_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            language: Language::EnUs,
            sample_rate: DEFAULT_SAMPLE_RATE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Settings {
    /// Build settings from the environment, falling back to defaults
    ///
    /// Honors `AWS_REGION` (then `AWS_DEFAULT_REGION`), `HARK_LANGUAGE`,
    /// `HARK_SAMPLE_RATE` and `HARK_CHUNK_SIZE`.
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Some(region) = first_env(&["AWS_REGION", "AWS_DEFAULT_REGION"]) {
            settings.region = region;
        }

        if let Ok(lang) = std::env::var("HARK_LANGUAGE") {
            settings.language = Language::from_code(&lang);
        }

        if let Ok(rate) = std::env::var("HARK_SAMPLE_RATE") {
            settings.sample_rate = rate.parse().map_err(|_| SettingsError::InvalidValue {
                var: "HARK_SAMPLE_RATE",
                value: rate,
            })?;
        }

        if let Ok(chunk) = std::env::var("HARK_CHUNK_SIZE") {
            settings.chunk_size = chunk.parse().map_err(|_| SettingsError::InvalidValue {
                var: "HARK_CHUNK_SIZE",
                value: chunk,
            })?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations the service or the capture layer cannot use
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.sample_rate == 0 {
            return Err(SettingsError::ZeroSampleRate);
        }
        if self.chunk_size == 0 {
            return Err(SettingsError::ZeroChunkSize);
        }
        Ok(())
    }

    /// Duration of one audio chunk at the configured rate
    pub fn chunk_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.chunk_size as f64 / self.sample_rate as f64)
    }
}

fn first_env(vars: &[&str]) -> Option<String> {
    vars.iter()
        .filter_map(|v| std::env::var(v).ok())
        .find(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.region, "us-east-1");
        assert_eq!(settings.sample_rate, 16_000);
        assert_eq!(settings.chunk_size, 1024);
        assert_eq!(settings.language, Language::EnUs);
    }

    #[test]
    fn zero_sample_rate_rejected() {
        let settings = Settings {
            sample_rate: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::ZeroSampleRate)
        ));
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let settings = Settings {
            chunk_size: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::ZeroChunkSize)
        ));
    }

    #[test]
    fn chunk_duration_matches_rate() {
        let settings = Settings::default();
        // 1024 samples at 16kHz = 64ms
        assert_eq!(settings.chunk_duration().as_millis(), 64);
    }
}
