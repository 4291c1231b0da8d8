//! WAV file decoding for the file-streaming demo
//!
//! Decodes to the same shape the microphone produces: f32 mono at the
//! target sample rate.

use super::microphone::{downmix_to_mono, resample};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WavError {
    #[error("Could not open WAV file: {0}")]
    Open(String),

    #[error("Could not decode WAV samples: {0}")]
    Decode(String),
}

/// Load a WAV file as f32 mono samples at the target rate
pub fn load_mono_f32(path: &Path, target_rate: u32) -> Result<Vec<f32>, WavError> {
    let reader = hound::WavReader::open(path).map_err(|e| WavError::Open(e.to_string()))?;
    let spec = reader.spec();

    tracing::info!(
        "WAV file: {}Hz {}ch {}bit -> {}Hz mono",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        target_rate
    );

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| WavError::Decode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(|e| WavError::Decode(e.to_string()))?
        }
    };

    let mono = downmix_to_mono(&samples, spec.channels);
    Ok(resample(&mono, spec.sample_rate, target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn mono_wav_at_target_rate_decodes_unscaled() {
        let path = std::env::temp_dir().join("hark_test_mono.wav");
        write_wav(&path, 16_000, 1, &[0, 16384, -16384]);

        let samples = load_mono_f32(&path, 16_000).unwrap();
        assert_eq!(samples.len(), 3);
        assert!((samples[0]).abs() < 1e-6);
        assert!((samples[1] - 0.5).abs() < 1e-3);
        assert!((samples[2] + 0.5).abs() < 1e-3);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn stereo_wav_is_downmixed() {
        let path = std::env::temp_dir().join("hark_test_stereo.wav");
        // Interleaved L/R frames averaging to 0
        write_wav(&path, 16_000, 2, &[16384, -16384, 16384, -16384]);

        let samples = load_mono_f32(&path, 16_000).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.abs() < 1e-3));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn higher_rate_wav_is_resampled_down() {
        let path = std::env::temp_dir().join("hark_test_48k.wav");
        write_wav(&path, 48_000, 1, &vec![0i16; 4800]);

        let samples = load_mono_f32(&path, 16_000).unwrap();
        // 100ms of 48kHz audio becomes 100ms at 16kHz
        assert_eq!(samples.len(), 1600);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let result = load_mono_f32(Path::new("/no/such/file.wav"), 16_000);
        assert!(matches!(result, Err(WavError::Open(_))));
    }
}
