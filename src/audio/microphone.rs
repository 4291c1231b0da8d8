//! Audio capture from microphone
//!
//! Uses cpal for cross-platform capture. The device is opened at its
//! native configuration in a dedicated thread; buffers are downmixed to
//! mono, resampled to the target rate and re-chunked into fixed-size
//! frames before they reach the callback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Audio configuration for capture
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Target sample rate (16kHz for Transcribe)
    pub target_sample_rate: u32,
    /// Samples per frame delivered to the callback
    pub chunk_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: crate::config::DEFAULT_SAMPLE_RATE,
            chunk_size: crate::config::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Microphone capture errors
#[derive(Error, Debug)]
pub enum MicrophoneError {
    #[error("No audio input device found")]
    NoDevice,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Audio thread not started")]
    NotStarted,
}

/// Input device description for the setup demo
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub channels: u16,
    pub sample_rate: u32,
}

/// Commands to control the audio thread
enum AudioCommand {
    Stop,
}

/// Handle to control audio capture
pub struct AudioHandle {
    command_tx: mpsc::Sender<AudioCommand>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AudioHandle {
    /// Start audio capture in a dedicated thread
    ///
    /// The callback receives mono frames of exactly `chunk_size` samples
    /// at `target_sample_rate`; a trailing partial frame is dropped when
    /// capture stops.
    pub fn start<F>(config: AudioConfig, frame_callback: F) -> Result<Self, MicrophoneError>
    where
        F: Fn(Vec<f32>) + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel();

        let thread_handle = thread::spawn(move || {
            if let Err(e) = run_audio_capture(config, frame_callback, command_rx) {
                tracing::error!("Audio capture error: {}", e);
            }
        });

        Ok(Self {
            command_tx,
            thread_handle: Some(thread_handle),
        })
    }

    /// Stop audio capture
    pub fn stop(&mut self) {
        let _ = self.command_tx.send(AudioCommand::Stop);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AudioHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// List available input device names
pub fn list_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.input_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

/// Describe available input devices (name, channels, default rate)
pub fn device_report() -> Vec<DeviceInfo> {
    let host = cpal::default_host();
    let Ok(devices) = host.input_devices() else {
        return Vec::new();
    };

    devices
        .filter_map(|device| {
            let name = device.name().ok()?;
            let config = device.default_input_config().ok()?;
            Some(DeviceInfo {
                name,
                channels: config.channels(),
                sample_rate: config.sample_rate().0,
            })
        })
        .collect()
}

/// Re-chunks arbitrary sample buffers into fixed-size frames
struct Framer {
    chunk_size: usize,
    pending: Vec<f32>,
}

impl Framer {
    fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            pending: Vec::with_capacity(chunk_size),
        }
    }

    fn push(&mut self, samples: &[f32], mut emit: impl FnMut(Vec<f32>)) {
        self.pending.extend_from_slice(samples);
        while self.pending.len() >= self.chunk_size {
            let rest = self.pending.split_off(self.chunk_size);
            let frame = std::mem::replace(&mut self.pending, rest);
            emit(frame);
        }
    }
}

/// Simple linear resample from source_rate to target_rate
pub(crate) fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let output_len = (samples.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_idx = i as f64 * ratio;
        let idx_floor = src_idx.floor() as usize;
        let idx_ceil = (idx_floor + 1).min(samples.len() - 1);
        let frac = src_idx - idx_floor as f64;

        let sample = samples[idx_floor] * (1.0 - frac as f32) + samples[idx_ceil] * frac as f32;
        output.push(sample);
    }

    output
}

/// Convert interleaved multi-channel audio to mono
pub(crate) fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels == 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Run audio capture (in a dedicated thread)
fn run_audio_capture<F>(
    config: AudioConfig,
    frame_callback: F,
    command_rx: mpsc::Receiver<AudioCommand>,
) -> Result<(), MicrophoneError>
where
    F: Fn(Vec<f32>) + Send + 'static,
{
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(MicrophoneError::NoDevice)?;

    tracing::info!("Audio device: {:?}", device.name());

    // Use the device's default configuration
    let supported_config = device
        .default_input_config()
        .map_err(|e| MicrophoneError::ConfigError(e.to_string()))?;

    let source_sample_rate = supported_config.sample_rate().0;
    let source_channels = supported_config.channels();
    let target_rate = config.target_sample_rate;
    let chunk_size = config.chunk_size;

    tracing::info!(
        "Audio config: {}Hz {}ch -> {}Hz mono, {} samples/frame",
        source_sample_rate,
        source_channels,
        target_rate,
        chunk_size
    );

    let stream_config = supported_config.into();
    let mut framer = Framer::new(chunk_size);

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono = downmix_to_mono(data, source_channels);
                let resampled = resample(&mono, source_sample_rate, target_rate);
                framer.push(&resampled, |frame| frame_callback(frame));
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| MicrophoneError::StreamError(e.to_string()))?;

    stream
        .play()
        .map_err(|e| MicrophoneError::StreamError(e.to_string()))?;

    tracing::info!("Audio capture started");

    // Wait for stop signal
    loop {
        match command_rx.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(AudioCommand::Stop) => {
                tracing::info!("Audio capture stopped");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_identity_at_equal_rates() {
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(resample(&samples, 16_000, 16_000), samples);
    }

    #[test]
    fn resample_halves_length_at_double_rate() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let out = resample(&samples, 32_000, 16_000);
        assert_eq!(out.len(), 50);
        // First sample is untouched by interpolation
        assert!((out[0] - samples[0]).abs() < f32::EPSILON);
    }

    #[test]
    fn mono_passthrough() {
        let samples = vec![0.5, -0.5, 0.25];
        assert_eq!(downmix_to_mono(&samples, 1), samples);
    }

    #[test]
    fn stereo_downmix_averages_channels() {
        let samples = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix_to_mono(&samples, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn framer_emits_fixed_size_frames() {
        let mut framer = Framer::new(4);
        let mut frames = Vec::new();

        framer.push(&[1.0, 2.0, 3.0], |f| frames.push(f));
        assert!(frames.is_empty());

        framer.push(&[4.0, 5.0, 6.0, 7.0, 8.0, 9.0], |f| frames.push(f));
        assert_eq!(frames, vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]]);

        // Remainder stays pending
        framer.push(&[10.0, 11.0, 12.0], |f| frames.push(f));
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2], vec![9.0, 10.0, 11.0, 12.0]);
    }
}
