//! Audio capture module
//!
//! Handles microphone capture in a dedicated thread, plus WAV file
//! decoding for the file-streaming demo.

mod microphone;
mod wavfile;

pub use microphone::{
    device_report, list_devices, AudioConfig, AudioHandle, DeviceInfo, MicrophoneError,
};
pub use wavfile::{load_mono_f32, WavError};
