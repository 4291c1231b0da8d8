//! hark - AWS Transcribe speech-to-text demos
//!
//! Captures microphone audio and forwards it to the AWS Transcribe
//! service, printing finalized transcripts. Streaming (microphone or
//! WAV file) and batch transcription are both covered; the demo
//! binaries live under `src/bin/`.

pub mod audio;
pub mod config;
pub mod credentials;
pub mod pipeline;
pub mod stt;
pub mod transcript;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for the demo binaries
///
/// `RUST_LOG` overrides the default `hark=info` filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hark=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
