//! AWS Transcribe streaming engine
//!
//! Runs the duplex streaming session in a background task: audio pushed
//! into the engine is forwarded as PCM chunks on the session's input
//! stream, transcript events drain into a shared queue that `poll`
//! consumes. Closing the input (flush) makes the service finalize and
//! end the result stream.

use super::engine::{Language, SttEngine, SttError, SttEvent, TranscriptSegment};
use async_stream::stream;
use aws_sdk_transcribestreaming::primitives::Blob;
use aws_sdk_transcribestreaming::types::{
    AudioEvent, AudioStream, LanguageCode, MediaEncoding, TranscriptEvent, TranscriptResultStream,
};
use aws_sdk_transcribestreaming::Client;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Session parameters for a streaming transcription
#[derive(Debug, Clone)]
pub struct StreamingSettings {
    /// Language submitted with the session
    pub language: Language,
    /// PCM sample rate of the pushed audio (Hz)
    pub sample_rate: u32,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            language: Language::EnUs,
            sample_rate: crate::config::DEFAULT_SAMPLE_RATE,
        }
    }
}

/// STT engine backed by the Transcribe streaming API
pub struct StreamingEngine {
    settings: StreamingSettings,
    audio_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    /// Events ready to be consumed
    shared_events: Arc<Mutex<VecDeque<SttEvent>>>,
    /// First error raised by the session task
    session_error: Arc<Mutex<Option<String>>>,
    /// Cleared when the session task exits
    running: Arc<AtomicBool>,
}

impl StreamingEngine {
    /// Open a streaming session and return the engine driving it
    pub fn start(client: Client, settings: StreamingSettings) -> Self {
        let (audio_tx, audio_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let shared_events = Arc::new(Mutex::new(VecDeque::new()));
        let session_error = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));

        tracing::info!(
            "Starting Transcribe streaming session ({}Hz, {})",
            settings.sample_rate,
            settings.language.code()
        );

        tokio::spawn(run_session(
            client,
            settings.clone(),
            audio_rx,
            Arc::clone(&shared_events),
            Arc::clone(&session_error),
            Arc::clone(&running),
        ));

        Self {
            settings,
            audio_tx: Some(audio_tx),
            shared_events,
            session_error,
            running,
        }
    }

    /// Session parameters this engine was started with
    pub fn settings(&self) -> &StreamingSettings {
        &self.settings
    }

    /// First error the session task reported, if any
    pub fn last_error(&self) -> Option<SttError> {
        self.session_error
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
            .map(SttError::Service)
    }

    /// Wait for the session task to drain, bounded by a timeout
    fn wait_for_session(&self) {
        let start = std::time::Instant::now();
        while self.running.load(Ordering::SeqCst) {
            if start.elapsed() > std::time::Duration::from_secs(5) {
                tracing::warn!("Timeout waiting for streaming session to finish");
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
    }
}

impl SttEngine for StreamingEngine {
    fn push_audio(&mut self, pcm: &[f32]) {
        if let Some(ref tx) = self.audio_tx {
            if tx.send(pcm_to_i16_bytes(pcm)).is_err() {
                tracing::warn!("Streaming session closed, dropping audio");
                self.audio_tx = None;
            }
        }
    }

    fn poll(&mut self) -> Option<SttEvent> {
        if let Ok(mut events) = self.shared_events.lock() {
            events.pop_front()
        } else {
            None
        }
    }

    fn flush(&mut self) {
        // Closing the input channel ends the audio stream; the service
        // then finalizes pending results and closes the output side.
        self.audio_tx = None;
        self.wait_for_session();
    }

    fn reset(&mut self) {
        if let Ok(mut events) = self.shared_events.lock() {
            events.clear();
        }
        if let Ok(mut slot) = self.session_error.lock() {
            *slot = None;
        }
    }

    fn name(&self) -> &str {
        "AWS Transcribe streaming"
    }

    fn is_ready(&self) -> bool {
        self.audio_tx.is_some() && self.running.load(Ordering::SeqCst)
    }
}

/// Drive one duplex session from start to end of the result stream
async fn run_session(
    client: Client,
    settings: StreamingSettings,
    mut audio_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    events: Arc<Mutex<VecDeque<SttEvent>>>,
    error_slot: Arc<Mutex<Option<String>>>,
    running: Arc<AtomicBool>,
) {
    let input_stream = stream! {
        while let Some(chunk) = audio_rx.recv().await {
            yield Ok(AudioStream::AudioEvent(
                AudioEvent::builder().audio_chunk(Blob::new(chunk)).build(),
            ));
        }
    };

    let started = client
        .start_stream_transcription()
        .language_code(LanguageCode::from(settings.language.code()))
        .media_sample_rate_hertz(settings.sample_rate as i32)
        .media_encoding(MediaEncoding::Pcm)
        .audio_stream(input_stream.into())
        .send()
        .await;

    let mut output = match started {
        Ok(output) => output,
        Err(e) => {
            let message = e.to_string();
            tracing::error!("Failed to start streaming session: {}", message);
            record_error(&error_slot, message);
            running.store(false, Ordering::SeqCst);
            return;
        }
    };

    loop {
        match output.transcript_result_stream.recv().await {
            Ok(Some(TranscriptResultStream::TranscriptEvent(event))) => {
                push_events(&events, event);
            }
            Ok(Some(_)) => continue,
            Ok(None) => {
                tracing::debug!("Transcript result stream ended");
                break;
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!("Streaming session error: {}", message);
                record_error(&error_slot, message);
                break;
            }
        }
    }

    running.store(false, Ordering::SeqCst);
}

fn record_error(slot: &Arc<Mutex<Option<String>>>, message: String) {
    if let Ok(mut slot) = slot.lock() {
        slot.get_or_insert(message);
    }
}

/// Turn one service event into queue entries
fn push_events(events: &Arc<Mutex<VecDeque<SttEvent>>>, event: TranscriptEvent) {
    let results = event
        .transcript
        .and_then(|t| t.results)
        .unwrap_or_default();

    for result in results {
        let Some(alternative) = result.alternatives.as_ref().and_then(|a| a.first()) else {
            continue;
        };
        let Some(text) = alternative.transcript.as_deref() else {
            continue;
        };
        if text.is_empty() {
            continue;
        }

        let confidence = mean_confidence(
            alternative
                .items
                .iter()
                .flatten()
                .filter_map(|item| item.confidence),
        );

        let segment = TranscriptSegment::new(text, confidence);
        let stt_event = if result.is_partial {
            SttEvent::Partial(segment)
        } else {
            SttEvent::Final(segment)
        };

        if let Ok(mut queue) = events.lock() {
            queue.push_back(stt_event);
        }
    }
}

/// Mean of the reported per-item confidences, None when none are present
fn mean_confidence(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

/// Convert f32 samples to 16-bit little-endian PCM bytes
fn pcm_to_i16_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_conversion_is_little_endian() {
        let bytes = pcm_to_i16_bytes(&[0.0, 1.0, -1.0]);
        assert_eq!(bytes.len(), 6);
        assert_eq!(&bytes[0..2], &0i16.to_le_bytes());
        assert_eq!(&bytes[2..4], &32767i16.to_le_bytes());
        assert_eq!(&bytes[4..6], &(-32767i16).to_le_bytes());
    }

    #[test]
    fn pcm_conversion_clamps_out_of_range() {
        let bytes = pcm_to_i16_bytes(&[2.0, -2.0]);
        assert_eq!(&bytes[0..2], &32767i16.to_le_bytes());
        assert_eq!(&bytes[2..4], &(-32768i16).to_le_bytes());
    }

    #[test]
    fn mean_confidence_averages_present_values() {
        let mean = mean_confidence([0.8, 1.0, 0.6].into_iter()).unwrap();
        assert!((mean - 0.8).abs() < 1e-9);
    }

    #[test]
    fn mean_confidence_empty_is_none() {
        assert_eq!(mean_confidence(std::iter::empty()), None);
    }
}
