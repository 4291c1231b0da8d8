//! Real-time transcription pipeline
//!
//! Orchestrates microphone capture and the STT engine: capture frames
//! flow into the engine, polled events fan out on a broadcast channel.

use crate::audio::{AudioConfig, AudioHandle, MicrophoneError};
use crate::stt::{SttEngine, SttError, SttEvent};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};

/// Pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Audio capture configuration
    pub audio_config: AudioConfig,
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Audio error: {0}")]
    Audio(#[from] MicrophoneError),

    #[error("STT error: {0}")]
    Stt(#[from] SttError),

    #[error("Pipeline already running")]
    AlreadyRunning,
}

/// Pipeline state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
    Error(String),
}

/// Real-time transcription pipeline
pub struct RealtimePipeline<E: SttEngine> {
    config: PipelineConfig,
    engine: Arc<Mutex<E>>,
    status: Arc<RwLock<PipelineStatus>>,
    event_tx: broadcast::Sender<SttEvent>,
    audio_handle: Option<AudioHandle>,
    stop_tx: Option<mpsc::Sender<()>>,
}

impl<E: SttEngine + 'static> RealtimePipeline<E> {
    /// Create a new pipeline around the given engine
    pub fn new(engine: E, config: PipelineConfig) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            config,
            engine: Arc::new(Mutex::new(engine)),
            status: Arc::new(RwLock::new(PipelineStatus::Stopped)),
            event_tx,
            audio_handle: None,
            stop_tx: None,
        }
    }

    /// Start capture from the default microphone
    pub async fn start(&mut self) -> Result<(), PipelineError> {
        let (audio_tx, audio_rx) = mpsc::unbounded_channel::<Vec<f32>>();

        let audio_handle = AudioHandle::start(self.config.audio_config.clone(), move |frame| {
            let _ = audio_tx.send(frame);
        })?;

        match self.start_with_source(audio_rx).await {
            Ok(()) => {
                self.audio_handle = Some(audio_handle);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Start processing frames from an external source
    ///
    /// Used directly for file streaming and in tests; `start` wires the
    /// microphone to this.
    pub async fn start_with_source(
        &mut self,
        mut audio_rx: mpsc::UnboundedReceiver<Vec<f32>>,
    ) -> Result<(), PipelineError> {
        {
            let status = self.status.read().await;
            if *status == PipelineStatus::Running {
                return Err(PipelineError::AlreadyRunning);
            }
        }

        {
            let mut status = self.status.write().await;
            *status = PipelineStatus::Starting;
        }

        // Channel to stop the processing task
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        self.stop_tx = Some(stop_tx);

        let engine = Arc::clone(&self.engine);
        let event_tx = self.event_tx.clone();
        let status = Arc::clone(&self.status);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = audio_rx.recv() => {
                        let Some(frame) = frame else {
                            tracing::debug!("Audio source closed");
                            break;
                        };

                        let mut engine = engine.lock().await;
                        engine.push_audio(&frame);

                        while let Some(event) = engine.poll() {
                            let _ = event_tx.send(event);
                        }
                    }
                    _ = stop_rx.recv() => {
                        tracing::debug!("Stop signal received");
                        break;
                    }
                }
            }

            let mut s = status.write().await;
            if *s == PipelineStatus::Running || *s == PipelineStatus::Starting {
                *s = PipelineStatus::Stopped;
            }
        });

        {
            let mut status = self.status.write().await;
            *status = PipelineStatus::Running;
        }

        tracing::info!("Pipeline started");
        Ok(())
    }

    /// Stop the pipeline, flushing the engine for remaining results
    pub async fn stop(&mut self) -> Result<(), PipelineError> {
        {
            let status = self.status.read().await;
            if *status == PipelineStatus::Stopped {
                return Ok(());
            }
        }

        {
            let mut status = self.status.write().await;
            *status = PipelineStatus::Stopping;
        }

        // Stop audio capture first so no frames arrive during the flush
        if let Some(mut handle) = self.audio_handle.take() {
            handle.stop();
        }

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(()).await;
        }

        // Flush the engine and forward whatever it still holds
        {
            let mut engine = self.engine.lock().await;
            engine.flush();

            while let Some(event) = engine.poll() {
                let _ = self.event_tx.send(event);
            }
        }

        {
            let mut status = self.status.write().await;
            *status = PipelineStatus::Stopped;
        }

        tracing::info!("Pipeline stopped");
        Ok(())
    }

    /// Return the current pipeline status
    pub async fn status(&self) -> PipelineStatus {
        self.status.read().await.clone()
    }

    /// Subscribe to transcription events
    pub fn subscribe(&self) -> broadcast::Receiver<SttEvent> {
        self.event_tx.subscribe()
    }

    /// Return the current configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::{MockSttEngine, TranscriptSegment};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    fn engine_with_events(events: Vec<SttEvent>) -> MockSttEngine {
        let queue = Arc::new(StdMutex::new(VecDeque::from(events)));
        let mut engine = MockSttEngine::new();

        engine.expect_push_audio().returning(|_| ());
        let poll_queue = Arc::clone(&queue);
        engine
            .expect_poll()
            .returning(move || poll_queue.lock().unwrap().pop_front());
        engine.expect_flush().returning(|| ());
        engine.expect_is_ready().returning(|| true);

        engine
    }

    #[tokio::test]
    async fn events_are_forwarded_to_subscribers() {
        let segment = TranscriptSegment::new("hello", Some(0.9));
        let engine = engine_with_events(vec![SttEvent::Final(segment.clone())]);

        let mut pipeline = RealtimePipeline::new(engine, PipelineConfig::default());
        let mut events = pipeline.subscribe();

        let (tx, rx) = mpsc::unbounded_channel();
        pipeline.start_with_source(rx).await.unwrap();

        tx.send(vec![0.0f32; 1024]).unwrap();

        let received = tokio::time::timeout(std::time::Duration::from_secs(1), events.recv())
            .await
            .expect("timed out waiting for event")
            .unwrap();
        assert_eq!(received, SttEvent::Final(segment));

        pipeline.stop().await.unwrap();
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let engine = engine_with_events(Vec::new());
        let mut pipeline = RealtimePipeline::new(engine, PipelineConfig::default());

        let (_tx, rx) = mpsc::unbounded_channel();
        pipeline.start_with_source(rx).await.unwrap();

        let (_tx2, rx2) = mpsc::unbounded_channel();
        assert!(matches!(
            pipeline.start_with_source(rx2).await,
            Err(PipelineError::AlreadyRunning)
        ));

        pipeline.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_flushes_remaining_events() {
        let segment = TranscriptSegment::new("tail", None);
        let engine = engine_with_events(vec![SttEvent::Final(segment.clone())]);

        let mut pipeline = RealtimePipeline::new(engine, PipelineConfig::default());
        let mut events = pipeline.subscribe();

        let (_tx, rx) = mpsc::unbounded_channel();
        pipeline.start_with_source(rx).await.unwrap();
        pipeline.stop().await.unwrap();

        assert_eq!(pipeline.status().await, PipelineStatus::Stopped);
        let received = events.recv().await.unwrap();
        assert_eq!(received, SttEvent::Final(segment));
    }

    #[tokio::test]
    async fn status_transitions_to_running_and_back() {
        let engine = engine_with_events(Vec::new());
        let mut pipeline = RealtimePipeline::new(engine, PipelineConfig::default());
        assert_eq!(pipeline.status().await, PipelineStatus::Stopped);

        let (_tx, rx) = mpsc::unbounded_channel();
        pipeline.start_with_source(rx).await.unwrap();
        assert_eq!(pipeline.status().await, PipelineStatus::Running);

        pipeline.stop().await.unwrap();
        assert_eq!(pipeline.status().await, PipelineStatus::Stopped);
    }
}
