//! Minimal streaming transcription example
//!
//! Drives the streaming engine directly, without the pipeline: one
//! channel from the capture thread, one loop that pushes audio and
//! prints final results.

use anyhow::Result;
use hark::audio::{AudioConfig, AudioHandle};
use hark::config::Settings;
use hark::credentials;
use hark::stt::{SttEngine, SttEvent, StreamingEngine, StreamingSettings};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    hark::init_tracing();

    let settings = Settings::from_env()?;
    let aws = credentials::load_aws_config(&settings.region).await;
    let client = aws_sdk_transcribestreaming::Client::new(&aws);

    let mut engine = StreamingEngine::start(
        client,
        StreamingSettings {
            language: settings.language.clone(),
            sample_rate: settings.sample_rate,
        },
    );

    let (audio_tx, mut audio_rx) = mpsc::unbounded_channel::<Vec<f32>>();
    let mut audio = AudioHandle::start(
        AudioConfig {
            target_sample_rate: settings.sample_rate,
            chunk_size: settings.chunk_size,
        },
        move |frame| {
            let _ = audio_tx.send(frame);
        },
    )?;

    println!("🎤 Listening... Speak now! (Ctrl+C to stop)");

    loop {
        tokio::select! {
            Some(frame) = audio_rx.recv() => {
                engine.push_audio(&frame);
                while let Some(event) = engine.poll() {
                    if let SttEvent::Final(segment) = event {
                        println!(
                            "📝 {} (confidence: {:.2})",
                            segment.text,
                            segment.confidence.unwrap_or(0.0)
                        );
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("🛑 Stopping...");
                break;
            }
        }
    }

    audio.stop();
    engine.flush();
    while let Some(event) = engine.poll() {
        if let SttEvent::Final(segment) = event {
            println!(
                "📝 {} (confidence: {:.2})",
                segment.text,
                segment.confidence.unwrap_or(0.0)
            );
        }
    }

    Ok(())
}
