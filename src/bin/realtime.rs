//! Real-time microphone transcription
//!
//! Checks credentials, then streams the default microphone to AWS
//! Transcribe until Ctrl+C, printing finalized segments as they arrive.

use anyhow::Result;
use hark::audio::AudioConfig;
use hark::config::Settings;
use hark::credentials;
use hark::pipeline::{PipelineConfig, RealtimePipeline};
use hark::stt::{StreamingEngine, StreamingSettings};
use hark::transcript::TranscriptCollector;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    hark::init_tracing();

    println!("🎤 Real-time AWS Transcribe speech-to-text");
    println!("{}", "=".repeat(50));

    let settings = Settings::from_env()?;
    let aws = credentials::load_aws_config(&settings.region).await;

    match credentials::verify_credentials(&aws).await {
        Ok(identity) => println!("✅ AWS credentials found (account {})", identity.account),
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }

    let client = aws_sdk_transcribestreaming::Client::new(&aws);
    let engine = StreamingEngine::start(
        client,
        StreamingSettings {
            language: settings.language.clone(),
            sample_rate: settings.sample_rate,
        },
    );

    let mut pipeline = RealtimePipeline::new(
        engine,
        PipelineConfig {
            audio_config: AudioConfig {
                target_sample_rate: settings.sample_rate,
                chunk_size: settings.chunk_size,
            },
        },
    );

    let mut events = pipeline.subscribe();
    pipeline.start().await?;

    println!("🎙️  Listening... Speak now! (Ctrl+C to stop)");
    println!("{}", "-".repeat(50));

    let mut collector = TranscriptCollector::new();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(line) = collector.record(&event) {
                        println!("{}", line);
                    }
                }
                Err(RecvError::Lagged(count)) => {
                    tracing::warn!("Dropped {} transcript events", count);
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("🛑 Stopping transcription...");
                break;
            }
        }
    }

    pipeline.stop().await?;

    // The flush may have surfaced trailing segments
    while let Ok(event) = events.try_recv() {
        if let Some(line) = collector.record(&event) {
            println!("{}", line);
        }
    }

    let transcript = collector.take_text();
    if !transcript.is_empty() {
        println!();
        println!("Full transcript: {}", transcript);
    }

    Ok(())
}
