//! Interactive transcription demo
//!
//! Menu-driven: stream from the microphone, stream a WAV file in
//! real-time-paced chunks, or run a batch transcription job.

use anyhow::Result;
use hark::audio::{self, AudioConfig, AudioHandle};
use hark::config::Settings;
use hark::credentials;
use hark::stt::{BatchTranscriber, SttEngine, StreamingEngine, StreamingSettings};
use hark::transcript::TranscriptCollector;
use std::io::Write;
use std::path::Path;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    hark::init_tracing();

    println!("🎤 AWS Transcribe demo");
    println!("{}", "=".repeat(40));

    let settings = Settings::from_env()?;
    let aws = credentials::load_aws_config(&settings.region).await;

    if let Err(e) = credentials::verify_credentials(&aws).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    println!();
    println!("Choose an option:");
    println!("1. Stream from microphone (real-time)");
    println!("2. Stream from WAV file");
    println!("3. Transcribe audio file (batch)");
    println!("4. Exit");

    let choice = prompt("\nEnter your choice (1-4): ")?;

    match choice.as_str() {
        "1" => stream_microphone(&settings, &aws).await?,
        "2" => {
            let path = prompt("Enter path to WAV file: ")?;
            stream_wav_file(&settings, &aws, Path::new(&path)).await?;
        }
        "3" => {
            let path = prompt("Enter path to audio file (or s3:// URI): ")?;
            batch_transcribe(&settings, &aws, &path).await?;
        }
        "4" => println!("👋 Goodbye!"),
        _ => println!("❌ Invalid choice!"),
    }

    Ok(())
}

/// Read one trimmed line from stdin
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn new_engine(settings: &Settings, aws: &aws_config::SdkConfig) -> StreamingEngine {
    let client = aws_sdk_transcribestreaming::Client::new(aws);
    StreamingEngine::start(
        client,
        StreamingSettings {
            language: settings.language.clone(),
            sample_rate: settings.sample_rate,
        },
    )
}

/// Stream the default microphone until Ctrl+C
async fn stream_microphone(settings: &Settings, aws: &aws_config::SdkConfig) -> Result<()> {
    let mut engine = new_engine(settings, aws);

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

    println!("🎙️  Listening... Speak now! (Ctrl+C to stop)");
    println!();
    println!("📝 Transcription results:");
    println!("{}", "-".repeat(50));

    let mut collector = TranscriptCollector::new();

    loop {
        tokio::select! {
            Some(frame) = audio_rx.recv() => {
                engine.push_audio(&frame);
                drain_events(&mut engine, &mut collector);
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("🛑 Stopping transcription...");
                break;
            }
        }
    }

    audio.stop();
    engine.flush();
    drain_events(&mut engine, &mut collector);

    Ok(())
}

/// Stream a WAV file in real-time-paced chunks
async fn stream_wav_file(
    settings: &Settings,
    aws: &aws_config::SdkConfig,
    path: &Path,
) -> Result<()> {
    println!("📁 Streaming from file: {}", path.display());

    let samples = audio::load_mono_f32(path, settings.sample_rate)?;
    let mut engine = new_engine(settings, aws);
    let mut collector = TranscriptCollector::new();

    println!();
    println!("📝 Transcription results:");
    println!("{}", "-".repeat(50));

    for frame in samples.chunks(settings.chunk_size) {
        engine.push_audio(frame);
        drain_events(&mut engine, &mut collector);

        // Pace chunks at their playback duration so the stream looks live
        tokio::time::sleep(settings.chunk_duration()).await;
    }

    engine.flush();
    drain_events(&mut engine, &mut collector);

    let transcript = collector.take_text();
    if !transcript.is_empty() {
        println!();
        println!("Full transcript: {}", transcript);
    }

    Ok(())
}

/// Run a batch transcription job and print the fetched transcript
async fn batch_transcribe(
    settings: &Settings,
    aws: &aws_config::SdkConfig,
    source: &str,
) -> Result<()> {
    println!("📁 Starting batch transcription for: {}", source);
    println!("⏳ Transcription job started. Waiting for completion...");

    let client = aws_sdk_transcribe::Client::new(aws);
    let transcriber = BatchTranscriber::new(client, settings.language.clone());

    match transcriber.run(source).await {
        Ok(outcome) => {
            println!("✅ Transcription completed!");
            println!("🔄 Job name: {}", outcome.job_name);
            println!("📄 Results available at: {}", outcome.transcript_uri);
            println!();
            println!("Transcript: {}", outcome.text);
        }
        Err(e) => {
            eprintln!("❌ {}", e);
        }
    }

    Ok(())
}

fn drain_events(engine: &mut StreamingEngine, collector: &mut TranscriptCollector) {
    while let Some(event) = engine.poll() {
        if let Some(line) = collector.record(&event) {
            println!("{}", line);
        }
    }
}
