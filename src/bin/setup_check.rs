//! Setup test for the transcription demos
//!
//! Verifies the pieces independently: AWS credentials, microphone
//! capture, and input device discovery.

use anyhow::Result;
use hark::audio::{self, AudioConfig, AudioHandle};
use hark::config::Settings;
use hark::credentials;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    hark::init_tracing();

    println!("🎤 AWS Transcribe setup test");
    println!("{}", "=".repeat(40));

    let settings = Settings::from_env()?;

    println!();
    println!("Choose an option:");
    println!("1. Test AWS connection");
    println!("2. Test microphone");
    println!("3. List audio devices");
    println!("4. Run all tests");
    println!("5. Exit");

    let choice = prompt("\nEnter your choice (1-5): ")?;

    match choice.as_str() {
        "1" => test_aws_connection(&settings).await,
        "2" => test_microphone(&settings).await,
        "3" => list_audio_devices(),
        "4" => {
            test_aws_connection(&settings).await;
            test_microphone(&settings).await;
            list_audio_devices();
        }
        "5" => println!("👋 Goodbye!"),
        _ => println!("❌ Invalid choice!"),
    }

    Ok(())
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Check credentials with an STS caller-identity call
async fn test_aws_connection(settings: &Settings) {
    println!();
    println!("🔑 Testing AWS connection...");
    println!("{}", "-".repeat(40));

    let aws = credentials::load_aws_config(&settings.region).await;
    match credentials::verify_credentials(&aws).await {
        Ok(identity) => {
            println!("✅ AWS connection successful!");
            println!("Account: {}", identity.account);
            println!("User ID: {}", identity.user_id);
            println!("ARN: {}", identity.arn);
        }
        Err(e) => {
            println!("❌ AWS connection failed: {}", e);
        }
    }
}

/// Record three seconds from the default microphone
async fn test_microphone(settings: &Settings) {
    println!();
    println!("🎤 Testing microphone...");
    println!("{}", "-".repeat(40));

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Vec<f32>>();
    let audio = AudioHandle::start(
        AudioConfig {
            target_sample_rate: settings.sample_rate,
            chunk_size: settings.chunk_size,
        },
        move |frame| {
            let _ = frame_tx.send(frame);
        },
    );

    let mut audio = match audio {
        Ok(handle) => handle,
        Err(e) => {
            println!("❌ Microphone test failed: {}", e);
            return;
        }
    };

    println!("🎙️  Microphone is working! Recording for 3 seconds...");
    println!("Speak now!");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    let mut frames = 0usize;

    loop {
        tokio::select! {
            Some(_) = frame_rx.recv() => {
                frames += 1;
                print!(".");
                let _ = std::io::stdout().flush();
            }
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }

    audio.stop();
    println!();

    if frames > 0 {
        println!("✅ Microphone test completed successfully! ({} frames)", frames);
    } else {
        println!("❌ No audio frames captured. Check your input device.");
    }
}

/// Show every input device with its channels and default rate
fn list_audio_devices() {
    println!();
    println!("🎤 Available audio devices:");
    println!("{}", "-".repeat(40));

    let devices = audio::device_report();
    if devices.is_empty() {
        println!("No input devices found.");
        return;
    }

    for (index, device) in devices.iter().enumerate() {
        println!("Device {}: {}", index, device.name);
        println!("  - Channels: {}", device.channels);
        println!("  - Sample rate: {}", device.sample_rate);
        println!();
    }
}
