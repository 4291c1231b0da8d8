//! AWS Transcribe batch jobs
//!
//! Starts a transcription job for a file, polls it to a terminal state,
//! then downloads the finished transcript document and extracts the
//! text. Local paths become `file://` URIs; `s3://` URIs pass through
//! unchanged.

use super::engine::Language;
use aws_sdk_transcribe::types::{LanguageCode, Media, MediaFormat, TranscriptionJobStatus};
use aws_sdk_transcribe::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// How often job status is polled
const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Audio file not found: {0}")]
    FileNotFound(String),

    #[error("Could not start transcription job: {0}")]
    StartJob(String),

    #[error("Could not poll transcription job: {0}")]
    Poll(String),

    #[error("Transcription job failed: {0}")]
    JobFailed(String),

    #[error("Service response is missing the transcription job")]
    MissingJob,

    #[error("Completed job has no transcript URI")]
    MissingTranscriptUri,

    #[error("Could not fetch transcript document: {0}")]
    Fetch(String),

    #[error("Could not parse transcript document: {0}")]
    Parse(String),
}

/// Result of a finished batch job
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub job_name: String,
    pub transcript_uri: String,
    pub text: String,
}

/// Runs batch transcription jobs against the Transcribe service
pub struct BatchTranscriber {
    client: Client,
    http: reqwest::Client,
    language: Language,
    poll_interval: Duration,
}

impl BatchTranscriber {
    pub fn new(client: Client, language: Language) -> Self {
        Self {
            client,
            http: reqwest::Client::new(),
            language,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Transcribe a local file or `s3://` object, waiting for completion
    pub async fn run(&self, source: &str) -> Result<BatchOutcome, BatchError> {
        let uri = media_uri(source)?;
        let format = guess_media_format(source);
        let job_name = job_name();

        tracing::info!("Starting batch transcription job {} for {}", job_name, uri);

        self.client
            .start_transcription_job()
            .transcription_job_name(&job_name)
            .language_code(LanguageCode::from(self.language.code()))
            .media_format(format)
            .media(Media::builder().media_file_uri(&uri).build())
            .send()
            .await
            .map_err(|e| BatchError::StartJob(e.to_string()))?;

        let transcript_uri = self.wait_for_completion(&job_name).await?;
        let text = self.fetch_transcript_text(&transcript_uri).await?;

        Ok(BatchOutcome {
            job_name,
            transcript_uri,
            text,
        })
    }

    /// Poll job status every few seconds until COMPLETED or FAILED
    async fn wait_for_completion(&self, job_name: &str) -> Result<String, BatchError> {
        loop {
            let response = self
                .client
                .get_transcription_job()
                .transcription_job_name(job_name)
                .send()
                .await
                .map_err(|e| BatchError::Poll(e.to_string()))?;

            let job = response.transcription_job().ok_or(BatchError::MissingJob)?;
            let status = job.transcription_job_status();

            if status == Some(&TranscriptionJobStatus::Completed) {
                tracing::info!("Job {} completed", job_name);
                return job
                    .transcript()
                    .and_then(|t| t.transcript_file_uri())
                    .map(str::to_string)
                    .ok_or(BatchError::MissingTranscriptUri);
            }

            if status == Some(&TranscriptionJobStatus::Failed) {
                let reason = job.failure_reason().unwrap_or("Unknown").to_string();
                return Err(BatchError::JobFailed(reason));
            }

            tracing::debug!("Job {} status: {:?}", job_name, status);
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Download the transcript document and extract the text
    async fn fetch_transcript_text(&self, uri: &str) -> Result<String, BatchError> {
        let response = self
            .http
            .get(uri)
            .send()
            .await
            .map_err(|e| BatchError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BatchError::Fetch(format!(
                "transcript download returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BatchError::Fetch(e.to_string()))?;

        parse_transcript_document(&body)
    }
}

/// Shape of the service's transcript JSON document
#[derive(Debug, Deserialize)]
struct TranscriptDocument {
    results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptResults {
    transcripts: Vec<TranscriptText>,
}

#[derive(Debug, Deserialize)]
struct TranscriptText {
    transcript: String,
}

fn parse_transcript_document(body: &str) -> Result<String, BatchError> {
    let document: TranscriptDocument =
        serde_json::from_str(body).map_err(|e| BatchError::Parse(e.to_string()))?;

    Ok(document
        .results
        .transcripts
        .into_iter()
        .map(|t| t.transcript)
        .collect::<Vec<_>>()
        .join(" "))
}

/// Unique job name per invocation
fn job_name() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("hark-{}", timestamp)
}

/// Map a source argument to the media URI the service expects
fn media_uri(source: &str) -> Result<String, BatchError> {
    if source.starts_with("s3://") {
        return Ok(source.to_string());
    }

    let path = Path::new(source);
    if !path.exists() {
        return Err(BatchError::FileNotFound(source.to_string()));
    }

    let absolute = path
        .canonicalize()
        .map_err(|e| BatchError::FileNotFound(format!("{}: {}", source, e)))?;
    Ok(format!("file://{}", absolute.display()))
}

/// Pick the media format from the file extension, defaulting to WAV
fn guess_media_format(source: &str) -> MediaFormat {
    let extension = Path::new(source)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("mp3") => MediaFormat::Mp3,
        Some("mp4") => MediaFormat::Mp4,
        Some("flac") => MediaFormat::Flac,
        Some("ogg") => MediaFormat::Ogg,
        Some("webm") => MediaFormat::Webm,
        Some("amr") => MediaFormat::Amr,
        _ => MediaFormat::Wav,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_uris_pass_through() {
        let uri = media_uri("s3://bucket/key.wav").unwrap();
        assert_eq!(uri, "s3://bucket/key.wav");
    }

    #[test]
    fn missing_local_file_is_rejected() {
        assert!(matches!(
            media_uri("/no/such/audio.wav"),
            Err(BatchError::FileNotFound(_))
        ));
    }

    #[test]
    fn media_format_from_extension() {
        assert_eq!(guess_media_format("a.mp3"), MediaFormat::Mp3);
        assert_eq!(guess_media_format("a.flac"), MediaFormat::Flac);
        assert_eq!(guess_media_format("a.WAV"), MediaFormat::Wav);
        // Unknown extensions fall back to WAV, as the original demo assumed
        assert_eq!(guess_media_format("a.xyz"), MediaFormat::Wav);
    }

    #[test]
    fn job_names_carry_the_demo_prefix() {
        assert!(job_name().starts_with("hark-"));
    }

    #[test]
    fn transcript_document_parses() {
        let body = r#"{
            "jobName": "hark-1700000000",
            "accountId": "123456789012",
            "results": {
                "transcripts": [{"transcript": "hello world"}],
                "items": []
            },
            "status": "COMPLETED"
        }"#;
        assert_eq!(parse_transcript_document(body).unwrap(), "hello world");
    }

    #[test]
    fn malformed_transcript_document_is_an_error() {
        assert!(matches!(
            parse_transcript_document("{}"),
            Err(BatchError::Parse(_))
        ));
    }
}
