//! STT (Speech-to-Text) module
//!
//! Engine seam plus the AWS Transcribe backends (streaming and batch).

mod batch;
mod engine;
mod streaming;

pub use batch::{BatchError, BatchOutcome, BatchTranscriber};
pub use engine::{Language, SttEngine, SttError, SttEvent, TranscriptSegment};
pub use streaming::{StreamingEngine, StreamingSettings};

#[cfg(test)]
pub use engine::MockSttEngine;
