//! Real-time processing pipeline module

mod realtime;

pub use realtime::{PipelineConfig, PipelineError, PipelineStatus, RealtimePipeline};
