use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidbriefError {
    #[error("Invalid video identifier: {reason}")]
    InvalidInput { reason: String },

    #[error("No source video found for {video_id}")]
    VideoNotFound { video_id: String },

    #[error("No API credential configured")]
    Unconfigured,

    #[error("Audio/frame extraction failed for {video_id}: {reason}")]
    ExtractionFailed { video_id: String, reason: String },

    #[error("Transcription failed: {reason}")]
    TranscriptionFailed { reason: String },

    #[error("Summarization failed: {reason}")]
    SummarizationFailed { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VidbriefError>;
