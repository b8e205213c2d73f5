//! Vidbrief Core Library
//!
//! Staged video-summarization pipeline: extract and transcribe the audio
//! track, sample and analyze still frames, and consolidate both analyses
//! into one report. Every intermediate artifact is cached per video id so a
//! repeated request skips completed stages.

pub mod credentials;
pub mod error;
pub mod frames;
pub mod intelligence;
pub mod media;
pub mod pipeline;
pub mod prompts;
pub mod schedule;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root
pub use credentials::{CredentialProvider, FsCredentialStore};
pub use error::{Result, VidbriefError};
pub use frames::FrameSampler;
pub use intelligence::{Intelligence, OpenAiIntelligence};
pub use media::{FfmpegMedia, MediaExtractor, MediaProbe};
pub use pipeline::{MAX_VISION_FRAMES, Pipeline};
pub use schedule::{MAX_FRAMES, SamplingSchedule};
pub use store::{ArtifactStore, FsArtifactStore, StageArtifact, StageKind};
pub use types::{CacheFlags, EncodedFrame, PipelineResult, StageStatus, VideoId};
