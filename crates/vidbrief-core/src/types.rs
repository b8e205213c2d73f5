use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VidbriefError};

/// Opaque key identifying one video's artifacts.
///
/// Extracted once from a source URL and stable for the lifetime of the
/// system; every cache lookup is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() || token.len() > 64 {
            return Err(VidbriefError::InvalidInput {
                reason: format!("identifier must be 1-64 characters, got {}", token.len()),
            });
        }
        if !token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(VidbriefError::InvalidInput {
                reason: format!("identifier contains invalid characters: {token}"),
            });
        }
        Ok(Self(token))
    }

    /// Extract the identifier from a source URL (`v=` query parameter or a
    /// `youtu.be/<id>` short link).
    pub fn from_url(url: &str) -> Result<Self> {
        if let Some(query) = url.split_once('?').map(|(_, q)| q) {
            for pair in query.split('&') {
                if let Some(value) = pair.strip_prefix("v=") {
                    return Self::new(value);
                }
            }
        }
        if let Some(rest) = url
            .strip_prefix("https://youtu.be/")
            .or_else(|| url.strip_prefix("http://youtu.be/"))
        {
            let token = rest.split(['?', '&', '/']).next().unwrap_or_default();
            return Self::new(token);
        }
        Err(VidbriefError::InvalidInput {
            reason: format!("could not extract a video identifier from {url}"),
        })
    }

    /// Accept either a bare identifier or a full source URL.
    pub fn parse(input: &str) -> Result<Self> {
        if input.contains("://") {
            Self::from_url(input)
        } else {
            Self::new(input)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One sampled still frame, base64-encoded, tagged with its position in the
/// sampling schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedFrame {
    pub ordinal: u32,
    pub data: String,
}

/// Which of the three cacheable stages were served from cache.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheFlags {
    pub audio: bool,
    pub frames: bool,
    pub transcript: bool,
}

/// Final output of one pipeline run. Never persisted.
#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineResult {
    pub final_summary: String,
    pub visual_summary: String,
    pub audio_summary: String,
    pub frame_count: usize,
    pub cache: CacheFlags,
}

/// Artifact presence report for one video, without triggering any work.
/// Paths are `Some` iff the artifact is cached.
#[derive(Debug, Serialize, Deserialize)]
pub struct StageStatus {
    pub video_exists: bool,
    pub video_path: Option<PathBuf>,
    pub audio_path: Option<PathBuf>,
    pub frames_path: Option<PathBuf>,
    pub transcript_path: Option<PathBuf>,
}
