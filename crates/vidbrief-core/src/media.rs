use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{Result, VidbriefError};

/// Target profile for extracted audio: compressed mono at a fixed bitrate so
/// the artifact stays under the transcription service's payload ceiling
/// regardless of source length. Not adapted to duration.
const AUDIO_BITRATE: &str = "32k";
const AUDIO_CHANNELS: &str = "1";

/// Duration probing, decoupled from process-spawning mechanics so tests can
/// inject a deterministic fake.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn duration_seconds(&self, video: &Path) -> Result<f64>;
}

/// Demux/transcode operations backed by an external media tool.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Extract the audio track as compressed mono into `output`.
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<()>;
    /// Extract exactly one still frame at `timestamp` seconds into `output`.
    async fn extract_frame(&self, video: &Path, timestamp: f64, output: &Path) -> Result<()>;
}

/// Subprocess-backed implementation shelling out to ffmpeg/ffprobe.
pub struct FfmpegMedia;

impl FfmpegMedia {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegMedia {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaProbe for FfmpegMedia {
    async fn duration_seconds(&self, video: &Path) -> Result<f64> {
        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg(video)
            .output()
            .await?;

        if !output.status.success() {
            return Err(VidbriefError::ExtractionFailed {
                video_id: video.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
        probe
            .format
            .duration
            .parse::<f64>()
            .map_err(|_| VidbriefError::ExtractionFailed {
                video_id: video.display().to_string(),
                reason: format!("ffprobe reported no parseable duration: {:?}", probe.format.duration),
            })
    }
}

#[async_trait]
impl MediaExtractor for FfmpegMedia {
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<()> {
        let result = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-vn")
            .arg("-acodec")
            .arg("libmp3lame")
            .arg("-b:a")
            .arg(AUDIO_BITRATE)
            .arg("-ac")
            .arg(AUDIO_CHANNELS)
            .arg(output)
            .output()
            .await?;

        if !result.status.success() {
            return Err(VidbriefError::ExtractionFailed {
                video_id: video.display().to_string(),
                reason: String::from_utf8_lossy(&result.stderr).to_string(),
            });
        }
        if !output.exists() {
            return Err(VidbriefError::ExtractionFailed {
                video_id: video.display().to_string(),
                reason: "ffmpeg exited cleanly but produced no audio file".to_string(),
            });
        }

        Ok(())
    }

    async fn extract_frame(&self, video: &Path, timestamp: f64, output: &Path) -> Result<()> {
        let result = Command::new("ffmpeg")
            .arg("-y")
            .arg("-ss")
            .arg(format!("{timestamp:.3}"))
            .arg("-i")
            .arg(video)
            .arg("-frames:v")
            .arg("1")
            .arg("-q:v")
            .arg("2")
            .arg(output)
            .output()
            .await?;

        if !result.status.success() {
            return Err(VidbriefError::ExtractionFailed {
                video_id: video.display().to_string(),
                reason: String::from_utf8_lossy(&result.stderr).to_string(),
            });
        }
        if !output.exists() {
            return Err(VidbriefError::ExtractionFailed {
                video_id: video.display().to_string(),
                reason: format!("no frame produced at {timestamp:.3}s"),
            });
        }

        Ok(())
    }
}

/// ffprobe `-print_format json -show_format` output.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    duration: String,
}
