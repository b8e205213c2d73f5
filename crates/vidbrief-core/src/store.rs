use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::Result;
use crate::types::{EncodedFrame, VideoId};

/// Source video extensions the acquisition step may have produced.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "mov", "avi"];

const AUDIO_FILE: &str = "audio.mp3";
const TRANSCRIPT_FILE: &str = "transcript.txt";
const FRAMES_DIR: &str = "frames";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Audio,
    Frames,
    Transcript,
}

/// Immutable output of one cacheable stage. A given video id + kind maps to
/// at most one artifact version; writes are full-replace.
#[derive(Debug, Clone)]
pub enum StageArtifact {
    Audio(Vec<u8>),
    Frames(Vec<EncodedFrame>),
    Transcript(String),
}

/// Keyed storage for stage artifacts, injectable for test isolation.
///
/// The frame-set kind is a collection of individually addressable items;
/// `exists` for it is true iff at least one completed frame item is present.
/// That completeness check is deliberately weak: a partially sampled set from
/// an interrupted run counts as cached and is never re-sampled.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn exists(&self, id: &VideoId, kind: StageKind) -> bool;
    async fn read(&self, id: &VideoId, kind: StageKind) -> Result<StageArtifact>;
    async fn write(&self, id: &VideoId, artifact: &StageArtifact) -> Result<()>;
    /// Persist a single frame item keyed by ordinal, without touching the
    /// rest of the set. Used by the sampler as frames complete.
    async fn write_frame(&self, id: &VideoId, frame: &EncodedFrame) -> Result<()>;
    /// Locate the source video for this id, if the acquisition step stored one.
    fn find_video(&self, id: &VideoId) -> Option<PathBuf>;
    /// Where this id's artifact of the given kind lives (whether or not it
    /// exists yet). Used by status reporting.
    fn artifact_path(&self, id: &VideoId, kind: StageKind) -> PathBuf;
}

/// Filesystem-backed store: one directory per video id under a root.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default root under the platform cache directory.
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("vidbrief")
    }

    pub fn video_dir(&self, id: &VideoId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Copy a local file into the store as this id's source video.
    pub async fn import_video(&self, id: &VideoId, source: &Path) -> Result<PathBuf> {
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "mp4".to_string());
        let dir = self.video_dir(id);
        fs::create_dir_all(&dir).await?;
        let dest = dir.join(format!("video.{ext}"));
        fs::copy(source, &dest).await?;
        Ok(dest)
    }

    fn frame_file(&self, id: &VideoId, ordinal: u32) -> PathBuf {
        self.artifact_path(id, StageKind::Frames)
            .join(format!("frame_{ordinal:03}.txt"))
    }

    fn list_frame_files(&self, id: &VideoId) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.artifact_path(id, StageKind::Frames)) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.extension().is_some_and(|ext| ext == "txt")
                    && p.file_stem()
                        .is_some_and(|s| s.to_string_lossy().starts_with("frame_"))
            })
            .collect();
        // Zero-padded names make lexical order equal ordinal order.
        files.sort();
        files
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn exists(&self, id: &VideoId, kind: StageKind) -> bool {
        match kind {
            StageKind::Audio | StageKind::Transcript => self.artifact_path(id, kind).exists(),
            StageKind::Frames => !self.list_frame_files(id).is_empty(),
        }
    }

    async fn read(&self, id: &VideoId, kind: StageKind) -> Result<StageArtifact> {
        match kind {
            StageKind::Audio => {
                let bytes = fs::read(self.artifact_path(id, kind)).await?;
                Ok(StageArtifact::Audio(bytes))
            }
            StageKind::Transcript => {
                let text = fs::read_to_string(self.artifact_path(id, kind)).await?;
                Ok(StageArtifact::Transcript(text))
            }
            StageKind::Frames => {
                let mut frames = Vec::new();
                for path in self.list_frame_files(id) {
                    let Some(stem) = path.file_stem() else {
                        continue;
                    };
                    let Some(ordinal) = stem
                        .to_string_lossy()
                        .strip_prefix("frame_")
                        .and_then(|n| n.parse::<u32>().ok())
                    else {
                        continue;
                    };
                    let data = fs::read_to_string(&path).await?;
                    frames.push(EncodedFrame { ordinal, data });
                }
                Ok(StageArtifact::Frames(frames))
            }
        }
    }

    async fn write(&self, id: &VideoId, artifact: &StageArtifact) -> Result<()> {
        fs::create_dir_all(self.video_dir(id)).await?;
        match artifact {
            StageArtifact::Audio(bytes) => {
                fs::write(self.artifact_path(id, StageKind::Audio), bytes).await?;
            }
            StageArtifact::Transcript(text) => {
                fs::write(self.artifact_path(id, StageKind::Transcript), text).await?;
            }
            StageArtifact::Frames(frames) => {
                // Full replace: drop any previous set before writing.
                let dir = self.artifact_path(id, StageKind::Frames);
                if dir.exists() {
                    fs::remove_dir_all(&dir).await?;
                }
                fs::create_dir_all(&dir).await?;
                for frame in frames {
                    fs::write(self.frame_file(id, frame.ordinal), &frame.data).await?;
                }
            }
        }
        Ok(())
    }

    async fn write_frame(&self, id: &VideoId, frame: &EncodedFrame) -> Result<()> {
        let dir = self.artifact_path(id, StageKind::Frames);
        fs::create_dir_all(&dir).await?;
        fs::write(self.frame_file(id, frame.ordinal), &frame.data).await?;
        Ok(())
    }

    fn find_video(&self, id: &VideoId) -> Option<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.video_dir(id)) else {
            return None;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
                    return Some(path);
                }
            }
        }
        None
    }

    fn artifact_path(&self, id: &VideoId, kind: StageKind) -> PathBuf {
        let dir = self.video_dir(id);
        match kind {
            StageKind::Audio => dir.join(AUDIO_FILE),
            StageKind::Transcript => dir.join(TRANSCRIPT_FILE),
            StageKind::Frames => dir.join(FRAMES_DIR),
        }
    }
}
