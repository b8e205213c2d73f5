use std::sync::Arc;

use tracing::info;

use crate::credentials::CredentialProvider;
use crate::error::{Result, VidbriefError};
use crate::frames::FrameSampler;
use crate::intelligence::Intelligence;
use crate::media::{MediaExtractor, MediaProbe};
use crate::store::{ArtifactStore, StageArtifact, StageKind};
use crate::types::{CacheFlags, EncodedFrame, PipelineResult, StageStatus, VideoId};

/// Ceiling on frames sent to the vision call, regardless of how many were
/// sampled. A fixed cost cap: the set is truncated, not thinned evenly.
pub const MAX_VISION_FRAMES: usize = 10;

/// Staged, cacheable summarization pipeline.
///
/// Each run is a linear sequence with cache-skip branches: verify the source
/// video, verify the credential, then for each of audio, transcript, and
/// frames either read the cached artifact or compute and store it, summarize
/// the visual and spoken content independently, and consolidate both into one
/// report. No stage is retried; a failed request re-enters at the first
/// incomplete stage when reissued, because completed artifacts stay cached.
///
/// Concurrent runs for the same video are not coordinated: both may recompute
/// the same artifacts, last writer wins. Accepted for single-operator use.
pub struct Pipeline {
    store: Arc<dyn ArtifactStore>,
    credentials: Arc<dyn CredentialProvider>,
    probe: Arc<dyn MediaProbe>,
    extractor: Arc<dyn MediaExtractor>,
    intelligence: Arc<dyn Intelligence>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        credentials: Arc<dyn CredentialProvider>,
        probe: Arc<dyn MediaProbe>,
        extractor: Arc<dyn MediaExtractor>,
        intelligence: Arc<dyn Intelligence>,
    ) -> Self {
        Self {
            store,
            credentials,
            probe,
            extractor,
            intelligence,
        }
    }

    /// Run the full pipeline for one video. Preconditions first: a missing
    /// source video or credential fails before any stage work starts.
    pub async fn run(&self, id: &VideoId) -> Result<PipelineResult> {
        let video = self
            .store
            .find_video(id)
            .ok_or_else(|| VidbriefError::VideoNotFound {
                video_id: id.to_string(),
            })?;

        let api_key = self
            .credentials
            .get()
            .await?
            .ok_or(VidbriefError::Unconfigured)?;

        let mut cache = CacheFlags::default();

        // Stage 1: audio. Must precede the transcript stage, which consumes
        // its artifact.
        cache.audio = self.store.exists(id, StageKind::Audio).await;
        let mut audio_bytes: Option<Vec<u8>> = None;
        if !cache.audio {
            info!(video_id = %id, "extracting audio");
            let scratch = tempfile::tempdir()?;
            let out = scratch.path().join("audio.mp3");
            self.extractor.extract_audio(&video, &out).await?;
            let bytes = tokio::fs::read(&out).await?;
            self.store
                .write(id, &StageArtifact::Audio(bytes.clone()))
                .await?;
            audio_bytes = Some(bytes);
        }

        // Stage 2: transcript.
        cache.transcript = self.store.exists(id, StageKind::Transcript).await;
        let transcript = if cache.transcript {
            match self.store.read(id, StageKind::Transcript).await? {
                StageArtifact::Transcript(text) => text,
                _ => unreachable!("transcript kind reads back as transcript"),
            }
        } else {
            let audio = match audio_bytes {
                Some(bytes) => bytes,
                None => match self.store.read(id, StageKind::Audio).await? {
                    StageArtifact::Audio(bytes) => bytes,
                    _ => unreachable!("audio kind reads back as audio"),
                },
            };
            info!(video_id = %id, "transcribing audio");
            let text = self.intelligence.transcribe(&api_key, &audio).await?;
            self.store
                .write(id, &StageArtifact::Transcript(text.clone()))
                .await?;
            text
        };

        // Stage 3: frames. Never hard-fails on individual misses; the set
        // may be shorter than the schedule.
        cache.frames = self.store.exists(id, StageKind::Frames).await;
        let frames: Vec<EncodedFrame> = if cache.frames {
            match self.store.read(id, StageKind::Frames).await? {
                StageArtifact::Frames(frames) => frames,
                _ => unreachable!("frames kind reads back as frames"),
            }
        } else {
            info!(video_id = %id, "sampling frames");
            FrameSampler::new(self.probe.as_ref(), self.extractor.as_ref())
                .sample(id, &video, self.store.as_ref())
                .await?
        };

        // The two summaries are independent; run them concurrently.
        let vision_frames = &frames[..frames.len().min(MAX_VISION_FRAMES)];
        info!(video_id = %id, frames = vision_frames.len(), "summarizing");
        let (visual_summary, audio_summary) = tokio::try_join!(
            self.intelligence.describe_frames(&api_key, vision_frames),
            self.intelligence.summarize_transcript(&api_key, &transcript),
        )?;

        info!(video_id = %id, "consolidating");
        let final_summary = self
            .intelligence
            .consolidate(&api_key, &visual_summary, &audio_summary)
            .await?;

        Ok(PipelineResult {
            final_summary,
            visual_summary,
            audio_summary,
            frame_count: frames.len(),
            cache,
        })
    }

    /// Report source-video presence and cached artifacts without triggering
    /// any work.
    pub async fn status(&self, id: &VideoId) -> Result<StageStatus> {
        let video_path = self.store.find_video(id);
        let cached_path = |kind: StageKind, cached: bool| {
            cached.then(|| self.store.artifact_path(id, kind))
        };

        let audio = self.store.exists(id, StageKind::Audio).await;
        let frames = self.store.exists(id, StageKind::Frames).await;
        let transcript = self.store.exists(id, StageKind::Transcript).await;

        Ok(StageStatus {
            video_exists: video_path.is_some(),
            video_path,
            audio_path: cached_path(StageKind::Audio, audio),
            frames_path: cached_path(StageKind::Frames, frames),
            transcript_path: cached_path(StageKind::Transcript, transcript),
        })
    }
}
