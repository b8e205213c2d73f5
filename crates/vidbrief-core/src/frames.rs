use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use crate::error::Result;
use crate::media::{MediaExtractor, MediaProbe};
use crate::schedule::SamplingSchedule;
use crate::store::ArtifactStore;
use crate::types::{EncodedFrame, VideoId};

/// Samples evenly spaced still frames from a video and persists each as a
/// base64-encoded item keyed by zero-padded ordinal.
pub struct FrameSampler<'a> {
    probe: &'a dyn MediaProbe,
    extractor: &'a dyn MediaExtractor,
}

impl<'a> FrameSampler<'a> {
    pub fn new(probe: &'a dyn MediaProbe, extractor: &'a dyn MediaExtractor) -> Self {
        Self { probe, extractor }
    }

    /// Probe the duration, compute the schedule, and extract one frame per
    /// timestamp in order. A frame whose extraction fails is skipped without
    /// aborting the pass, so the returned sequence may be shorter than the
    /// schedule. Ordinal order equals chronological order by construction.
    pub async fn sample(
        &self,
        id: &VideoId,
        video: &Path,
        store: &dyn ArtifactStore,
    ) -> Result<Vec<EncodedFrame>> {
        let duration = self.probe.duration_seconds(video).await?;
        let schedule = SamplingSchedule::for_duration(duration);
        debug!(
            video_id = %id,
            duration,
            scheduled = schedule.frame_count(),
            "sampling frames"
        );

        let scratch = tempfile::tempdir()?;
        let mut frames = Vec::with_capacity(schedule.frame_count());

        for (i, timestamp) in schedule.timestamps().iter().enumerate() {
            let ordinal = i as u32;
            let raw_path = scratch.path().join(format!("frame_{ordinal:03}.jpg"));

            if let Err(e) = self
                .extractor
                .extract_frame(video, *timestamp, &raw_path)
                .await
            {
                warn!(video_id = %id, ordinal, timestamp, error = %e, "skipping failed frame");
                continue;
            }
            let raw = match tokio::fs::read(&raw_path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(video_id = %id, ordinal, timestamp, error = %e, "skipping unreadable frame");
                    continue;
                }
            };

            let frame = EncodedFrame {
                ordinal,
                data: STANDARD.encode(&raw),
            };
            store.write_frame(id, &frame).await?;
            frames.push(frame);
            // Raw payload is discarded with the scratch dir; only the
            // encoded form is kept.
        }

        Ok(frames)
    }
}
