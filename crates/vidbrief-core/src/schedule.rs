/// Hard ceiling on frames per video.
pub const MAX_FRAMES: usize = 20;

/// Target spacing between frames, in seconds, before the ceiling applies.
const TARGET_SPACING_SECONDS: f64 = 10.0;

/// Deterministic set of timestamps at which frames are captured.
///
/// Derived from the video duration every time frames are sampled, never
/// persisted: `min(MAX_FRAMES, ceil(D / 10))` evenly spaced timestamps,
/// offset by half the interval so the first capture lands past any leading
/// black frame, each clamped to `D - 1`.
#[derive(Debug, Clone)]
pub struct SamplingSchedule {
    timestamps: Vec<f64>,
}

impl SamplingSchedule {
    pub fn for_duration(duration_seconds: f64) -> Self {
        let count = ((duration_seconds / TARGET_SPACING_SECONDS).ceil() as usize).min(MAX_FRAMES);
        let mut timestamps = Vec::with_capacity(count);
        if count > 0 {
            let interval = duration_seconds / count as f64;
            for i in 0..count {
                let ts = i as f64 * interval + interval / 2.0;
                timestamps.push(ts.min(duration_seconds - 1.0).max(0.0));
            }
        }
        Self { timestamps }
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn frame_count(&self) -> usize {
        self.timestamps.len()
    }
}
