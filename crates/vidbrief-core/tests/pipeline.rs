//! Pipeline behavior tests over deterministic fakes: cache-skip semantics,
//! precondition ordering, partial-failure resume, and frame ceilings.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vidbrief_core::{
    CredentialProvider, FsArtifactStore, Intelligence, MediaExtractor, MediaProbe, Pipeline,
    Result, VideoId, VidbriefError,
};

#[derive(Default)]
struct FakeMedia {
    duration: f64,
    fail_audio: AtomicBool,
    /// Frame-extraction call indices that run but produce no file.
    silent_frame_misses: Vec<usize>,
    probe_calls: AtomicUsize,
    audio_calls: AtomicUsize,
    frame_calls: AtomicUsize,
}

impl FakeMedia {
    fn with_duration(duration: f64) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }
}

#[async_trait]
impl MediaProbe for FakeMedia {
    async fn duration_seconds(&self, _video: &Path) -> Result<f64> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.duration)
    }
}

#[async_trait]
impl MediaExtractor for FakeMedia {
    async fn extract_audio(&self, _video: &Path, output: &Path) -> Result<()> {
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_audio.load(Ordering::SeqCst) {
            return Err(VidbriefError::ExtractionFailed {
                video_id: "fake".into(),
                reason: "codec tool exited non-zero".into(),
            });
        }
        std::fs::write(output, b"fake-mp3-bytes")?;
        Ok(())
    }

    async fn extract_frame(&self, _video: &Path, _timestamp: f64, output: &Path) -> Result<()> {
        let call = self.frame_calls.fetch_add(1, Ordering::SeqCst);
        if self.silent_frame_misses.contains(&call) {
            // Tool "ran" but produced no file.
            return Ok(());
        }
        std::fs::write(output, format!("jpeg-{call}"))?;
        Ok(())
    }
}

#[derive(Default)]
struct FakeIntelligence {
    fail_transcribe: AtomicBool,
    transcribe_calls: AtomicUsize,
    summarize_calls: AtomicUsize,
    consolidate_calls: AtomicUsize,
    vision_frame_counts: Mutex<Vec<usize>>,
}

#[async_trait]
impl Intelligence for FakeIntelligence {
    async fn transcribe(&self, _api_key: &str, _audio: &[u8]) -> Result<String> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_transcribe.load(Ordering::SeqCst) {
            return Err(VidbriefError::TranscriptionFailed {
                reason: "service unavailable".into(),
            });
        }
        Ok("spoken words".to_string())
    }

    async fn describe_frames(
        &self,
        _api_key: &str,
        frames: &[vidbrief_core::EncodedFrame],
    ) -> Result<String> {
        self.vision_frame_counts.lock().unwrap().push(frames.len());
        Ok("visual summary".to_string())
    }

    async fn summarize_transcript(&self, _api_key: &str, _transcript: &str) -> Result<String> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        Ok("audio summary".to_string())
    }

    async fn consolidate(&self, _api_key: &str, _visual: &str, _audio: &str) -> Result<String> {
        self.consolidate_calls.fetch_add(1, Ordering::SeqCst);
        Ok("final summary".to_string())
    }
}

struct FakeCredentials {
    key: Option<String>,
}

#[async_trait]
impl CredentialProvider for FakeCredentials {
    async fn get(&self) -> Result<Option<String>> {
        Ok(self.key.clone())
    }
    async fn set(&self, _api_key: &str) -> Result<()> {
        Ok(())
    }
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

struct Harness {
    _root: tempfile::TempDir,
    media: Arc<FakeMedia>,
    intelligence: Arc<FakeIntelligence>,
    pipeline: Pipeline,
    id: VideoId,
}

fn harness(media: FakeMedia, with_video: bool, with_key: bool) -> Harness {
    let root = tempfile::tempdir().unwrap();
    let id = VideoId::new("testvid01").unwrap();
    if with_video {
        let dir = root.path().join(id.as_str());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("video.mp4"), b"fake video").unwrap();
    }

    let media = Arc::new(media);
    let intelligence = Arc::new(FakeIntelligence::default());
    let store = Arc::new(FsArtifactStore::new(root.path()));
    let credentials = Arc::new(FakeCredentials {
        key: with_key.then(|| "sk-test".to_string()),
    });

    let pipeline = Pipeline::new(
        store,
        credentials,
        media.clone(),
        media.clone(),
        intelligence.clone(),
    );

    Harness {
        _root: root,
        media,
        intelligence,
        pipeline,
        id,
    }
}

#[tokio::test]
async fn second_run_is_served_entirely_from_cache() {
    let h = harness(FakeMedia::with_duration(95.0), true, true);

    let first = h.pipeline.run(&h.id).await.unwrap();
    assert!(!first.cache.audio);
    assert!(!first.cache.frames);
    assert!(!first.cache.transcript);
    assert_eq!(first.frame_count, 10);
    assert_eq!(first.final_summary, "final summary");

    let second = h.pipeline.run(&h.id).await.unwrap();
    assert!(second.cache.audio);
    assert!(second.cache.frames);
    assert!(second.cache.transcript);
    assert_eq!(second.frame_count, 10);

    // Stage work ran exactly once; only the summaries are recomputed.
    assert_eq!(h.media.audio_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.media.probe_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.media.frame_calls.load(Ordering::SeqCst), 10);
    assert_eq!(h.intelligence.transcribe_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.intelligence.consolidate_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn vision_call_never_receives_more_than_ten_frames() {
    // 1000s → schedule hits the 20-frame ceiling.
    let h = harness(FakeMedia::with_duration(1000.0), true, true);

    let result = h.pipeline.run(&h.id).await.unwrap();
    assert_eq!(result.frame_count, 20);

    let counts = h.intelligence.vision_frame_counts.lock().unwrap();
    assert_eq!(counts.as_slice(), &[10]);
}

#[tokio::test]
async fn missing_video_fails_without_invoking_anything() {
    let h = harness(FakeMedia::with_duration(95.0), false, true);

    let err = h.pipeline.run(&h.id).await.unwrap_err();
    assert!(matches!(err, VidbriefError::VideoNotFound { .. }), "{err}");

    assert_eq!(h.media.audio_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.media.probe_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.intelligence.transcribe_calls.load(Ordering::SeqCst), 0);

    let status = h.pipeline.status(&h.id).await.unwrap();
    assert!(!status.video_exists);
    assert!(status.video_path.is_none());
}

#[tokio::test]
async fn missing_credential_fails_before_any_stage_work() {
    let h = harness(FakeMedia::with_duration(95.0), true, false);

    let err = h.pipeline.run(&h.id).await.unwrap_err();
    assert!(matches!(err, VidbriefError::Unconfigured), "{err}");

    assert_eq!(h.media.audio_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.media.probe_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.media.frame_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn audio_extraction_failure_stops_before_later_stages() {
    let media = FakeMedia::with_duration(95.0);
    media.fail_audio.store(true, Ordering::SeqCst);
    let h = harness(media, true, true);

    let err = h.pipeline.run(&h.id).await.unwrap_err();
    assert!(matches!(err, VidbriefError::ExtractionFailed { .. }), "{err}");

    // Neither transcription nor sampling was attempted for that run.
    assert_eq!(h.intelligence.transcribe_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.media.probe_calls.load(Ordering::SeqCst), 0);

    // Nothing got cached, so a fixed retry recomputes audio.
    h.media.fail_audio.store(false, Ordering::SeqCst);
    let result = h.pipeline.run(&h.id).await.unwrap();
    assert!(!result.cache.audio);
}

#[tokio::test]
async fn transcription_failure_resumes_past_cached_audio_on_retry() {
    let h = harness(FakeMedia::with_duration(95.0), true, true);
    h.intelligence.fail_transcribe.store(true, Ordering::SeqCst);

    let err = h.pipeline.run(&h.id).await.unwrap_err();
    assert!(matches!(err, VidbriefError::TranscriptionFailed { .. }), "{err}");
    // Frames come after the transcript stage, so they were not attempted.
    assert_eq!(h.media.probe_calls.load(Ordering::SeqCst), 0);

    // The audio artifact written before the failure is the resume point.
    h.intelligence.fail_transcribe.store(false, Ordering::SeqCst);
    let result = h.pipeline.run(&h.id).await.unwrap();
    assert!(result.cache.audio);
    assert!(!result.cache.transcript);
    assert_eq!(h.media.audio_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.intelligence.transcribe_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn under_produced_frame_set_is_not_an_error() {
    // 95s → 10 scheduled slots, three of which silently miss.
    let mut media = FakeMedia::with_duration(95.0);
    media.silent_frame_misses = vec![1, 4, 8];
    let h = harness(media, true, true);

    let result = h.pipeline.run(&h.id).await.unwrap();
    assert_eq!(result.frame_count, 7);
    assert_eq!(h.media.frame_calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn status_reflects_cached_artifacts_after_a_run() {
    let h = harness(FakeMedia::with_duration(95.0), true, true);

    let before = h.pipeline.status(&h.id).await.unwrap();
    assert!(before.video_exists);
    assert!(before.audio_path.is_none());
    assert!(before.frames_path.is_none());
    assert!(before.transcript_path.is_none());

    h.pipeline.run(&h.id).await.unwrap();

    let after = h.pipeline.status(&h.id).await.unwrap();
    assert!(after.audio_path.is_some_and(|p| p.ends_with("audio.mp3")));
    assert!(after.frames_path.is_some_and(|p| p.ends_with("frames")));
    assert!(
        after
            .transcript_path
            .is_some_and(|p| p.ends_with("transcript.txt"))
    );
}
