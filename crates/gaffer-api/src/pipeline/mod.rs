//! Analysis pipeline orchestrator.
//!
//! Answers "what is happening in this video at time T" under hard per-stage
//! time budgets. The commentary comes from the first source in the ordered
//! chain that yields text — frame capture + vision description, then
//! captions, then the stub pool — and is composed with an analogy that
//! itself degrades to a deterministic transform. Results are cached with a
//! ±2s read tolerance so scrubbing viewers do not redo the cascade.

pub mod sources;
pub mod stage;

use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;
use tracing::{info, warn};

use gaffer_ai::stub_analogy;
use gaffer_cache::{lookup_keys, write_key, CacheKey, TtlCache};
use gaffer_models::{clamp_timestamp, AnalyzeResponse, VideoRef};

pub use sources::{AnalogyTransformer, CaptionSource, FrameSource, VisionDescriber};
pub use stage::{CommentarySource, Stage, StageBudgets};

use stage::{run_stage, StageOutcome};

/// How long a computed analysis stays servable.
pub const ANALYSIS_TTL: Duration = Duration::from_secs(600);

/// Last-resort commentary pool. Non-empty by construction; generic enough
/// to be plausible at any point of any match.
pub const STUB_COMMENTARY: &[&str] = &[
    "Players are moving into position, creating space for a potential attack.",
    "The team is building up play from the back, looking for passing options.",
    "A counter-attack is developing with players sprinting forward.",
    "Defensive shape is compact, denying space in the central areas.",
    "The ball is in the final third, with attackers looking for an opening.",
];

/// The cache-aware fallback pipeline.
///
/// Shared process-wide; concurrent requests run as independent tasks over
/// the same cache. Two simultaneous misses for the same second both run the
/// full cascade and race on the write, which is harmless because either
/// result is a valid answer.
pub struct AnalysisPipeline {
    frames: Arc<dyn FrameSource>,
    captions: Arc<dyn CaptionSource>,
    vision: Arc<dyn VisionDescriber>,
    analogy: Arc<dyn AnalogyTransformer>,
    cache: TtlCache<CacheKey, AnalyzeResponse>,
    budgets: StageBudgets,
}

impl AnalysisPipeline {
    pub fn new(
        frames: Arc<dyn FrameSource>,
        captions: Arc<dyn CaptionSource>,
        vision: Arc<dyn VisionDescriber>,
        analogy: Arc<dyn AnalogyTransformer>,
        budgets: StageBudgets,
    ) -> Self {
        Self {
            frames,
            captions,
            vision,
            analogy,
            cache: TtlCache::new(),
            budgets,
        }
    }

    /// Whether the vision path is configured.
    pub fn vision_enabled(&self) -> bool {
        self.vision.enabled()
    }

    /// Analyze a video at a timestamp.
    ///
    /// Infallible by design: every stage failure degrades to a fallback, so
    /// a valid request always yields a fully-populated response.
    pub async fn analyze(&self, video: &VideoRef, timestamp: f64) -> AnalyzeResponse {
        let timestamp = clamp_timestamp(timestamp);

        // Cache lookup over the exact second and its ±2s neighbors. A hit
        // echoes the requesting timestamp, not the cached one.
        for key in lookup_keys(video.raw(), timestamp) {
            if let Some(mut hit) = self.cache.get(&key).await {
                info!(key = %key, timestamp, "Cache hit");
                hit.timestamp = timestamp;
                hit.cached = true;
                return hit;
            }
        }

        info!(video = %video, timestamp, "Cache miss, running pipeline");

        let (commentary, source) = self.resolve_commentary(video, timestamp).await;
        let analogy = self.resolve_analogy(&commentary).await;

        info!(
            video = %video,
            timestamp,
            commentary_source = %source,
            "Analysis complete"
        );

        let response = AnalyzeResponse {
            original_commentary: commentary,
            nfl_analogy: analogy,
            timestamp,
            cached: false,
        };

        // Write back under the exact key only, stub-built results included:
        // repeat requests in the tolerance window must not redo the cascade.
        self.cache
            .set(write_key(video.raw(), timestamp), response.clone(), ANALYSIS_TTL)
            .await;

        response
    }

    /// Run the ordered commentary chain until a source yields text.
    async fn resolve_commentary(
        &self,
        video: &VideoRef,
        timestamp: f64,
    ) -> (String, CommentarySource) {
        for source in [CommentarySource::Vision, CommentarySource::Captions] {
            let outcome = match source {
                CommentarySource::Vision => self.vision_commentary(video, timestamp).await,
                CommentarySource::Captions => {
                    run_stage(
                        Stage::CaptionLookup,
                        self.budgets.captions,
                        self.captions.caption_at(video, timestamp),
                    )
                    .await
                }
                CommentarySource::Stub => unreachable!(),
            };
            if let StageOutcome::Produced(text) = outcome {
                return (text, source);
            }
        }

        // The pool is non-empty, so this stage cannot fail.
        let pick = STUB_COMMENTARY
            .choose(&mut rand::rng())
            .expect("stub pool is non-empty");
        info!(stage = %Stage::StubSelection, "Using stub commentary");
        (pick.to_string(), CommentarySource::Stub)
    }

    /// Frame capture followed by vision description.
    ///
    /// Vision is only attempted when a frame exists and the describer is
    /// enabled; a skip is a failure for transition purposes, with the
    /// reason logged.
    async fn vision_commentary(&self, video: &VideoRef, timestamp: f64) -> StageOutcome {
        let frame = match run_stage(
            Stage::FrameCapture,
            self.budgets.frame_capture,
            self.frames.capture(video, timestamp),
        )
        .await
        {
            StageOutcome::Produced(frame) => frame,
            other => return other,
        };

        if !self.vision.enabled() {
            info!(stage = %Stage::VisionDescription, "Stage skipped: vision path disabled");
            return StageOutcome::Empty;
        }

        run_stage(
            Stage::VisionDescription,
            self.budgets.vision,
            self.vision.describe(&frame),
        )
        .await
    }

    /// Analogy transformation with the deterministic stub as its floor.
    async fn resolve_analogy(&self, commentary: &str) -> String {
        match self.analogy.transform(commentary).await {
            Ok(analogy) if !analogy.trim().is_empty() => analogy,
            Ok(_) => {
                warn!(stage = %Stage::AnalogyTransform, "Empty analogy, using stub transform");
                stub_analogy(commentary)
            }
            Err(e) => {
                warn!(stage = %Stage::AnalogyTransform, error = %e, "Analogy failed, using stub transform");
                stub_analogy(commentary)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFrames(Option<String>);

    #[async_trait]
    impl FrameSource for StaticFrames {
        async fn capture(&self, _: &VideoRef, _: f64) -> anyhow::Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    struct SlowFrames(Duration);

    #[async_trait]
    impl FrameSource for SlowFrames {
        async fn capture(&self, _: &VideoRef, _: f64) -> anyhow::Result<Option<String>> {
            tokio::time::sleep(self.0).await;
            Ok(Some("ZnJhbWU=".to_string()))
        }
    }

    struct StaticCaptions(Option<String>);

    #[async_trait]
    impl CaptionSource for StaticCaptions {
        async fn caption_at(&self, _: &VideoRef, _: f64) -> anyhow::Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    struct FailingCaptions;

    #[async_trait]
    impl CaptionSource for FailingCaptions {
        async fn caption_at(&self, _: &VideoRef, _: f64) -> anyhow::Result<Option<String>> {
            Err(anyhow!("caption backend down"))
        }
    }

    struct CountingVision {
        enabled: bool,
        description: Option<String>,
        calls: AtomicUsize,
    }

    impl CountingVision {
        fn new(enabled: bool, description: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                enabled,
                description: description.map(str::to_string),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl VisionDescriber for CountingVision {
        fn enabled(&self) -> bool {
            self.enabled
        }

        async fn describe(&self, _: &str) -> anyhow::Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.description.clone())
        }
    }

    struct EchoAnalogy;

    #[async_trait]
    impl AnalogyTransformer for EchoAnalogy {
        async fn transform(&self, commentary: &str) -> anyhow::Result<String> {
            Ok(format!("NFL: {commentary}"))
        }
    }

    struct FailingAnalogy;

    #[async_trait]
    impl AnalogyTransformer for FailingAnalogy {
        async fn transform(&self, _: &str) -> anyhow::Result<String> {
            Err(anyhow!("model overloaded"))
        }
    }

    fn video(id: &str) -> VideoRef {
        VideoRef::parse(id).unwrap()
    }

    fn pipeline(
        frames: Arc<dyn FrameSource>,
        captions: Arc<dyn CaptionSource>,
        vision: Arc<dyn VisionDescriber>,
        analogy: Arc<dyn AnalogyTransformer>,
    ) -> AnalysisPipeline {
        AnalysisPipeline::new(frames, captions, vision, analogy, StageBudgets::default())
    }

    #[tokio::test]
    async fn test_vision_path_wins_when_available() {
        let vision = CountingVision::new(true, Some("A striker breaks the offside trap."));
        let p = pipeline(
            Arc::new(StaticFrames(Some("ZnJhbWU=".to_string()))),
            Arc::new(FailingCaptions),
            vision.clone(),
            Arc::new(EchoAnalogy),
        );

        let resp = p.analyze(&video("abc"), 10.0).await;
        assert_eq!(resp.original_commentary, "A striker breaks the offside trap.");
        assert_eq!(resp.nfl_analogy, "NFL: A striker breaks the offside trap.");
        assert!(!resp.cached);
        assert_eq!(vision.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_vision_never_invoked_without_frame() {
        let vision = CountingVision::new(true, Some("should not appear"));
        let p = pipeline(
            Arc::new(StaticFrames(None)),
            Arc::new(StaticCaptions(Some("The winger cuts inside.".to_string()))),
            vision.clone(),
            Arc::new(EchoAnalogy),
        );

        let resp = p.analyze(&video("abc"), 10.0).await;
        assert_eq!(resp.original_commentary, "The winger cuts inside.");
        assert_eq!(vision.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_vision_falls_through_to_captions() {
        let vision = CountingVision::new(false, Some("should not appear"));
        let p = pipeline(
            Arc::new(StaticFrames(Some("ZnJhbWU=".to_string()))),
            Arc::new(StaticCaptions(Some("A long ball forward.".to_string()))),
            vision.clone(),
            Arc::new(EchoAnalogy),
        );

        let resp = p.analyze(&video("abc"), 10.0).await;
        assert_eq!(resp.original_commentary, "A long ball forward.");
        assert_eq!(vision.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_total_degradation_yields_stub_and_still_caches() {
        let p = pipeline(
            Arc::new(StaticFrames(None)),
            Arc::new(StaticCaptions(None)),
            CountingVision::new(false, None),
            Arc::new(FailingAnalogy),
        );

        let first = p.analyze(&video("abc"), 10.4).await;
        assert!(STUB_COMMENTARY.contains(&first.original_commentary.as_str()));
        assert_eq!(first.nfl_analogy, stub_analogy(&first.original_commentary));
        assert_eq!(first.timestamp, 10.4);
        assert!(!first.cached);

        // Immediate repeat in the tolerance window serves the cached result
        // with the new timestamp echoed back.
        let second = p.analyze(&video("abc"), 11.0).await;
        assert!(second.cached);
        assert_eq!(second.original_commentary, first.original_commentary);
        assert_eq!(second.nfl_analogy, first.nfl_analogy);
        assert_eq!(second.timestamp, 11.0);
    }

    #[tokio::test]
    async fn test_analogy_failure_uses_stub_of_actual_commentary() {
        let p = pipeline(
            Arc::new(StaticFrames(None)),
            Arc::new(StaticCaptions(Some("The keeper rushes out.".to_string()))),
            CountingVision::new(false, None),
            Arc::new(FailingAnalogy),
        );

        let resp = p.analyze(&video("abc"), 5.0).await;
        assert_eq!(resp.original_commentary, "The keeper rushes out.");
        assert_eq!(resp.nfl_analogy, stub_analogy("The keeper rushes out."));
    }

    #[tokio::test]
    async fn test_slow_frame_capture_times_out_to_captions() {
        let budgets = StageBudgets {
            frame_capture: Duration::from_millis(20),
            vision: Duration::from_millis(20),
            captions: Duration::from_millis(100),
        };
        let p = AnalysisPipeline::new(
            Arc::new(SlowFrames(Duration::from_secs(5))),
            Arc::new(StaticCaptions(Some("Corner kick incoming.".to_string()))),
            CountingVision::new(true, Some("should not appear")),
            Arc::new(EchoAnalogy),
            budgets,
        );

        let start = std::time::Instant::now();
        let resp = p.analyze(&video("abc"), 7.0).await;
        assert_eq!(resp.original_commentary, "Corner kick incoming.");
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_tolerance_window_misses_outside_two_seconds() {
        let p = pipeline(
            Arc::new(StaticFrames(None)),
            Arc::new(StaticCaptions(None)),
            CountingVision::new(false, None),
            Arc::new(FailingAnalogy),
        );

        let first = p.analyze(&video("abc"), 100.0).await;
        assert!(!first.cached);

        assert!(p.analyze(&video("abc"), 98.0).await.cached);
        assert!(p.analyze(&video("abc"), 102.9).await.cached);
        // Outside the ±2s window the write at second 100 is invisible.
        assert!(!p.analyze(&video("abc"), 97.0).await.cached);
        assert!(!p.analyze(&video("abc"), 103.5).await.cached);
    }

    #[tokio::test]
    async fn test_different_videos_do_not_share_cache() {
        let p = pipeline(
            Arc::new(StaticFrames(None)),
            Arc::new(StaticCaptions(None)),
            CountingVision::new(false, None),
            Arc::new(FailingAnalogy),
        );

        let _ = p.analyze(&video("abc"), 10.0).await;
        assert!(!p.analyze(&video("xyz"), 10.0).await.cached);
    }

    #[tokio::test]
    async fn test_negative_timestamp_clamps_to_zero() {
        let p = pipeline(
            Arc::new(StaticFrames(None)),
            Arc::new(StaticCaptions(None)),
            CountingVision::new(false, None),
            Arc::new(FailingAnalogy),
        );

        let resp = p.analyze(&video("abc"), -3.5).await;
        assert_eq!(resp.timestamp, 0.0);
    }

    #[tokio::test]
    async fn test_caption_error_degrades_to_stub() {
        let p = pipeline(
            Arc::new(StaticFrames(None)),
            Arc::new(FailingCaptions),
            CountingVision::new(false, None),
            Arc::new(EchoAnalogy),
        );

        let resp = p.analyze(&video("abc"), 10.0).await;
        assert!(STUB_COMMENTARY.contains(&resp.original_commentary.as_str()));
    }
}
