//! Collaborator traits consumed by the pipeline.
//!
//! The orchestrator only ever sees these seams. Any error crossing one of
//! them is converted into "proceed to next stage", so implementations are
//! free to use their own error types under `anyhow`.

use async_trait::async_trait;

use gaffer_ai::{AnalogyGenerator, VisionAnalyzer};
use gaffer_media::{CaptionExtractor, FrameExtractor};
use gaffer_models::VideoRef;

/// Produces an encoded still image for a video position, or absence.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self, video: &VideoRef, timestamp: f64) -> anyhow::Result<Option<String>>;
}

/// Produces the nearest caption text for a video position, or absence.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn caption_at(&self, video: &VideoRef, timestamp: f64)
        -> anyhow::Result<Option<String>>;
}

/// Produces descriptive text for an encoded image.
#[async_trait]
pub trait VisionDescriber: Send + Sync {
    /// Whether the vision path is configured; the orchestrator skips the
    /// stage entirely when this is false.
    fn enabled(&self) -> bool;

    async fn describe(&self, frame_base64: &str) -> anyhow::Result<Option<String>>;
}

/// Maps commentary text to an analogy string.
#[async_trait]
pub trait AnalogyTransformer: Send + Sync {
    async fn transform(&self, commentary: &str) -> anyhow::Result<String>;
}

#[async_trait]
impl FrameSource for FrameExtractor {
    async fn capture(&self, video: &VideoRef, timestamp: f64) -> anyhow::Result<Option<String>> {
        Ok(self.extract_frame(video, timestamp).await?)
    }
}

#[async_trait]
impl CaptionSource for CaptionExtractor {
    async fn caption_at(
        &self,
        video: &VideoRef,
        timestamp: f64,
    ) -> anyhow::Result<Option<String>> {
        Ok(CaptionExtractor::caption_at(self, video, timestamp).await?)
    }
}

#[async_trait]
impl VisionDescriber for VisionAnalyzer {
    fn enabled(&self) -> bool {
        VisionAnalyzer::enabled(self)
    }

    async fn describe(&self, frame_base64: &str) -> anyhow::Result<Option<String>> {
        Ok(Some(self.describe_frame(frame_base64).await?))
    }
}

#[async_trait]
impl AnalogyTransformer for AnalogyGenerator {
    async fn transform(&self, commentary: &str) -> anyhow::Result<String> {
        Ok(self.generate(commentary).await?)
    }
}
