//! Pipeline stage machinery.
//!
//! Each stage runs under its own deadline and resolves to a single outcome.
//! A timeout and a collaborator error are equivalent for transition
//! purposes: both route to the next fallback. The distinction survives in
//! the logs, which is where "why did we get stub commentary" gets answered.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// One step of the fallback pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FrameCapture,
    VisionDescription,
    CaptionLookup,
    StubSelection,
    AnalogyTransform,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FrameCapture => "frame_capture",
            Stage::VisionDescription => "vision_description",
            Stage::CaptionLookup => "caption_lookup",
            Stage::StubSelection => "stub_selection",
            Stage::AnalogyTransform => "analogy_transform",
        };
        write!(f, "{name}")
    }
}

/// Which source ultimately supplied the commentary.
///
/// Server-side diagnostics only; the response never reveals it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentarySource {
    Vision,
    Captions,
    Stub,
}

impl fmt::Display for CommentarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommentarySource::Vision => "vision",
            CommentarySource::Captions => "captions",
            CommentarySource::Stub => "stub",
        };
        write!(f, "{name}")
    }
}

/// Per-stage time budgets.
#[derive(Debug, Clone, Copy)]
pub struct StageBudgets {
    pub frame_capture: Duration,
    pub vision: Duration,
    pub captions: Duration,
}

impl Default for StageBudgets {
    fn default() -> Self {
        Self {
            frame_capture: Duration::from_secs(5),
            vision: Duration::from_secs(5),
            captions: Duration::from_secs(3),
        }
    }
}

/// Outcome of one stage run.
#[derive(Debug)]
pub(crate) enum StageOutcome {
    /// The stage produced usable text.
    Produced(String),
    /// The stage ran cleanly but had nothing (absent frame, no captions,
    /// blank description).
    Empty,
    /// The collaborator errored.
    Failed,
    /// The deadline expired; the underlying call may still be running but
    /// its result is discarded.
    TimedOut,
}

/// Run one stage under its deadline and log the transition.
pub(crate) async fn run_stage<F>(stage: Stage, budget: Duration, fut: F) -> StageOutcome
where
    F: Future<Output = anyhow::Result<Option<String>>>,
{
    match tokio::time::timeout(budget, fut).await {
        Err(_) => {
            warn!(stage = %stage, budget_ms = budget.as_millis() as u64, "Stage timed out");
            StageOutcome::TimedOut
        }
        Ok(Err(e)) => {
            warn!(stage = %stage, error = %e, "Stage failed");
            StageOutcome::Failed
        }
        Ok(Ok(text)) => match text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            Some(text) => {
                info!(stage = %stage, chars = text.len(), "Stage succeeded");
                StageOutcome::Produced(text)
            }
            None => {
                info!(stage = %stage, "Stage produced nothing");
                StageOutcome::Empty
            }
        },
    }
}
