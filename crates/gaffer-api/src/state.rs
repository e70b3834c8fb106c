//! Application state.

use std::sync::Arc;

use gaffer_ai::{AnalogyGenerator, VisionAnalyzer};
use gaffer_media::{CaptionExtractor, FrameExtractor};

use crate::config::AgentConfig;
use crate::pipeline::{AnalysisPipeline, StageBudgets};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AgentConfig,
    pub pipeline: Arc<AnalysisPipeline>,
}

impl AppState {
    /// Create application state with the real collaborators.
    pub fn new(config: AgentConfig) -> Self {
        let pipeline = AnalysisPipeline::new(
            Arc::new(FrameExtractor::new()),
            Arc::new(CaptionExtractor::new()),
            Arc::new(VisionAnalyzer::new(config.anthropic_api_key.clone())),
            Arc::new(AnalogyGenerator::new(config.anthropic_api_key.clone())),
            StageBudgets::default(),
        );

        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Create application state around an existing pipeline (tests).
    pub fn with_pipeline(config: AgentConfig, pipeline: Arc<AnalysisPipeline>) -> Self {
        Self { config, pipeline }
    }
}
