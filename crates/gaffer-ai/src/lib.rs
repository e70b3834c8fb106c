//! Anthropic-backed AI collaborators for the Gaffer agent.
//!
//! This crate provides:
//! - A vision analyzer producing soccer commentary from a still frame
//! - An analogy generator mapping commentary to an NFL analogy, with a
//!   deterministic zero-latency stub used when no API key is configured
//!
//! Both clients degrade cleanly: callers treat any error as a signal to
//! fall back, never as a request failure.

pub mod analogy;
mod anthropic;
pub mod error;
pub mod vision;

pub use analogy::{stub_analogy, AnalogyGenerator};
pub use error::{AiError, AiResult};
pub use vision::VisionAnalyzer;
