//! Shared data models for the Gaffer agent.
//!
//! This crate provides Serde-serializable types for:
//! - The analyze request/response wire contract
//! - Video reference normalization (full URLs and legacy bare ids)
//! - Timestamp clamping

pub mod analysis;
pub mod video_ref;

pub use analysis::{clamp_timestamp, AnalyzeRequest, AnalyzeResponse};
pub use video_ref::{VideoRef, VideoRefError};
