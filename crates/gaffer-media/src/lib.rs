//! yt-dlp/ffmpeg collaborators for the Gaffer agent.
//!
//! This crate provides:
//! - Single-frame capture from a video at a timestamp (yt-dlp + ffmpeg)
//! - Caption extraction and timestamp resolution (yt-dlp + VTT parsing)
//!
//! Both collaborators are best-effort: the orchestrator wraps every call in
//! a deadline and treats any error as a signal to fall through to the next
//! commentary source.

pub mod captions;
pub mod error;
pub mod frame;

pub use captions::{CaptionCue, CaptionExtractor};
pub use error::{MediaError, MediaResult};
pub use frame::FrameExtractor;
