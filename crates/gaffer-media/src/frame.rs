//! Single-frame capture from a video at a timestamp.
//!
//! Resolves a direct stream URL with yt-dlp, then grabs one frame with
//! ffmpeg. The frame is scaled down and JPEG-encoded at reduced quality
//! before being base64-encoded, since it only needs to be good enough for
//! vision analysis and small enough to upload quickly.

use std::process::Stdio;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokio::process::Command;
use tracing::{debug, info, warn};

use gaffer_models::VideoRef;

use crate::error::{MediaError, MediaResult};

/// Stream format selector: lowest-bandwidth stream at or below 480p.
const STREAM_FORMAT: &str = "worst[height<=480]";

/// Long-edge size of the captured frame in pixels.
const FRAME_MAX_SIZE: u32 = 384;

/// JPEG quality scale for ffmpeg's mjpeg encoder (2 best, 31 worst).
const JPEG_QSCALE: u32 = 15;

/// Captures still frames from video streams.
#[derive(Debug, Default)]
pub struct FrameExtractor;

impl FrameExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract one frame at the given timestamp.
    ///
    /// Returns the base64-encoded JPEG, or `None` if the stream yielded no
    /// frame at that position (e.g. a timestamp past the end of the video).
    pub async fn extract_frame(
        &self,
        video: &VideoRef,
        timestamp: f64,
    ) -> MediaResult<Option<String>> {
        which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let stream_url = self.resolve_stream_url(video.url()).await?;
        debug!(video = %video, timestamp, "Resolved stream URL");

        let Some(jpeg) = self.grab_frame(&stream_url, timestamp).await? else {
            warn!(video = %video, timestamp, "Stream yielded no frame");
            return Ok(None);
        };

        info!(
            video = %video,
            timestamp,
            bytes = jpeg.len(),
            "Captured frame"
        );
        Ok(Some(BASE64.encode(jpeg)))
    }

    /// Resolve a direct stream URL via yt-dlp.
    async fn resolve_stream_url(&self, video_url: &str) -> MediaResult<String> {
        let output = Command::new("yt-dlp")
            .args(["-g", "-f", STREAM_FORMAT, "--no-warnings", "--quiet"])
            .arg(video_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(MediaError::command_failed(
                "yt-dlp",
                "stream URL resolution failed",
                Some(stderr),
            ));
        }

        let stream_url = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        if stream_url.is_empty() {
            return Err(MediaError::command_failed(
                "yt-dlp",
                "no stream URL in output",
                None,
            ));
        }

        Ok(stream_url)
    }

    /// Grab one JPEG frame from a stream URL with ffmpeg.
    ///
    /// Seeks before the input so ffmpeg uses keyframe seeking over HTTP
    /// instead of decoding from the start.
    async fn grab_frame(&self, stream_url: &str, timestamp: f64) -> MediaResult<Option<Vec<u8>>> {
        let scale = format!(
            "scale=w={size}:h={size}:force_original_aspect_ratio=decrease",
            size = FRAME_MAX_SIZE
        );

        let output = Command::new("ffmpeg")
            .args(["-loglevel", "error"])
            .args(["-ss", &format!("{:.3}", timestamp)])
            .args(["-i", stream_url])
            .args(["-frames:v", "1"])
            .args(["-vf", &scale])
            .args(["-q:v", &JPEG_QSCALE.to_string()])
            .args(["-f", "image2pipe", "-vcodec", "mjpeg", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(MediaError::command_failed(
                "ffmpeg",
                "frame capture failed",
                Some(stderr),
            ));
        }

        if output.stdout.is_empty() {
            return Ok(None);
        }

        Ok(Some(output.stdout))
    }
}
