//! Caption extraction and timestamp resolution.
//!
//! Fetches the caption track list from yt-dlp's metadata dump, downloads
//! the VTT payload, and parses it into timed cues. Cue lists are memoized
//! per video for the process lifetime; fetching them dominates the cost and
//! viewers request many timestamps against the same video.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;
use tokio::process::Command;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use gaffer_models::VideoRef;

use crate::error::{MediaError, MediaResult};

/// A cue matches a containing timestamp with this much tail slack, since
/// speech often trails the on-screen action.
const CUE_TAIL_BUFFER_SECS: f64 = 3.0;

/// Maximum distance to the nearest cue start when no cue contains the
/// timestamp.
const NEAREST_CUE_WINDOW_SECS: f64 = 5.0;

/// One parsed caption cue.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionCue {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

impl CaptionCue {
    fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Extracts captions and resolves them at timestamps.
pub struct CaptionExtractor {
    cues: RwLock<HashMap<String, Arc<Vec<CaptionCue>>>>,
    http: reqwest::Client,
}

impl CaptionExtractor {
    pub fn new() -> Self {
        Self {
            cues: RwLock::new(HashMap::new()),
            http: reqwest::Client::new(),
        }
    }

    /// Get the caption text at a timestamp, or `None` when the video has no
    /// usable captions near that position.
    pub async fn caption_at(
        &self,
        video: &VideoRef,
        timestamp: f64,
    ) -> MediaResult<Option<String>> {
        let cues = self.fetch_cues(video).await?;
        Ok(resolve_at(&cues, timestamp))
    }

    /// Fetch (or reuse) the parsed cue list for a video.
    async fn fetch_cues(&self, video: &VideoRef) -> MediaResult<Arc<Vec<CaptionCue>>> {
        {
            let cues = self.cues.read().await;
            if let Some(cached) = cues.get(video.url()) {
                debug!(video = %video, "Using memoized captions");
                return Ok(Arc::clone(cached));
            }
        }

        which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

        let track_url = self.resolve_track_url(video.url()).await?;
        let vtt = self
            .http
            .get(&track_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let parsed = Arc::new(parse_vtt(&vtt));
        info!(video = %video, cues = parsed.len(), "Fetched captions");

        let mut cues = self.cues.write().await;
        cues.insert(video.url().to_string(), Arc::clone(&parsed));
        Ok(parsed)
    }

    /// Find a caption track URL in the yt-dlp metadata dump.
    async fn resolve_track_url(&self, video_url: &str) -> MediaResult<String> {
        let output = Command::new("yt-dlp")
            .args(["--dump-single-json", "--skip-download", "--no-warnings", "--quiet"])
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
                "metadata dump failed",
                Some(stderr),
            ));
        }

        let info: Value = serde_json::from_slice(&output.stdout)?;
        pick_track_url(&info).ok_or(MediaError::NoCaptionTrack)
    }
}

impl Default for CaptionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick a caption track URL from yt-dlp metadata.
///
/// Preference order: English subtitles, English automatic captions, any
/// automatic caption language, any subtitle language. Within a track list,
/// vtt/srv3 formats win over whatever comes first.
fn pick_track_url(info: &Value) -> Option<String> {
    let subtitles = info.get("subtitles").and_then(Value::as_object);
    let automatic = info.get("automatic_captions").and_then(Value::as_object);

    let tracks = subtitles
        .and_then(|s| s.get("en"))
        .or_else(|| automatic.and_then(|a| a.get("en")))
        .or_else(|| automatic.and_then(|a| a.values().next()))
        .or_else(|| subtitles.and_then(|s| s.values().next()))?
        .as_array()?;

    let preferred = tracks.iter().find(|t| {
        matches!(
            t.get("ext").and_then(Value::as_str),
            Some("vtt") | Some("srv3")
        )
    });

    preferred
        .or_else(|| tracks.first())
        .and_then(|t| t.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Parse WebVTT content into cues.
///
/// Cue text is stripped of markup tags and collapsed to single-space
/// whitespace; empty cues are dropped.
pub fn parse_vtt(content: &str) -> Vec<CaptionCue> {
    static TIMING: OnceLock<Regex> = OnceLock::new();
    static TAGS: OnceLock<Regex> = OnceLock::new();

    let timing = TIMING.get_or_init(|| {
        Regex::new(r"^(\d{2}:\d{2}:\d{2}\.\d{3})\s*-->\s*(\d{2}:\d{2}:\d{2}\.\d{3})").unwrap()
    });
    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]+>").unwrap());

    let mut cues = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(caps) = timing.captures(line.trim()) else {
            continue;
        };
        let start = vtt_time_to_seconds(&caps[1]);
        let end = vtt_time_to_seconds(&caps[2]);

        let mut text_lines = Vec::new();
        while let Some(next) = lines.peek() {
            let next = next.trim();
            if next.is_empty() || timing.is_match(next) {
                break;
            }
            text_lines.push(lines.next().unwrap().trim());
        }

        let joined = text_lines.join(" ");
        let text = tags.replace_all(&joined, "");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

        if !text.is_empty() {
            cues.push(CaptionCue {
                start,
                duration: (end - start).max(0.0),
                text,
            });
        }
    }

    if cues.is_empty() {
        warn!("VTT content produced no cues");
    }
    cues
}

/// Convert a VTT time string (HH:MM:SS.mmm) to seconds.
fn vtt_time_to_seconds(vtt_time: &str) -> f64 {
    let mut parts = vtt_time.split(':');
    let hours: f64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0.0);
    let minutes: f64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0.0);
    let seconds: f64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0.0);
    hours * 3600.0 + minutes * 60.0 + seconds
}

/// Resolve the cue text at a timestamp.
///
/// A cue containing the timestamp (with tail slack) wins; otherwise the
/// nearest cue start within the search window.
pub fn resolve_at(cues: &[CaptionCue], timestamp: f64) -> Option<String> {
    for cue in cues {
        if cue.start <= timestamp && timestamp <= cue.end() + CUE_TAIL_BUFFER_SECS {
            return Some(cue.text.clone());
        }
    }

    let mut nearest: Option<&CaptionCue> = None;
    let mut min_diff = NEAREST_CUE_WINDOW_SECS;
    for cue in cues {
        let diff = (timestamp - cue.start).abs();
        if diff < min_diff {
            min_diff = diff;
            nearest = Some(cue);
        }
    }

    nearest.map(|cue| cue.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_VTT: &str = "\
WEBVTT
Kind: captions
Language: en

00:00:01.000 --> 00:00:04.000
<c>A brilliant</c> through ball
splits the defense

00:00:10.500 --> 00:00:12.000
The keeper rushes out

00:00:30.000 --> 00:00:31.000
";

    #[test]
    fn test_parse_vtt() {
        let cues = parse_vtt(SAMPLE_VTT);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start, 1.0);
        assert_eq!(cues[0].duration, 3.0);
        assert_eq!(cues[0].text, "A brilliant through ball splits the defense");
        assert_eq!(cues[1].start, 10.5);
        assert_eq!(cues[1].text, "The keeper rushes out");
    }

    #[test]
    fn test_vtt_time_to_seconds() {
        assert_eq!(vtt_time_to_seconds("00:00:30.500"), 30.5);
        assert_eq!(vtt_time_to_seconds("01:01:01.000"), 3661.0);
    }

    #[test]
    fn test_resolve_containing_cue_with_tail() {
        let cues = parse_vtt(SAMPLE_VTT);
        // Inside the cue
        assert_eq!(
            resolve_at(&cues, 2.0).as_deref(),
            Some("A brilliant through ball splits the defense")
        );
        // Within the 3s tail past the cue end
        assert_eq!(
            resolve_at(&cues, 6.5).as_deref(),
            Some("A brilliant through ball splits the defense")
        );
    }

    #[test]
    fn test_resolve_nearest_within_window() {
        let cues = parse_vtt(SAMPLE_VTT);
        // 8.0 is past cue 1's tail but within 5s of cue 2's start
        assert_eq!(resolve_at(&cues, 8.0).as_deref(), Some("The keeper rushes out"));
    }

    #[test]
    fn test_resolve_nothing_near() {
        let cues = parse_vtt(SAMPLE_VTT);
        assert_eq!(resolve_at(&cues, 25.0), None);
        assert_eq!(resolve_at(&[], 1.0), None);
    }

    #[test]
    fn test_pick_track_prefers_en_subtitles() {
        let info = serde_json::json!({
            "subtitles": {
                "en": [{"ext": "vtt", "url": "https://example.com/en.vtt"}],
                "de": [{"ext": "vtt", "url": "https://example.com/de.vtt"}]
            },
            "automatic_captions": {
                "en": [{"ext": "vtt", "url": "https://example.com/auto.vtt"}]
            }
        });
        assert_eq!(
            pick_track_url(&info).as_deref(),
            Some("https://example.com/en.vtt")
        );
    }

    #[test]
    fn test_pick_track_falls_back_to_auto_captions() {
        let info = serde_json::json!({
            "subtitles": {},
            "automatic_captions": {
                "fr": [
                    {"ext": "json3", "url": "https://example.com/fr.json3"},
                    {"ext": "vtt", "url": "https://example.com/fr.vtt"}
                ]
            }
        });
        assert_eq!(
            pick_track_url(&info).as_deref(),
            Some("https://example.com/fr.vtt")
        );
    }

    #[test]
    fn test_pick_track_none_available() {
        let info = serde_json::json!({"subtitles": {}, "automatic_captions": {}});
        assert_eq!(pick_track_url(&info), None);
    }
}
